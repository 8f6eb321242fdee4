//! The high-level entry points.

use std::path::Path;

use crate::codec::CodecSet;
use crate::container::{Container, ContainerConfig};
use crate::error::Result;
use crate::inspector::{ContainerReport, Inspector};
use crate::io;

/// The main entry point for packing and restoring containers.
///
/// The in-memory pipeline is available directly on [`Container`]; this facade
/// bundles it with the file layer for the common save/open flow.
#[derive(Debug)]
pub struct Stowage;

impl Stowage {
    /// Packs `container` into its final byte form.
    pub fn pack(container: &Container, codecs: CodecSet) -> Result<Vec<u8>> {
        container.pack(codecs)
    }

    /// Reconstructs a container from packed bytes.
    pub fn unpack(bytes: &[u8], config: &ContainerConfig) -> Result<Container> {
        Container::unpack(bytes, config)
    }

    /// Packs `container` and writes the result to `path`.
    pub fn save<P: AsRef<Path>>(path: P, container: &Container, codecs: CodecSet) -> Result<()> {
        let bytes = container.pack(codecs)?;
        io::write_blob(path.as_ref(), &bytes)
    }

    /// Memory-maps the file at `path` and unpacks it.
    pub fn open<P: AsRef<Path>>(path: P, config: &ContainerConfig) -> Result<Container> {
        let blob = io::map_blob(path.as_ref())?;
        Container::unpack(blob.as_slice(), config)
    }

    /// Produces a structural report of the packed file at `path` without
    /// unpacking its nodes.
    pub fn inspect<P: AsRef<Path>>(path: P, config: &ContainerConfig) -> Result<ContainerReport> {
        let blob = io::map_blob(path.as_ref())?;
        Inspector::inspect(blob.as_slice(), config)
    }
}
