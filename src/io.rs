//! The thin file layer around the in-memory engine.
//!
//! The core performs no I/O: this module only moves a finished blob to disk
//! and maps one back for unpacking. Writes go through a buffered writer and
//! are flushed before returning; reads are memory-mapped so unpacking can
//! slice the file without loading it eagerly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Result, StowageError};

/// A read-only memory-mapped file, handed to
/// [`Container::unpack`](crate::Container::unpack) as a plain byte slice.
#[derive(Debug)]
pub struct MappedBlob {
    mmap: Mmap,
}

impl MappedBlob {
    /// The mapped bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    /// Length of the mapped file.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

/// Writes a packed blob to `path`, truncating any existing file.
pub fn write_blob(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote container");
    Ok(())
}

/// Memory-maps the file at `path` for reading.
pub fn map_blob(path: &Path) -> Result<MappedBlob> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Err(StowageError::Corrupt(format!(
            "{} is empty",
            path.display()
        )));
    }

    // Safety: the map is read-only and the engine never trusts mapped bytes
    // without validating them; concurrent modification of the underlying file
    // is the caller's responsibility, as with any mmap.
    #[allow(unsafe_code)]
    let mmap = unsafe { Mmap::map(&file)? };

    tracing::debug!(path = %path.display(), bytes = len, "mapped container");
    Ok(MappedBlob { mmap })
}
