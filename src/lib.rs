//! # Stowage
//!
//! A binary object-graph serialization engine: it flattens structured program
//! state — settings, imported icon sets, instrument calibration and spectrum
//! data, diagnostic logs — into a single self-describing, checksummed,
//! lightly obfuscated byte container, and restores it.
//!
//! ## Overview
//!
//! State is modeled as a tree of [`ObjectNode`]s: each node carries scalar
//! fields and child nodes, both addressed by (owner type name, variable name)
//! pairs. A [`Container`] is an ordered list of such trees forming one
//! logical file. Packing a container runs every node through a recursive
//! offset-based serializer, picks the smallest of the enabled run-length
//! encodings per buffer, frames everything behind a checksummed header, and
//! obfuscates the body with a reversible keyed stream transform.
//!
//! The engine performs no I/O and owns no global state; the [`io`] module is
//! a thin file layer that writes a finished blob out and memory-maps one back
//! in, and everything else operates on byte slices.
//!
//! ## Core Concepts
//!
//! ### `ByteBuffer`
//!
//! The [`ByteBuffer`] is the growable, bounds-checked byte store every stage
//! builds into. Offsets are validated integer indices, never pointers, and
//! all size arithmetic is overflow-checked — a hostile length fails closed.
//!
//! ### `ObjectNode` and `Container`
//!
//! Both are transient: built immediately before a pack, or produced by an
//! unpack and discarded after field extraction. Unpacking validates every
//! declared offset/length before reading through it, and a container's
//! checksum is verified before any of its offsets are trusted.
//!
//! ### `Persist`
//!
//! The [`Persist`] trait is the reflection seam: a serializable type exposes
//! a static field-descriptor table and `push`/`pop` driven by accessor calls.
//! [`StoreValue`] extends the same contract to strings, raw payloads and
//! vectors; [`BoundVar`] to values behind getter/setter closures.
//!
//! ## Usage
//!
//! ```rust
//! use stowage::{Container, ContainerConfig, CodecSet, ObjectNode, Stowage};
//!
//! const SETTINGS_TAG: u32 = 0x5354_4721;
//!
//! let mut node = ObjectNode::new("Display", "main");
//! node.add_scalar("Display", "width", 1920i32);
//! node.add_scalar("Display", "height", 1080i32);
//!
//! let config = ContainerConfig::new(SETTINGS_TAG).with_cipher(0xC0FF_EE00, 4);
//! let mut container = Container::new(config);
//! container.push(node);
//!
//! let bytes = Stowage::pack(&container, CodecSet::ALL)?;
//! let restored = Stowage::unpack(&bytes, &config)?;
//! let width: i32 = restored.nodes()[0].read_field("Display", "width")?;
//! assert_eq!(width, 1920);
//! # Ok::<(), stowage::StowageError>(())
//! ```
//!
//! ## Safety and Error Handling
//!
//! * **No Panics:** no `unwrap()` or `panic!()` in the library (enforced by
//!   clippy lints); malformed input surfaces as a specific [`StowageError`].
//! * **Encapsulated Unsafe:** `unsafe` appears once, in the [`io`] module,
//!   to memory-map a file for reading.
//! * **Fail Closed:** overflow-checked arithmetic on every size and offset;
//!   wrong magic, bad checksum and out-of-range tables each fail with their
//!   own variant so callers can tell damage from drift.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod buffer;
pub mod codec;
pub mod container;
pub mod error;
pub mod inspector;
pub mod io;
pub mod node;
pub mod persist;
pub mod scalar;

// --- INTERNAL LAYOUT MODULES ---
#[doc(hidden)]
pub mod checksum;
#[doc(hidden)]
pub mod cipher;
#[doc(hidden)]
pub mod format;

// --- RE-EXPORTS ---

pub use api::Stowage;
pub use buffer::ByteBuffer;
pub use codec::{Codec, CodecRegistry, CodecSet, NoCodec, Rle0, Rle8};
pub use container::{Container, ContainerConfig};
pub use error::{Result, StowageError};
pub use inspector::{ContainerReport, Inspector};
pub use node::{FieldRecord, ObjectNode};
pub use persist::{Blob, BoundVar, FieldInfo, Persist, StoreValue};
pub use scalar::Scalar;

/// Constants used throughout the library.
pub mod constants {
    /// The number of bytes the total container length is padded to a
    /// multiple of.
    pub const CONTAINER_ALIGN: usize = 4;
}
