//! An ordered collection of nodes forming one logical file.
//!
//! [`Container::pack`] turns the node list into the final on-disk byte form:
//! each node is packed and run through the best-of-N codec selection, the
//! chosen buffers are concatenated into a data segment behind a header and
//! offsets table, the whole buffer is padded, checksummed, and finally
//! obfuscated behind the header. [`Container::unpack`] reverses the pipeline,
//! verifying the magic tag before touching anything else and the checksum
//! before trusting any offset.

use crate::buffer::{checked_add, checked_mul, checked_range, ByteBuffer};
use crate::checksum::checksum;
use crate::cipher;
use crate::codec::{self, CodecRegistry, CodecSet};
use crate::error::{Result, StowageError};
use crate::format::{table_range, FileHeader, TableEntry, CHECKSUM_FIELD};
use crate::node::ObjectNode;

/// The out-of-band contract between a file's writer and its readers: which
/// kind of file it is, and how its body is obfuscated.
///
/// The cipher block size is not recorded in the header; like the magic tag
/// and the key, it is part of the file-type agreement. A block size of zero
/// disables obfuscation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Magic / file-type tag.
    pub file_tag: u32,
    /// Obfuscation key, mixed with the per-file random seed.
    pub cipher_key: u32,
    /// Number of interleaved cipher sub-streams; zero disables the pass.
    pub cipher_block: usize,
}

impl ContainerConfig {
    /// A configuration with obfuscation disabled.
    pub fn new(file_tag: u32) -> Self {
        Self {
            file_tag,
            cipher_key: 0,
            cipher_block: 0,
        }
    }

    /// Enables obfuscation with the given key and block size.
    pub fn with_cipher(mut self, key: u32, block_size: usize) -> Self {
        self.cipher_key = key;
        self.cipher_block = block_size;
        self
    }
}

/// An ordered list of [`ObjectNode`]s plus the file-type contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    config: ContainerConfig,
    nodes: Vec<ObjectNode>,
}

impl Container {
    /// Creates an empty container.
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    /// The file-type contract this container packs under.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the container holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a node; order is preserved through pack and unpack.
    pub fn push(&mut self, node: ObjectNode) {
        self.nodes.push(node);
    }

    /// The ordered nodes.
    pub fn nodes(&self) -> &[ObjectNode] {
        &self.nodes
    }

    /// Consumes the container, yielding its nodes.
    pub fn into_nodes(self) -> Vec<ObjectNode> {
        self.nodes
    }

    /// Returns the first node matching (owner, name), if any.
    pub fn find(&self, owner: &str, name: &str) -> Option<&ObjectNode> {
        self.nodes
            .iter()
            .find(|n| n.owner() == owner && n.name() == name)
    }

    /// Returns the node matching (owner, name), requiring exactly one match.
    pub fn single(&self, owner: &str, name: &str) -> Result<&ObjectNode> {
        let mut matches = self
            .nodes
            .iter()
            .filter(|n| n.owner() == owner && n.name() == name);
        let first = matches.next().ok_or_else(|| StowageError::NotFound {
            owner: owner.to_string(),
            name: name.to_string(),
        })?;
        if matches.next().is_some() {
            return Err(StowageError::MultipleEntries {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        Ok(first)
    }

    /// Serializes the container into its final byte form.
    ///
    /// The container itself is not mutated; the returned buffer is complete
    /// and ready to be written out as-is.
    pub fn pack(&self, codecs: CodecSet) -> Result<Vec<u8>> {
        let mut entries = Vec::with_capacity(self.nodes.len());
        let mut data = ByteBuffer::new();
        for node in &self.nodes {
            let packed = node.pack()?;
            let (codec_id, encoded) = codec::encode_best(packed.as_slice(), codecs)?;
            let offset = data.append(&encoded, false)?;
            entries.push(TableEntry {
                codec_id,
                offset: offset as u64,
                length: encoded.len() as u64,
            });
        }

        let table_offset = FileHeader::SIZE;
        let data_offset = checked_add(
            table_offset,
            checked_mul(entries.len(), TableEntry::SIZE)?,
        )?;
        let seed: u32 = rand::random();
        let header = FileHeader {
            magic: self.config.file_tag,
            checksum: 0,
            buffer_count: entries.len() as u64,
            table_offset: table_offset as u64,
            seed,
            data_offset: data_offset as u64,
        };

        let mut out = ByteBuffer::with_capacity(checked_add(data_offset, data.len())?);
        out.append(&header.to_bytes(), false)?;
        for entry in &entries {
            out.append(&entry.to_bytes(), false)?;
        }
        out.append_buffer(&data)?;
        while out.len() % 4 != 0 {
            out.append(&[0], false)?;
        }

        let sum = checksum(out.as_slice());
        out.overwrite(CHECKSUM_FIELD.start, &sum.to_le_bytes())?;

        let mut bytes = out.into_vec();
        cipher::encrypt(
            &mut bytes[FileHeader::SIZE..],
            self.config.cipher_key ^ seed,
            self.config.cipher_block,
        )?;

        tracing::debug!(
            buffers = self.nodes.len(),
            bytes = bytes.len(),
            tag = %format_args!("{:#010x}", self.config.file_tag),
            "packed container"
        );
        Ok(bytes)
    }

    /// Reconstructs a container from packed bytes.
    ///
    /// The magic tag is verified before anything else — a wrong-type file
    /// fails without a checksum pass. The checksum is verified before any
    /// offset in the (de-obfuscated) body is trusted.
    pub fn unpack(bytes: &[u8], config: &ContainerConfig) -> Result<Container> {
        let header = FileHeader::from_bytes(bytes)?;
        if header.magic != config.file_tag {
            return Err(StowageError::WrongFileType {
                expected: config.file_tag,
                actual: header.magic,
            });
        }
        if bytes.len() % 4 != 0 {
            return Err(StowageError::Corrupt(format!(
                "container of {} bytes is not padded to a word boundary",
                bytes.len()
            )));
        }

        let mut buf = bytes.to_vec();
        cipher::decrypt(
            &mut buf[FileHeader::SIZE..],
            config.cipher_key ^ header.seed,
            config.cipher_block,
        )?;

        let stored = header.checksum;
        buf[CHECKSUM_FIELD].fill(0);
        let computed = checksum(&buf);
        if computed != stored {
            return Err(StowageError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        let table = table_range(&header, buf.len())?;
        let data_offset = usize::try_from(header.data_offset)
            .map_err(|_| StowageError::Corrupt("data segment offset exceeds address space".into()))?;
        if data_offset > buf.len() {
            return Err(StowageError::OutOfRange(format!(
                "data segment offset {data_offset} exceeds container of {} bytes",
                buf.len()
            )));
        }
        let data = &buf[data_offset..];

        let registry = CodecRegistry::new();
        let mut nodes = Vec::new();
        for raw in buf[table.clone()].chunks_exact(TableEntry::SIZE) {
            let entry = TableEntry::from_bytes(raw)?;
            let offset = usize::try_from(entry.offset)
                .map_err(|_| StowageError::Corrupt("buffer offset exceeds address space".into()))?;
            let length = usize::try_from(entry.length)
                .map_err(|_| StowageError::Corrupt("buffer length exceeds address space".into()))?;
            let end = checked_range(offset, length, data.len())?;
            let decoded = registry.get(entry.codec_id)?.decode(&data[offset..end])?;
            nodes.push(ObjectNode::unpack(&decoded)?);
        }

        tracing::debug!(
            buffers = nodes.len(),
            bytes = bytes.len(),
            tag = %format_args!("{:#010x}", header.magic),
            "unpacked container"
        );
        Ok(Container {
            config: *config,
            nodes,
        })
    }
}
