//! Tools for inspecting the physical structure of packed containers.
//! Useful for debugging codec selection and triaging "file may be corrupted"
//! reports without running a full unpack.

use crate::checksum::checksum;
use crate::cipher;
use crate::codec::{CODEC_NONE, CODEC_RLE0, CODEC_RLE8};
use crate::container::ContainerConfig;
use crate::error::{Result, StowageError};
use crate::format::{table_range, FileHeader, TableEntry, CHECKSUM_FIELD};

/// A structural report of a packed container.
#[derive(Debug)]
pub struct ContainerReport {
    /// Total size of the packed buffer.
    pub file_size: usize,
    /// Magic / file-type tag found in the header.
    pub magic: u32,
    /// Checksum stored in the header.
    pub stored_checksum: u32,
    /// Checksum recomputed after de-obfuscation.
    pub computed_checksum: u32,
    /// Whether the two checksums agree. A mismatch is reported, not failed,
    /// so a damaged file can still be described.
    pub checksum_ok: bool,
    /// Per-buffer metadata in offsets-table order.
    pub buffers: Vec<BufferInfo>,
}

/// Metadata for a single encoded node buffer.
#[derive(Debug)]
pub struct BufferInfo {
    /// Codec id recorded in the offsets table.
    pub codec_id: u8,
    /// Human-readable codec name.
    pub codec_name: String,
    /// Offset relative to the data segment.
    pub offset: u64,
    /// Encoded length in bytes.
    pub length: u64,
}

/// The container inspector tool.
#[derive(Debug)]
pub struct Inspector;

impl Inspector {
    /// Analyzes a packed buffer and returns a structural report.
    ///
    /// The magic tag must match `config` — inspecting a file as the wrong
    /// kind would de-obfuscate it with the wrong key and describe noise.
    pub fn inspect(bytes: &[u8], config: &ContainerConfig) -> Result<ContainerReport> {
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

        let table = table_range(&header, buf.len())?;
        let mut buffers = Vec::new();
        for raw in buf[table].chunks_exact(TableEntry::SIZE) {
            let entry = TableEntry::from_bytes(raw)?;
            buffers.push(BufferInfo {
                codec_id: entry.codec_id,
                codec_name: codec_name(entry.codec_id),
                offset: entry.offset,
                length: entry.length,
            });
        }

        Ok(ContainerReport {
            file_size: bytes.len(),
            magic: header.magic,
            stored_checksum: stored,
            computed_checksum: computed,
            checksum_ok: stored == computed,
            buffers,
        })
    }
}

fn codec_name(id: u8) -> String {
    match id {
        CODEC_NONE => "None".to_string(),
        CODEC_RLE8 => "RLE8".to_string(),
        CODEC_RLE0 => "RLE0".to_string(),
        _ => format!("Unknown({id})"),
    }
}

impl std::fmt::Display for ContainerReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== STOWAGE INSPECTOR REPORT ===")?;
        writeln!(f, "File Size:     {} bytes", self.file_size)?;
        writeln!(f, "Magic Tag:     {:#010x}", self.magic)?;
        writeln!(
            f,
            "Checksum:      {:#010x} (computed {:#010x}, {})",
            self.stored_checksum,
            self.computed_checksum,
            if self.checksum_ok { "OK" } else { "MISMATCH" }
        )?;
        writeln!(f, "Buffers:       {}", self.buffers.len())?;
        for (i, info) in self.buffers.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {} | offset {} | {} bytes",
                i, info.codec_name, info.offset, info.length
            )?;
        }
        Ok(())
    }
}
