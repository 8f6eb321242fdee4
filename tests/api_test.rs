#![allow(missing_docs)]

use stowage::{CodecSet, Container, ContainerConfig, ObjectNode, Stowage, StowageError};

const LOG_TAG: u32 = 0x4C4F_4721;

fn log_config() -> ContainerConfig {
    ContainerConfig::new(LOG_TAG).with_cipher(0x5EED_5EED, 3)
}

fn log_container() -> Container {
    let mut container = Container::new(log_config());
    for i in 0..3 {
        let mut node = ObjectNode::new("Event", format!("event{i}"));
        node.set_type_tag("Event");
        node.add_scalar("Event", "code", 100u32 + i);
        node.add_str("Event", "message", "lamp intensity stable");
        container.push(node);
    }
    container
}

// --- FILE ROUNDTRIP ---

#[test]
fn save_and_open_roundtrip() -> stowage::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("diagnostic.stow");

    let container = log_container();
    Stowage::save(&path, &container, CodecSet::ALL)?;

    let restored = Stowage::open(&path, &log_config())?;
    assert_eq!(restored.nodes(), container.nodes());
    Ok(())
}

#[test]
fn open_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.stow");
    assert!(matches!(
        Stowage::open(&path, &log_config()).unwrap_err(),
        StowageError::Io(_)
    ));
}

#[test]
fn open_empty_file_is_corrupt() -> stowage::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("empty.stow");
    std::fs::write(&path, b"")?;
    assert!(matches!(
        Stowage::open(&path, &log_config()).unwrap_err(),
        StowageError::Corrupt(_)
    ));
    Ok(())
}

// --- INSPECTOR ---

#[test]
fn inspect_reports_structure_without_unpacking() -> stowage::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("diagnostic.stow");
    Stowage::save(&path, &log_container(), CodecSet::ALL)?;

    let report = Stowage::inspect(&path, &log_config())?;
    assert_eq!(report.magic, LOG_TAG);
    assert!(report.checksum_ok);
    assert_eq!(report.buffers.len(), 3);
    for info in &report.buffers {
        assert!(info.length > 0);
        assert!(!info.codec_name.starts_with("Unknown"));
    }

    let rendered = report.to_string();
    assert!(rendered.contains("INSPECTOR REPORT"));
    assert!(rendered.contains("Buffers:       3"));
    Ok(())
}

#[test]
fn inspect_flags_damage_instead_of_failing() -> stowage::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("damaged.stow");
    Stowage::save(&path, &log_container(), CodecSet::ALL)?;

    let mut bytes = std::fs::read(&path)?;
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&path, &bytes)?;

    let report = Stowage::inspect(&path, &log_config())?;
    assert!(!report.checksum_ok);

    // A full unpack of the same file refuses.
    assert!(matches!(
        Stowage::open(&path, &log_config()).unwrap_err(),
        StowageError::ChecksumMismatch { .. }
    ));
    Ok(())
}
