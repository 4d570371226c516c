//! UI archive loading, validation and saving
//!
//! A [`UiArchive`] owns the whole archive as one byte buffer. The buffer is
//! never resized: patching only overwrites bytes in place, so saving writes
//! exactly as many bytes as were loaded.

use crate::error::{Result, UnlockError};
use crate::layout::ArchiveLayout;
use binrw::BinRead;
use binrw::io::Cursor;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Marker bytes read from a fixed archive offset
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(little, import(len: usize))]
struct Marker {
    #[br(count = len)]
    bytes: Vec<u8>,
}

/// In-memory copy of a UI archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiArchive {
    data: Vec<u8>,
}

impl UiArchive {
    /// Read an archive from disk and verify its markers
    pub fn open(path: impl AsRef<Path>, layout: &ArchiveLayout) -> Result<Self> {
        let path = path.as_ref();

        info!("Opening input file {}", path.display());
        let mut file = File::open(path).map_err(|e| UnlockError::io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| UnlockError::io(path, e))?
            .len();

        debug!("Reserving {size} bytes");
        let capacity = usize::try_from(size).map_err(|_| UnlockError::Allocation { size })?;
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| UnlockError::Allocation { size })?;

        file.read_to_end(&mut data)
            .map_err(|e| UnlockError::io(path, e))?;

        Self::from_bytes(data, layout)
    }

    /// Wrap an in-memory archive after verifying its markers
    pub fn from_bytes(data: Vec<u8>, layout: &ArchiveLayout) -> Result<Self> {
        info!("Verifying {} byte archive", data.len());
        verify_marker(&data, 0, &layout.archive_magic)?;
        verify_marker(&data, layout.record_table_offset, &layout.record_magic)?;
        Ok(Self { data })
    }

    /// Write the whole archive to `path`, truncating any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        info!("Saving to output file {}", path.display());
        let mut file = File::create(path).map_err(|e| UnlockError::io(path, e))?;
        file.write_all(&self.data)
            .map_err(|e| UnlockError::io(path, e))?;
        file.flush().map_err(|e| UnlockError::io(path, e))?;

        Ok(())
    }

    /// Archive length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the archive holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw archive bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the archive and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Check that `expected` appears at `offset` in `data`
fn verify_marker(data: &[u8], offset: u64, expected: &str) -> Result<()> {
    let needed = expected.len();
    let fits = usize::try_from(offset)
        .ok()
        .and_then(|start| start.checked_add(needed))
        .is_some_and(|end| end <= data.len());
    if !fits {
        return Err(UnlockError::Truncated {
            offset,
            needed,
            len: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);
    cursor.set_position(offset);
    let marker = Marker::read_args(&mut cursor, (needed,))?;

    if marker.bytes != expected.as_bytes() {
        return Err(UnlockError::InvalidMagic {
            offset,
            expected: expected.to_string(),
            found: hex::encode(&marker.bytes),
        });
    }

    debug!("Found {expected:?} at 0x{offset:X}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn small_layout() -> ArchiveLayout {
        ArchiveLayout::midtown_madness()
            .with_record_table_offset(16)
            .with_record_sizes(vec![32])
    }

    fn small_archive() -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[..4].copy_from_slice(b"ARES");
        data[16..24].copy_from_slice(b"BaseName");
        data
    }

    #[test]
    fn test_from_bytes_accepts_markers() {
        let archive =
            UiArchive::from_bytes(small_archive(), &small_layout()).expect("Operation should succeed");
        assert_eq!(archive.len(), 64);
        assert!(!archive.is_empty());
        assert_eq!(&archive.as_bytes()[..4], b"ARES");
    }

    #[test]
    fn test_archive_magic_mismatch() {
        let mut data = small_archive();
        data[..4].copy_from_slice(b"ARSE");

        let err = UiArchive::from_bytes(data, &small_layout()).unwrap_err();
        assert!(err.is_format_error());
        match err {
            UnlockError::InvalidMagic {
                offset,
                expected,
                found,
            } => {
                assert_eq!(offset, 0);
                assert_eq!(expected, "ARES");
                assert_eq!(found, "41525345");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_record_magic_mismatch() {
        let mut data = small_archive();
        data[16..24].copy_from_slice(b"BaseNome");

        let err = UiArchive::from_bytes(data, &small_layout()).unwrap_err();
        assert!(matches!(
            err,
            UnlockError::InvalidMagic { offset: 16, .. }
        ));
    }

    #[test]
    fn test_truncated_archive() {
        let err = UiArchive::from_bytes(b"AR".to_vec(), &small_layout()).unwrap_err();
        assert!(matches!(
            err,
            UnlockError::Truncated {
                offset: 0,
                needed: 4,
                len: 2
            }
        ));

        let err = UiArchive::from_bytes(small_archive()[..20].to_vec(), &small_layout())
            .unwrap_err();
        assert!(matches!(err, UnlockError::Truncated { offset: 16, .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().expect("Operation should succeed");
        let err = UiArchive::open(dir.path().join("missing.ar"), &small_layout()).unwrap_err();
        assert!(err.is_io_error());
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().expect("Operation should succeed");
        let path = dir.path().join("ui.ar");

        let archive =
            UiArchive::from_bytes(small_archive(), &small_layout()).expect("Operation should succeed");
        archive.save(&path).expect("Operation should succeed");

        let reopened = UiArchive::open(&path, &small_layout()).expect("Operation should succeed");
        assert_eq!(reopened, archive);
        assert_eq!(reopened.into_bytes(), small_archive());
    }
}
