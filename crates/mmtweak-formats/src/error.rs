//! Error types for loading, patching and saving UI archives

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for archive operation results
pub type Result<T> = std::result::Result<T, UnlockError>;

/// Errors that can occur while unlocking cars in a UI archive
#[derive(Error, Debug)]
pub enum UnlockError {
    /// The input or output file could not be opened, read, created or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File the operation was performed on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The archive buffer could not be allocated
    #[error("Can't allocate {size} bytes")]
    Allocation {
        /// Requested buffer size in bytes
        size: u64,
    },

    /// A magic marker did not match
    #[error("Invalid UI archive: expected {expected:?} at 0x{offset:X}, found {found}")]
    InvalidMagic {
        /// Absolute offset of the marker
        offset: u64,
        /// Expected marker text
        expected: String,
        /// Hex dump of the bytes found instead
        found: String,
    },

    /// The archive is too short to contain a marker
    #[error("Invalid UI archive: {needed} bytes needed at 0x{offset:X}, file is {len} bytes")]
    Truncated {
        /// Absolute offset of the marker
        offset: u64,
        /// Marker length in bytes
        needed: usize,
        /// Archive length in bytes
        len: usize,
    },

    /// A record extends past the end of the archive
    #[error("Record {record} spans 0x{start:X}..0x{end:X}, archive is {len} bytes")]
    RecordOutOfRange {
        /// Record index
        record: usize,
        /// Absolute start offset
        start: usize,
        /// Absolute end offset (exclusive)
        end: usize,
        /// Archive length in bytes
        len: usize,
    },

    /// A field scan reached the record end without finding its delimiter
    #[error("Record {record}: no {target:?} found after 0x{offset:X} before the record end")]
    OutOfBounds {
        /// Record index
        record: usize,
        /// Absolute offset the scan started from
        offset: usize,
        /// Byte the scan was looking for
        target: char,
    },

    /// The located key is not the field the layout expects
    #[error("Record {record}: expected field {expected:?}, found {found:?}")]
    FieldMismatch {
        /// Record index
        record: usize,
        /// Field name from the layout table
        expected: String,
        /// Key text found in the record
        found: String,
    },

    /// The layout table is unusable
    #[error("Invalid archive layout: {0}")]
    InvalidLayout(String),

    /// The layout file is not valid TOML for a layout table
    #[error("Layout parse error: {0}")]
    LayoutParse(#[from] toml::de::Error),

    /// The layout table could not be serialized
    #[error("Layout serialization error: {0}")]
    LayoutSerialize(#[from] toml::ser::Error),

    /// `BinRw` reading error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl UnlockError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error means the input is not a supported UI archive
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. } | Self::Truncated { .. } | Self::BinRw(_)
        )
    }

    /// Check if this error came from the file system
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this error is a scan or record running off its bounds
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::RecordOutOfRange { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let magic = UnlockError::InvalidMagic {
            offset: 0,
            expected: "ARES".to_string(),
            found: "58585858".to_string(),
        };
        assert!(magic.is_format_error());
        assert!(!magic.is_io_error());

        let io = UnlockError::io(
            "ui.ar",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(io.is_io_error());
        assert!(!io.is_format_error());

        let oob = UnlockError::OutOfBounds {
            record: 3,
            offset: 0x10,
            target: '=',
        };
        assert!(oob.is_out_of_bounds());
        assert!(!oob.is_format_error());
    }

    #[test]
    fn test_messages() {
        let oob = UnlockError::OutOfBounds {
            record: 2,
            offset: 0x12F7C30,
            target: 'U',
        };
        assert_eq!(
            oob.to_string(),
            "Record 2: no 'U' found after 0x12F7C30 before the record end"
        );

        let magic = UnlockError::InvalidMagic {
            offset: 0x12F7B60,
            expected: "BaseName".to_string(),
            found: "0000000000000000".to_string(),
        };
        assert!(magic.to_string().contains("0x12F7B60"));
        assert!(magic.to_string().contains("\"BaseName\""));
    }
}
