//! Archive layout table
//!
//! Every offset, size and marker the patcher relies on lives in a single
//! [`ArchiveLayout`]. The built-in table describes the retail Midtown Madness
//! `ui.ar`; an alternate table can be loaded from TOML without touching code.
//!
//! ```toml
//! version = 1
//! archive_magic = "ARES"
//! record_magic = "BaseName"
//! record_table_offset = 19888992
//! record_sizes = [208, 208, 224, 208, 208, 224, 224, 240, 208, 224]
//! fields = ["UnlockScore", "UnlockFlags"]
//! key_delimiter = "="
//! line_terminator = 13
//! verify_field_names = true
//! ```

use crate::error::{Result, UnlockError};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// Current layout table version
pub const LAYOUT_VERSION: u32 = 1;

/// Marker at the very start of every UI archive
pub const ARCHIVE_MAGIC: &str = "ARES";

/// Key of the first line of every car record
pub const RECORD_MAGIC: &str = "BaseName";

/// Absolute offset of the first car record
pub const RECORD_TABLE_OFFSET: u64 = 0x12F7B60;

/// Car record sizes, padded to the next multiple of 16
pub const RECORD_SIZES: [u32; 10] = [0xD0, 0xD0, 0xE0, 0xD0, 0xD0, 0xE0, 0xE0, 0xF0, 0xD0, 0xE0];

/// Fields zeroed in each record, in the order they appear
pub const UNLOCK_FIELDS: [&str; 2] = ["UnlockScore", "UnlockFlags"];

/// Separates a key from its value
pub const KEY_DELIMITER: char = '=';

/// Ends every `key=value` line
pub const LINE_TERMINATOR: u8 = 0x0D;

/// Layout of the car table inside a UI archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveLayout {
    /// Layout table version, must equal [`LAYOUT_VERSION`]
    pub version: u32,
    /// Marker expected at offset 0
    pub archive_magic: String,
    /// Marker expected at `record_table_offset`
    pub record_magic: String,
    /// Absolute offset of the first record
    pub record_table_offset: u64,
    /// Size of each record in bytes
    pub record_sizes: Vec<u32>,
    /// Keys zeroed in every record, in order of appearance
    pub fields: Vec<String>,
    /// Byte between a key and its value
    pub key_delimiter: char,
    /// Byte ending each line
    pub line_terminator: u8,
    /// Reject records whose located keys differ from `fields`
    pub verify_field_names: bool,
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self::midtown_madness()
    }
}

impl ArchiveLayout {
    /// Layout of the retail Midtown Madness `ui.ar`
    pub fn midtown_madness() -> Self {
        Self {
            version: LAYOUT_VERSION,
            archive_magic: ARCHIVE_MAGIC.to_string(),
            record_magic: RECORD_MAGIC.to_string(),
            record_table_offset: RECORD_TABLE_OFFSET,
            record_sizes: RECORD_SIZES.to_vec(),
            fields: UNLOCK_FIELDS.iter().map(|f| (*f).to_string()).collect(),
            key_delimiter: KEY_DELIMITER,
            line_terminator: LINE_TERMINATOR,
            verify_field_names: true,
        }
    }

    /// Parse a layout table from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let layout: Self = toml::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout table from a TOML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| UnlockError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Render the layout table as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Set the record table offset
    pub fn with_record_table_offset(mut self, offset: u64) -> Self {
        self.record_table_offset = offset;
        self
    }

    /// Set the record sizes
    pub fn with_record_sizes(mut self, sizes: Vec<u32>) -> Self {
        self.record_sizes = sizes;
        self
    }

    /// Set the fields zeroed in every record
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable field name verification
    pub fn with_verify_field_names(mut self, verify: bool) -> Self {
        self.verify_field_names = verify;
        self
    }

    /// Validate the layout table
    pub fn validate(&self) -> Result<()> {
        if self.version != LAYOUT_VERSION {
            return Err(invalid(format!(
                "unsupported layout version {} (expected {LAYOUT_VERSION})",
                self.version
            )));
        }

        if self.archive_magic.is_empty() || !self.archive_magic.is_ascii() {
            return Err(invalid("archive_magic must be non-empty ASCII"));
        }

        if self.record_magic.is_empty() || !self.record_magic.is_ascii() {
            return Err(invalid("record_magic must be non-empty ASCII"));
        }

        if self.record_sizes.is_empty() {
            return Err(invalid("record_sizes must list at least one record"));
        }

        if self.record_sizes.contains(&0) {
            return Err(invalid("record sizes must be greater than 0"));
        }

        if !self.key_delimiter.is_ascii() {
            return Err(invalid("key_delimiter must be ASCII"));
        }

        if self.key_delimiter as u32 == u32::from(self.line_terminator) {
            return Err(invalid("key_delimiter and line_terminator must differ"));
        }

        if self.fields.is_empty() {
            return Err(invalid("fields must name at least one key"));
        }

        for field in &self.fields {
            if field.is_empty() || !field.is_ascii() {
                return Err(invalid(format!("field {field:?} must be non-empty ASCII")));
            }
            if field.contains(self.key_delimiter) {
                return Err(invalid(format!(
                    "field {field:?} contains the key delimiter"
                )));
            }
        }

        Ok(())
    }

    /// Key delimiter as a byte
    pub fn delimiter_byte(&self) -> u8 {
        self.key_delimiter as u8
    }

    /// Absolute byte ranges of every record, in table order
    pub fn record_ranges(&self) -> Result<Vec<Range<usize>>> {
        let mut start = usize::try_from(self.record_table_offset).map_err(|_| {
            invalid(format!(
                "record_table_offset 0x{:X} does not fit in memory",
                self.record_table_offset
            ))
        })?;

        let mut ranges = Vec::with_capacity(self.record_sizes.len());
        for &size in &self.record_sizes {
            let end = start
                .checked_add(size as usize)
                .ok_or_else(|| invalid("record table overflows the address space"))?;
            ranges.push(start..end);
            start = end;
        }

        Ok(ranges)
    }

    /// Total size of the record table in bytes
    pub fn record_table_len(&self) -> u64 {
        self.record_sizes.iter().map(|&s| u64::from(s)).sum()
    }
}

fn invalid(reason: impl Into<String>) -> UnlockError {
    UnlockError::InvalidLayout(reason.into())
}
