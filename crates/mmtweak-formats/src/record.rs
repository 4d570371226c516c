//! Car records and the `key=value` fields inside them

use crate::scan::count_until;
use std::ops::Range;

/// Read-only view of one car record
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    /// Position of the record in the table
    pub index: usize,
    /// Absolute offset of the record in the archive
    pub offset: usize,
    bytes: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// Create a view over `bytes`, which must end at the record boundary
    pub fn new(index: usize, offset: usize, bytes: &'a [u8]) -> Self {
        Self {
            index,
            offset,
            bytes,
        }
    }

    /// Record bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Record length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the record is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Car identifier from the record's first line (`BaseName=vpbus`)
    ///
    /// The first line ends at the line terminator, a NUL byte or the record
    /// end, whichever comes first. Without a delimiter the whole line is
    /// returned.
    pub fn name(&self, delimiter: u8, terminator: u8) -> String {
        let line_end = self
            .bytes
            .iter()
            .position(|&b| b == terminator || b == 0)
            .unwrap_or(self.bytes.len());
        let line = &self.bytes[..line_end];

        let value = count_until(line, delimiter).map_or(line, |eq| &line[eq + 1..]);
        String::from_utf8_lossy(value).into_owned()
    }
}

/// Record-relative location of one `key=value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpan {
    /// Key bytes, from the lead byte up to the delimiter
    pub key: Range<usize>,
    /// Value bytes, from after the delimiter up to the terminator
    pub value: Range<usize>,
}

/// A scan that ran off the end of its record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMiss {
    /// Record-relative offset the scan started at
    pub from: usize,
    /// Byte the scan was looking for
    pub target: u8,
}

/// Locate the next field whose key starts with `lead`, starting at `from`
///
/// Finds the next `lead` byte, then the next `delimiter` after it, then the
/// `terminator` ending the value. All three scans stop at the record end.
pub fn locate_field(
    record: &[u8],
    from: usize,
    lead: u8,
    delimiter: u8,
    terminator: u8,
) -> Result<FieldSpan, ScanMiss> {
    let scan = |start: usize, target: u8| {
        record
            .get(start..)
            .and_then(|rest| count_until(rest, target))
            .map(|n| start + n)
            .ok_or(ScanMiss {
                from: start,
                target,
            })
    };

    let key_start = scan(from, lead)?;
    let delimiter_at = scan(key_start, delimiter)?;
    let value_start = delimiter_at + 1;
    let value_end = scan(value_start, terminator)?;

    Ok(FieldSpan {
        key: key_start..delimiter_at,
        value: value_start..value_end,
    })
}
