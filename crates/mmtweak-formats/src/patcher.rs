//! Car unlocking pass over the record table
//!
//! For every record in the layout table the patcher locates each unlock
//! field in turn and overwrites its value with ASCII `'0'` up to the line
//! terminator. The field cursor carries over inside a record: the search for
//! the second field starts at the value of the first, so fields must appear
//! in the order the layout lists them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mmtweak_formats::{ArchiveLayout, RecordPatcher, UiArchive};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = ArchiveLayout::midtown_madness();
//! let mut archive = UiArchive::open("ui.ar", &layout)?;
//!
//! let report = RecordPatcher::new(&layout).patch(&mut archive)?;
//! for record in &report.records {
//!     println!("{} unlocked", record.name);
//! }
//!
//! archive.save("ui.ar")?;
//! # Ok(())
//! # }
//! ```

use crate::archive::UiArchive;
use crate::error::{Result, UnlockError};
use crate::layout::ArchiveLayout;
use crate::record::{RecordView, ScanMiss, locate_field};
use crate::scan::zero_fill_line;
use tracing::{debug, info, warn};

/// One zeroed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    /// Key text as found in the record
    pub key: String,
    /// Absolute offset of the first value byte
    pub offset: usize,
    /// Value text before zeroing
    pub previous: String,
}

impl FieldPatch {
    /// Number of value bytes overwritten
    pub fn width(&self) -> usize {
        self.previous.len()
    }

    /// Whether the value held anything other than `'0'` before patching
    pub fn changed(&self) -> bool {
        self.previous.bytes().any(|b| b != b'0')
    }
}

/// Fields zeroed in one car record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPatch {
    /// Position of the record in the table
    pub index: usize,
    /// Absolute offset of the record
    pub offset: usize,
    /// Car identifier from the record's first line
    pub name: String,
    /// Zeroed fields, in layout order
    pub fields: Vec<FieldPatch>,
}

impl RecordPatch {
    /// Whether any field of this car was locked before patching
    pub fn changed(&self) -> bool {
        self.fields.iter().any(FieldPatch::changed)
    }
}

/// Outcome of a full patch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Patched records, in table order
    pub records: Vec<RecordPatch>,
}

impl PatchReport {
    /// Number of fields whose value changed
    pub fn fields_changed(&self) -> usize {
        self.records
            .iter()
            .flat_map(|r| &r.fields)
            .filter(|f| f.changed())
            .count()
    }

    /// Number of cars that were locked before patching
    pub fn cars_unlocked(&self) -> usize {
        self.records.iter().filter(|r| r.changed()).count()
    }
}

/// Zeroes the unlock fields of every car record
#[derive(Debug, Clone, Copy)]
pub struct RecordPatcher<'a> {
    layout: &'a ArchiveLayout,
}

impl<'a> RecordPatcher<'a> {
    /// Create a patcher for the given layout table
    pub fn new(layout: &'a ArchiveLayout) -> Self {
        Self { layout }
    }

    /// Patch every record of `archive` in place
    ///
    /// Stops at the first record that cannot be patched. Records before it
    /// have already been modified, so callers must discard the archive on
    /// error instead of saving it.
    pub fn patch(&self, archive: &mut UiArchive) -> Result<PatchReport> {
        self.layout.validate()?;
        if !self.layout.verify_field_names {
            warn!("Field name verification is disabled");
        }

        let ranges = self.layout.record_ranges()?;
        let data = archive.as_mut_bytes();
        let len = data.len();

        let mut report = PatchReport::default();
        for (index, range) in ranges.into_iter().enumerate() {
            let record = data
                .get_mut(range.clone())
                .ok_or(UnlockError::RecordOutOfRange {
                    record: index,
                    start: range.start,
                    end: range.end,
                    len,
                })?;
            report
                .records
                .push(self.patch_record(index, range.start, record)?);
        }

        info!(
            "Unlocked {} of {} cars ({} fields changed)",
            report.cars_unlocked(),
            report.records.len(),
            report.fields_changed()
        );
        Ok(report)
    }

    fn patch_record(&self, index: usize, offset: usize, record: &mut [u8]) -> Result<RecordPatch> {
        let delimiter = self.layout.delimiter_byte();
        let terminator = self.layout.line_terminator;

        let name = RecordView::new(index, offset, record).name(delimiter, terminator);
        info!("Unlocking car {name}");

        let mut fields = Vec::with_capacity(self.layout.fields.len());
        let mut cursor = 0;
        for field in &self.layout.fields {
            let lead = field.as_bytes()[0];
            let span = locate_field(record, cursor, lead, delimiter, terminator)
                .map_err(|miss| out_of_bounds(index, offset, miss))?;

            let key = String::from_utf8_lossy(&record[span.key.clone()]).into_owned();
            if self.layout.verify_field_names && key != *field {
                return Err(UnlockError::FieldMismatch {
                    record: index,
                    expected: field.clone(),
                    found: key,
                });
            }

            let previous = String::from_utf8_lossy(&record[span.value.clone()]).into_owned();
            zero_fill_line(&mut record[span.value.start..], terminator).ok_or(
                UnlockError::OutOfBounds {
                    record: index,
                    offset: offset + span.value.start,
                    target: char::from(terminator),
                },
            )?;

            debug!(
                "{name}: {key} at 0x{:X} {previous:?} -> {:?}",
                offset + span.value.start,
                "0".repeat(previous.len())
            );
            fields.push(FieldPatch {
                key,
                offset: offset + span.value.start,
                previous,
            });
            cursor = span.value.start;
        }

        Ok(RecordPatch {
            index,
            offset,
            name,
            fields,
        })
    }
}

fn out_of_bounds(record: usize, offset: usize, miss: ScanMiss) -> UnlockError {
    UnlockError::OutOfBounds {
        record,
        offset: offset + miss.from,
        target: char::from(miss.target),
    }
}
