//! Midtown Madness UI archive car unlocking
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::doc_markdown)] // Many archive-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! This crate patches the car table inside `ui.ar`, the "ARES" archive that
//! holds the Midtown Madness front-end data. Every car record carries an
//! `UnlockScore` and an `UnlockFlags` line; zeroing both makes the car
//! available from the start.
//!
//! # Pipeline
//!
//! - **Load**: [`UiArchive::open`] reads the whole file and checks the `ARES`
//!   and `BaseName` markers
//! - **Patch**: [`RecordPatcher::patch`] walks the record table and zero-fills
//!   the unlock fields of every car
//! - **Save**: [`UiArchive::save`] writes the buffer back verbatim
//!
//! All offsets and sizes come from an [`ArchiveLayout`] table.

#![warn(missing_docs)]

pub mod archive;
pub mod error;
pub mod layout;
pub mod patcher;
pub mod record;
pub mod scan;

pub use archive::UiArchive;
pub use error::{Result, UnlockError};
pub use layout::ArchiveLayout;
pub use patcher::{FieldPatch, PatchReport, RecordPatch, RecordPatcher};

use std::path::Path;

/// Load `input`, unlock every car and write the result to `output`
///
/// `input` and `output` may name the same file: the archive is read fully
/// into memory before anything is written. Nothing is written if loading or
/// patching fails.
pub fn unlock_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    layout: &ArchiveLayout,
) -> Result<PatchReport> {
    let mut archive = UiArchive::open(input, layout)?;
    let report = RecordPatcher::new(layout).patch(&mut archive)?;
    archive.save(output)?;
    Ok(report)
}
