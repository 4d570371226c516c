//! Test utilities for mmtweak
//!
//! Builds synthetic `ui.ar` archives with the retail car table layout and
//! locates a real archive for tests that want one.

use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Absolute offset of the car table in the retail `ui.ar`
pub const RECORD_TABLE_OFFSET: usize = 0x12F7B60;

/// Car record sizes in the retail `ui.ar`
pub const RECORD_SIZES: [usize; 10] = [0xD0, 0xD0, 0xE0, 0xD0, 0xD0, 0xE0, 0xE0, 0xF0, 0xD0, 0xE0];

/// Length of the smallest archive that holds the retail car table
pub const MINIMAL_ARCHIVE_LEN: usize = RECORD_TABLE_OFFSET + 0xE00;

/// Car table offset used by [`SyntheticArchive::small`]
pub const SMALL_TABLE_OFFSET: usize = 0x40;

/// Environment variable pointing at a real `ui.ar`
pub const UI_ARCHIVE_ENV: &str = "MMTWEAK_UI_AR";

const LINE_END: &[u8] = b"\r\n";

/// One car record of a synthetic archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarRecord {
    /// Value of the `BaseName` line
    pub name: String,
    /// Value of the `Description` line
    pub description: String,
    /// Value of the `UnlockScore` line
    pub unlock_score: String,
    /// Value of the `UnlockFlags` line
    pub unlock_flags: String,
    /// Lines placed between `ScoringBias` and `UnlockScore`
    pub extra_lines: Vec<String>,
}

impl CarRecord {
    /// Create a locked car record
    pub fn new(name: &str, description: &str, unlock_score: &str, unlock_flags: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            unlock_score: unlock_score.to_string(),
            unlock_flags: unlock_flags.to_string(),
            extra_lines: Vec::new(),
        }
    }

    /// Add a raw `key=value` line before the unlock fields
    pub fn with_extra_line(mut self, line: &str) -> Self {
        self.extra_lines.push(line.to_string());
        self
    }

    /// Record body as stored in the archive, without padding
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        let mut line = |key: &str, value: &str| {
            body.extend_from_slice(key.as_bytes());
            body.push(b'=');
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(LINE_END);
        };

        line("BaseName", &self.name);
        line("Description", &self.description);
        line("Flags", "16");
        line("Order", "-1");
        line("ScoringBias", "100.0");
        for extra in &self.extra_lines {
            let (key, value) = extra.split_once('=').unwrap_or((extra.as_str(), ""));
            line(key, value);
        }
        line("UnlockScore", &self.unlock_score);
        line("UnlockFlags", &self.unlock_flags);
        line("Horsepower", "400");
        line("Mass", "8310");

        body.push(0);
        body
    }

    /// Offsets of the unlock values relative to the record start
    pub fn unlock_value_ranges(&self) -> [Range<usize>; 2] {
        let body = self.body();
        let find = |key: &[u8], len: usize| {
            let start = body
                .windows(key.len())
                .position(|w| w == key)
                .map_or(0, |p| p + key.len());
            start..start + len
        };
        [
            find(b"UnlockScore=", self.unlock_score.len()),
            find(b"UnlockFlags=", self.unlock_flags.len()),
        ]
    }
}

/// The ten stock cars of the retail car table
pub fn stock_cars() -> Vec<CarRecord> {
    vec![
        CarRecord::new("vpbug", "New Beetle", "0", "0"),
        CarRecord::new("vpbus", "City Bus", "0", "32"),
        CarRecord::new("vpcop", "Police Cruiser", "150000", "8"),
        CarRecord::new("vpcab", "Checker Cab", "0", "0"),
        CarRecord::new("vpford", "F-350", "0", "0"),
        CarRecord::new("vpmustang99", "Mustang GT", "0", "0"),
        CarRecord::new("vpcaddie", "Eldorado", "75000", "0"),
        CarRecord::new("vpsemi", "Freightliner Century", "250000", "16"),
        CarRecord::new("vppanoz", "Panoz Roadster", "500000", "4"),
        CarRecord::new("vpmustang67", "Mustang Fastback", "0", "64"),
    ]
}

/// Builder for synthetic UI archives
#[derive(Debug, Clone)]
pub struct SyntheticArchive {
    table_offset: usize,
    record_sizes: Vec<usize>,
    cars: Vec<CarRecord>,
    total_len: usize,
    archive_magic: Vec<u8>,
}

impl SyntheticArchive {
    /// Archive with the retail table offset and the stock cars
    ///
    /// The result is [`MINIMAL_ARCHIVE_LEN`] bytes, about 19 MiB.
    pub fn midtown_madness() -> Self {
        Self {
            table_offset: RECORD_TABLE_OFFSET,
            record_sizes: RECORD_SIZES.to_vec(),
            cars: stock_cars(),
            total_len: MINIMAL_ARCHIVE_LEN,
            archive_magic: b"ARES".to_vec(),
        }
    }

    /// Archive with the stock cars at [`SMALL_TABLE_OFFSET`]
    pub fn small() -> Self {
        Self {
            table_offset: SMALL_TABLE_OFFSET,
            total_len: SMALL_TABLE_OFFSET + 0xE00,
            ..Self::midtown_madness()
        }
    }

    /// Replace the car at `index`
    pub fn with_car(mut self, index: usize, car: CarRecord) -> Self {
        self.cars[index] = car;
        self
    }

    /// Replace the marker at offset 0
    pub fn with_archive_magic(mut self, magic: &[u8]) -> Self {
        self.archive_magic = magic.to_vec();
        self
    }

    /// Set the archive length
    pub fn with_total_len(mut self, len: usize) -> Self {
        self.total_len = len;
        self
    }

    /// Car table offset
    pub fn table_offset(&self) -> usize {
        self.table_offset
    }

    /// Cars in table order
    pub fn cars(&self) -> &[CarRecord] {
        &self.cars
    }

    /// Absolute offset of every record
    pub fn record_offsets(&self) -> Vec<usize> {
        self.record_sizes
            .iter()
            .scan(self.table_offset, |offset, size| {
                let start = *offset;
                *offset += size;
                Some(start)
            })
            .collect()
    }

    /// Absolute ranges of every unlock value, two per car
    pub fn unlock_value_ranges(&self) -> Vec<Range<usize>> {
        self.record_offsets()
            .into_iter()
            .zip(&self.cars)
            .flat_map(|(offset, car)| {
                car.unlock_value_ranges()
                    .map(|r| offset + r.start..offset + r.end)
            })
            .collect()
    }

    /// Render the archive
    ///
    /// Bytes outside the car table hold a repeating pattern so stray writes
    /// show up in comparisons. Panics if a car body does not fit its record.
    pub fn build(&self) -> Vec<u8> {
        let mut data: Vec<u8> = (0..self.total_len).map(|i| (i % 251) as u8).collect();
        let magic_len = self.archive_magic.len().min(data.len());
        data[..magic_len].copy_from_slice(&self.archive_magic[..magic_len]);

        for ((offset, size), car) in self
            .record_offsets()
            .into_iter()
            .zip(&self.record_sizes)
            .zip(&self.cars)
        {
            let mut record = car.body();
            assert!(
                record.len() <= *size,
                "car {} needs {} bytes, record holds {size}",
                car.name,
                record.len()
            );
            record.resize(*size, 0);

            let end = (offset + size).min(data.len());
            if offset < end {
                data[offset..end].copy_from_slice(&record[..end - offset]);
            }
        }

        data
    }

    /// Render the archive to `path`
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.build())
    }

    /// Render the archive into a fresh temporary directory
    ///
    /// Returns the directory guard and the archive path inside it.
    pub fn write_temp(&self) -> io::Result<(tempfile::TempDir, PathBuf)> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ui.ar");
        self.write_to(&path)?;
        Ok((dir, path))
    }
}

/// Locate a real `ui.ar` through [`UI_ARCHIVE_ENV`]
pub fn find_real_archive() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os(UI_ARCHIVE_ENV)?);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_cars_fit_their_records() {
        for (car, size) in stock_cars().iter().zip(RECORD_SIZES) {
            assert!(car.body().len() <= size, "{} too large", car.name);
        }
    }

    #[test]
    fn test_small_archive_layout() {
        let archive = SyntheticArchive::small();
        let data = archive.build();

        assert_eq!(data.len(), SMALL_TABLE_OFFSET + 0xE00);
        assert_eq!(&data[..4], b"ARES");
        assert_eq!(
            &data[SMALL_TABLE_OFFSET..SMALL_TABLE_OFFSET + 8],
            b"BaseName"
        );

        let offsets = archive.record_offsets();
        assert_eq!(offsets.len(), 10);
        assert_eq!(offsets[1], SMALL_TABLE_OFFSET + 0xD0);
        for offset in offsets {
            assert_eq!(&data[offset..offset + 9], b"BaseName=");
        }
    }

    #[test]
    fn test_unlock_value_ranges_point_at_values() {
        let archive = SyntheticArchive::small();
        let data = archive.build();
        let ranges = archive.unlock_value_ranges();
        assert_eq!(ranges.len(), 20);

        // vpcop: UnlockScore=150000, UnlockFlags=8
        assert_eq!(&data[ranges[4].clone()], b"150000");
        assert_eq!(&data[ranges[5].clone()], b"8");
        for range in ranges {
            assert_eq!(data[range.end], b'\r');
        }
    }

    #[test]
    fn test_write_temp() {
        let (_dir, path) = SyntheticArchive::small()
            .write_temp()
            .expect("Operation should succeed");
        let data = std::fs::read(path).expect("Operation should succeed");
        assert_eq!(data, SyntheticArchive::small().build());
    }
}
