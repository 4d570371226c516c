//! Output formatting utilities for the CLI
//!
//! Styled messages and the per-car report table.

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use mmtweak_formats::{FieldPatch, PatchReport};
use owo_colors::OwoColorize;

/// Style configuration for output formatting
pub struct OutputStyle {
    /// Whether to use colors in output
    pub use_color: bool,
    /// Whether to use Unicode characters for borders
    pub use_unicode: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            // Check if NO_COLOR env var is set
            use_color: std::env::var("NO_COLOR").is_err(),
            use_unicode: true,
        }
    }
}

impl OutputStyle {
    /// Create a new output style
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors in output
    #[must_use]
    pub fn no_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Use ASCII characters instead of Unicode
    #[must_use]
    pub fn ascii(mut self) -> Self {
        self.use_unicode = false;
        self
    }
}

/// Format a header with appropriate styling
pub fn format_header(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.bold().bright_blue().to_string()
    } else {
        text.to_string()
    }
}

/// Format a success message
pub fn format_success(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

/// Format a warning message
pub fn format_warning(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Format an error message
pub fn format_error(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.red().to_string()
    } else {
        text.to_string()
    }
}

/// Format a file path
pub fn format_path(path: &str, style: &OutputStyle) -> String {
    if style.use_color {
        path.bright_magenta().to_string()
    } else {
        path.to_string()
    }
}

/// Create a styled table
pub fn create_table(style: &OutputStyle) -> Table {
    let mut table = Table::new();

    if style.use_unicode {
        table
            .load_preset(presets::UTF8_FULL)
            .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(presets::ASCII_FULL);
    }

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);

    table
}

/// Style a table header cell
pub fn header_cell(text: &str, style: &OutputStyle) -> Cell {
    let cell = Cell::new(text)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Left);
    if style.use_color {
        cell.fg(Color::Cyan)
    } else {
        cell
    }
}

/// Style a field change cell (`old -> new`)
fn field_cell(field: &FieldPatch, style: &OutputStyle) -> Cell {
    let text = format!("{} -> {}", field.previous, "0".repeat(field.width()));
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if style.use_color && field.changed() {
        cell.fg(Color::Green)
    } else {
        cell
    }
}

/// Build the per-car report table
///
/// One row per record, one column per zeroed field. Field columns are named
/// after the keys found in the first record.
pub fn report_table(report: &PatchReport, style: &OutputStyle) -> Table {
    let mut table = create_table(style);

    let mut header = vec![
        header_cell("#", style),
        header_cell("Car", style),
        header_cell("Offset", style),
    ];
    if let Some(first) = report.records.first() {
        header.extend(first.fields.iter().map(|f| header_cell(&f.key, style)));
    }
    table.set_header(header);

    for record in &report.records {
        let mut row = vec![
            Cell::new(record.index).set_alignment(CellAlignment::Right),
            Cell::new(&record.name),
            Cell::new(format!("0x{:X}", record.offset)),
        ];
        row.extend(record.fields.iter().map(|f| field_cell(f, style)));
        table.add_row(row);
    }

    table
}

/// One-line summary of a patch pass
pub fn format_summary(report: &PatchReport, style: &OutputStyle) -> String {
    let text = format!(
        "{} of {} cars unlocked ({} fields changed)",
        report.cars_unlocked(),
        report.records.len(),
        report.fields_changed()
    );
    if report.cars_unlocked() == 0 {
        format_warning(&text, style)
    } else {
        format_success(&text, style)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use mmtweak_formats::RecordPatch;

    fn sample_report() -> PatchReport {
        PatchReport {
            records: vec![RecordPatch {
                index: 0,
                offset: 0x12F7B60,
                name: "vpbus".to_string(),
                fields: vec![
                    FieldPatch {
                        key: "UnlockScore".to_string(),
                        offset: 0x12F7BA0,
                        previous: "0".to_string(),
                    },
                    FieldPatch {
                        key: "UnlockFlags".to_string(),
                        offset: 0x12F7BB0,
                        previous: "32".to_string(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_plain_style_has_no_escapes() {
        let style = OutputStyle::new().no_color();
        assert_eq!(format_error("boom", &style), "boom");
        assert_eq!(format_header("mmtweak", &style), "mmtweak");
    }

    #[test]
    fn test_report_table() {
        let style = OutputStyle::new().no_color().ascii();
        let rendered = report_table(&sample_report(), &style).to_string();

        assert!(rendered.contains("UnlockScore"));
        assert!(rendered.contains("UnlockFlags"));
        assert!(rendered.contains("vpbus"));
        assert!(rendered.contains("0x12F7B60"));
        assert!(rendered.contains("32 -> 00"));
    }

    #[test]
    fn test_summary() {
        let style = OutputStyle::new().no_color();
        assert_eq!(
            format_summary(&sample_report(), &style),
            "1 of 1 cars unlocked (1 fields changed)"
        );
        assert_eq!(
            format_summary(&PatchReport::default(), &style),
            "0 of 0 cars unlocked (0 fields changed)"
        );
    }
}
