//! mmtweak client library
//!
//! This library provides the command-line surface and run logic for the
//! mmtweak binary.

pub mod output;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mmtweak_formats::{ArchiveLayout, PatchReport, RecordPatcher, UiArchive};
use std::path::{Path, PathBuf};
use tracing::{Level, info};

use crate::output::{
    OutputStyle, format_header, format_path, format_success, format_summary, format_warning,
    report_table,
};

/// Banner printed at the start of every run
pub const BANNER: &str = "Midtown Madness car unlocker";

#[derive(Parser, Debug)]
#[command(
    name = "mmtweak",
    about = "Unlock every car in Midtown Madness by patching ui.ar",
    version,
    author,
    long_about = "Unlocks every car in Midtown Madness by zeroing the UnlockScore and UnlockFlags \
                  of each car record in the game's ui.ar archive.\n\n\
                  INPUT and OUTPUT may be the same file: the archive is read fully before anything \
                  is written."
)]
pub struct Cli {
    /// Archive to read from (ui.ar)
    #[arg(required_unless_present = "print_layout")]
    pub input: Option<PathBuf>,

    /// File to write the patched archive to
    #[arg(required_unless_present_any = ["print_layout", "dry_run"])]
    pub output: Option<PathBuf>,

    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Archive layout table (TOML) to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Patch in memory and print the report without writing OUTPUT
    #[arg(long)]
    pub dry_run: bool,

    /// Print the layout table as TOML and exit
    #[arg(long, conflicts_with_all = ["input", "output", "dry_run"])]
    pub print_layout: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Output style for this invocation
    pub fn output_style(&self) -> OutputStyle {
        if self.no_color {
            OutputStyle::new().no_color()
        } else {
            OutputStyle::new()
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Load the layout table from `path`, or the built-in one
pub fn load_layout(path: Option<&Path>) -> Result<ArchiveLayout> {
    match path {
        Some(path) => {
            info!("Loading layout table {}", path.display());
            ArchiveLayout::from_file(path)
                .with_context(|| format!("Can't load layout table {}", path.display()))
        }
        None => Ok(ArchiveLayout::midtown_madness()),
    }
}

/// Run one invocation of the tool
///
/// Returns the patch report, or `None` when only the layout table was
/// printed.
pub fn run(cli: &Cli, style: &OutputStyle) -> Result<Option<PatchReport>> {
    let layout = load_layout(cli.layout.as_deref())?;

    if cli.print_layout {
        print!("{}", layout.to_toml_string()?);
        return Ok(None);
    }

    let Some(input) = cli.input.as_deref() else {
        bail!("No input file given");
    };

    println!("{}", format_header(BANNER, style));

    let mut archive = UiArchive::open(input, &layout)
        .with_context(|| format!("Can't load input file {}", input.display()))?;
    let report = RecordPatcher::new(&layout)
        .patch(&mut archive)
        .with_context(|| format!("Can't unlock cars in {}", input.display()))?;

    println!("{}", report_table(&report, style));

    match (&cli.output, cli.dry_run) {
        (_, true) => {
            println!("{}", format_warning("Dry run, nothing written", style));
        }
        (Some(output), false) => {
            archive
                .save(output)
                .with_context(|| format!("Can't write output file {}", output.display()))?;
            println!(
                "{} {}",
                format_success("Saved", style),
                format_path(&output.display().to_string(), style)
            );
        }
        (None, false) => bail!("No output file given"),
    }

    println!("{}", format_summary(&report, style));
    Ok(Some(report))
}
