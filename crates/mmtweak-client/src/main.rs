use clap::Parser;
use std::process::ExitCode;
use tracing::Level;

use mmtweak_client::{Cli, output::format_error, run};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let style = cli.output_style();

    // Logging is scoped to this run rather than installed globally
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_ansi(style.use_color)
        .with_writer(std::io::stderr)
        .finish();

    match tracing::subscriber::with_default(subscriber, || run(&cli, &style)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format_error(&format!("Error: {err:#}"), &style));
            ExitCode::FAILURE
        }
    }
}
