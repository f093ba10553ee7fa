//! md2preset - Markdown control tables to MIDI controller presets
//!
//! Reads a Markdown document of control tables and writes the preset JSON a
//! controller loads, or converts a preset back to Markdown with `--reverse`.

use clap::Parser;
use md2preset::cli::{ConvertArgs, ExitCode};
use md2preset::constants::{APP_BINARY_NAME, APP_NAME};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// md2preset - Markdown control tables to MIDI controller presets
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    convert: ConvertArgs,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let code = match cli.convert.execute() {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code
        }
    };

    std::process::exit(code.code());
}
