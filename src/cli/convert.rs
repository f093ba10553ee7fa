//! Conversion command: Markdown → preset JSON, or back with `--reverse`.

use crate::cli::common::{CliError, CliResult};
use crate::services::{ConversionService, PresetService};
use clap::Args;
use std::path::PathBuf;
use tracing::{debug, info};

/// Convert a Markdown control document to preset JSON (or back)
#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Input file (Markdown, or preset JSON with --reverse)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Convert preset JSON back to Markdown
    #[arg(long)]
    pub reverse: bool,

    /// Also write the normalized Markdown document to PATH
    #[arg(long, value_name = "PATH")]
    pub clean_md: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl ConvertArgs {
    /// Execute the conversion
    pub fn execute(&self) -> CliResult<()> {
        let input = PresetService::read(&self.input)
            .map_err(|e| CliError::io(format!("Failed to read input: {e:#}")))?;
        debug!("Read {} byte(s) from {}", input.len(), self.input.display());

        if self.reverse {
            self.run_reverse(&input)
        } else {
            self.run_forward(&input)
        }
    }

    fn run_forward(&self, input: &str) -> CliResult<()> {
        let output = ConversionService::forward(input, self.pretty, self.clean_md.is_some())?;

        PresetService::write(&self.output, &output.json)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        info!("Wrote preset to {}", self.output.display());

        if let (Some(path), Some(markdown)) = (&self.clean_md, &output.clean_markdown) {
            PresetService::write(path, markdown).map_err(|e| CliError::io(format!("{e:#}")))?;
            info!("Wrote normalized Markdown to {}", path.display());
        }

        println!("✓ Converted {} → {}", self.input.display(), self.output.display());
        Ok(())
    }

    fn run_reverse(&self, input: &str) -> CliResult<()> {
        if let Some(path) = &self.clean_md {
            eprintln!(
                "warning: --clean-md is ignored with --reverse ({})",
                path.display()
            );
        }

        let output = ConversionService::reverse(input)?;
        for diagnostic in &output.diagnostics {
            eprintln!("warning: {diagnostic}");
        }

        PresetService::write(&self.output, &output.markdown)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        info!("Wrote Markdown to {}", self.output.display());

        println!(
            "✓ Converted {} → {} ({} warning(s))",
            self.input.display(),
            self.output.display(),
            output.diagnostics.len()
        );
        Ok(())
    }
}
