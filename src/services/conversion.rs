//! Conversion service: the forward and reverse pipelines.

use crate::error::Result;
use crate::export::{emit_preset, render_document};
use crate::layout::layout_document;
use crate::parser::{import_preset, parse_document, Diagnostic};
use tracing::{debug, info};

/// Result of a Markdown → preset conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOutput {
    /// Preset JSON
    pub json: String,
    /// Normalized Markdown, when requested
    pub clean_markdown: Option<String>,
}

/// Result of a preset → Markdown conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseOutput {
    /// Rendered Markdown
    pub markdown: String,
    /// Features dropped on the way
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs whole conversions in memory. Nothing is written here, so a failed
/// conversion never produces partial output.
pub struct ConversionService;

impl ConversionService {
    /// Converts a Markdown document to preset JSON.
    ///
    /// With `clean` set, the parsed document is also re-rendered as
    /// normalized Markdown.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConvertError`](crate::error::ConvertError) found
    /// in the document.
    pub fn forward(markdown: &str, pretty: bool, clean: bool) -> Result<ForwardOutput> {
        let document = parse_document(markdown)?;
        let preset = layout_document(&document);
        info!(
            "Laid out '{}': {} page(s), {} control(s)",
            preset.name,
            preset.pages.len(),
            preset.controls().count()
        );

        let json = emit_preset(&preset, pretty)?;
        let clean_markdown = if clean {
            Some(render_document(&document)?)
        } else {
            None
        };

        Ok(ForwardOutput {
            json,
            clean_markdown,
        })
    }

    /// Converts preset JSON back to Markdown.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Json`](crate::error::ConvertError::Json) when
    /// the input is not a preset. Unsupported features are reported in
    /// [`ReverseOutput::diagnostics`] instead.
    pub fn reverse(json: &str) -> Result<ReverseOutput> {
        let imported = import_preset(json)?;
        debug!(
            "Imported '{}' with {} diagnostic(s)",
            imported.document.title,
            imported.diagnostics.len()
        );

        let markdown = render_document(&imported.document)?;
        Ok(ReverseOutput {
            markdown,
            diagnostics: imported.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    const DOC: &str = "# Synth\n\n## OSC\n\n| CC | Label | Color |\n|---|---|---|\n| 74 | Cutoff | f45c51 |\n| 71 | Resonance | |\n";

    #[test]
    fn test_forward_without_clean_markdown() {
        let output = ConversionService::forward(DOC, false, false).unwrap();
        assert!(output.json.contains("\"Cutoff\""));
        assert!(output.clean_markdown.is_none());
    }

    #[test]
    fn test_forward_with_clean_markdown() {
        let output = ConversionService::forward(DOC, false, true).unwrap();
        let clean = output.clean_markdown.unwrap();
        assert!(clean.contains("| 74 | Cutoff | 0-127 |  | #F45C51 |"));
        assert!(clean.contains("| 71 | Resonance | 0-127 |  |  |"));
    }

    #[test]
    fn test_forward_errors_propagate() {
        assert!(matches!(
            ConversionService::forward("no tables here", false, false),
            Err(ConvertError::Structural(_))
        ));
    }

    #[test]
    fn test_reverse_round_trip() {
        let forward = ConversionService::forward(DOC, true, false).unwrap();
        let reverse = ConversionService::reverse(&forward.json).unwrap();

        assert!(reverse.diagnostics.is_empty());
        assert!(reverse.markdown.contains("# Synth"));
        assert!(reverse.markdown.contains("## OSC"));
        assert!(reverse.markdown.contains("| 74 | Cutoff |"));
    }
}
