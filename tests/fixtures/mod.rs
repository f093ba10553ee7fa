//! Shared test fixtures for conversion tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A single-device synth document with colors, choices, a group and an
/// envelope.
pub const SYNTH_DOC: &str = "\
---
name: Subsequent 37
manufacturer: Moog
channel: 3
---

# Subsequent 37

Intro text is ignored.

## Oscillators

| CC | Label | Range | Choices | Color |
|----|-------|-------|---------|-------|
| | Mixer | 2 | | #112233 |
| 9 | Osc 1 Level | | | |
| 10 | Osc 2 Level | | | |
| 74 | Cutoff | 0-127 (64) | | #F45C51 |
| 71 | Resonance | | | |
| 80 | Wave | 0-3 | Saw, Square, Tri, Pulse | #00FF00 |
| 81 | Sync | | Off, On | |

## Envelopes

| CC | Label | Choices |
|----|-------|---------|
| 20,21,22,23 | Filter Env | ADSR |
| N:100,101,102 | Amp Env | ADR |
";

/// Two devices with a templated section.
pub const MULTI_DEVICE_DOC: &str = "\
---
devices:
  - name: Synth
    channel: 1
  - name: Drums
    channel: 10
---

# Rack

## Part <device>

| Address | Label | Range |
|---------|-------|-------|
| <device>:7 | Volume | |
| <device>:N:1024 | Fine | 0-16383 |
";

/// Builds a one-section document around the given table rows.
pub fn doc_with_rows(header: &str, rows: &[&str]) -> String {
    let columns = header.matches('|').count().saturating_sub(1);
    let divider = format!("|{}", "---|".repeat(columns));
    format!("# Test\n\n## Main\n\n{header}\n{divider}\n{}\n", rows.join("\n"))
}

/// Writes `content` to `name` inside a fresh temp dir.
///
/// Returns the path and the `TempDir` guard (keep it alive for the test).
pub fn create_temp_file(name: &str, content: &str) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture file");
    (path, temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_with_rows_builds_divider() {
        let doc = doc_with_rows("| CC | Label |", &["| 1 | A |"]);
        assert!(doc.contains("| CC | Label |\n|---|---|\n| 1 | A |"));
    }
}
