//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! portrait.png → portrait-processed.jpg
//!     Crop: 600px square
//!     Resize: 461x579
//!     Attempts:
//!         q95: 1180.2 KB
//!         q90: 903.7 KB
//!     Result: JPEG 903.7 KB at q90 (budget 1024.0 KB)
//! ```
//!
//! When even the floor quality misses the budget, a final
//! `Warning: ...` line is added. The file is still written.
//!
//! ## Check config
//!
//! ```text
//! Defaults
//!     Crop: 2 in @ 300 dpi
//!     Target: 461x579
//!     Budget: 1 MB (1024.0 KB)
//!     Format: jpg
//! Limits
//!     ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure, with no I/O.
//!
//! The `--json` output is a [`Report`], serialized by the caller.

use crate::config::PixellateConfig;
use crate::imaging::{Attempt, OutputFormat};
use crate::pipeline::EncodedResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable size in KiB with one decimal.
pub fn format_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn attempt_line(attempt: &Attempt) -> String {
    let size = format_size(attempt.size as u64);
    match attempt.quality {
        Some(q) => format!("{}q{}: {}", indent(2), q, size),
        None => format!("{}optimized: {}", indent(2), size),
    }
}

/// Where the output goes when `-o` is not given:
/// `<input-stem>-processed.<ext>` next to the input.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}-processed.{}", format.extension()))
}

// ============================================================================
// process
// ============================================================================

/// Format the report for one processed image.
pub fn format_process_output(
    input: &Path,
    output: &Path,
    result: &EncodedResult,
    max_bytes: u64,
) -> Vec<String> {
    let mut lines = vec![format!("{} → {}", file_name(input), file_name(output))];
    lines.push(format!("{}Crop: {}px square", indent(1), result.crop_side));
    lines.push(format!(
        "{}Resize: {}x{}",
        indent(1),
        result.width,
        result.height
    ));

    if result.attempts.len() > 1 {
        lines.push(format!("{}Attempts:", indent(1)));
        lines.extend(result.attempts.iter().map(attempt_line));
    }

    let size = format_size(result.len() as u64);
    let budget = format_size(max_bytes);
    let quality = match result.quality {
        Some(q) => format!(" at q{q}"),
        None => String::new(),
    };
    lines.push(format!(
        "{}Result: {} {}{} (budget {})",
        indent(1),
        result.format.label(),
        size,
        quality,
        budget
    ));

    if result.size_exceeded {
        lines.push(format!(
            "{}Warning: could not get under {}; kept the smallest encoding ({})",
            indent(1),
            budget,
            size
        ));
    }
    lines
}

pub fn print_process_output(input: &Path, output: &Path, result: &EncodedResult, max_bytes: u64) {
    for line in format_process_output(input, output, result, max_bytes) {
        println!("{}", line);
    }
}

/// Machine-readable summary printed by `process --json`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub input: PathBuf,
    pub output: PathBuf,
    pub max_bytes: u64,
    pub bytes: usize,
    pub sha256: String,
    #[serde(flatten)]
    pub result: EncodedResult,
}

impl Report {
    pub fn new(input: &Path, output: &Path, result: EncodedResult, max_bytes: u64) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            max_bytes,
            bytes: result.len(),
            sha256: result.sha256(),
            result,
        }
    }
}

// ============================================================================
// check-config
// ============================================================================

/// Format the resolved configuration.
pub fn format_config_summary(config: &PixellateConfig) -> Vec<String> {
    let d = &config.defaults;
    let l = &config.limits;
    let c = &config.compression;
    vec![
        "Defaults".to_string(),
        format!(
            "{}Crop: {} in @ {} dpi",
            indent(1),
            d.crop_size_inches,
            d.dpi
        ),
        format!(
            "{}Target: {}x{}",
            indent(1),
            d.target_width_px,
            d.target_height_px
        ),
        format!(
            "{}Budget: {} MB ({})",
            indent(1),
            d.max_file_size_mb,
            format_size(crate::imaging::calculations::mb_to_bytes(d.max_file_size_mb))
        ),
        format!("{}Format: {}", indent(1), d.output_format),
        "Limits".to_string(),
        format!(
            "{}Crop: {}-{} in",
            indent(1),
            l.crop_size_inches[0],
            l.crop_size_inches[1]
        ),
        format!("{}DPI: {}-{}", indent(1), l.dpi[0], l.dpi[1]),
        format!(
            "{}Target: {}-{} x {}-{} px",
            indent(1),
            l.target_width_px[0],
            l.target_width_px[1],
            l.target_height_px[0],
            l.target_height_px[1]
        ),
        format!(
            "{}Budget: {}-{} MB",
            indent(1),
            l.max_file_size_mb[0],
            l.max_file_size_mb[1]
        ),
        "Compression".to_string(),
        format!(
            "{}JPEG quality: {} down to {}, step {}",
            indent(1),
            c.jpeg_initial_quality,
            c.jpeg_min_quality,
            c.jpeg_quality_step
        ),
    ]
}

pub fn print_config_summary(config: &PixellateConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}

// ============================================================================
// errors
// ============================================================================

/// Render an error and its causes for the terminal, one line each.
///
/// ```text
/// error: Invalid target_width_px: 0 (must be a positive number)
/// error: Config validation error: ...
///     caused by: ...
/// ```
pub fn format_error(err: &dyn std::error::Error) -> Vec<String> {
    let mut lines = vec![format!("error: {err}")];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("{}caused by: {cause}", indent(1)));
        source = cause.source();
    }
    lines
}

pub fn print_error(err: &dyn std::error::Error) {
    for line in format_error(err) {
        eprintln!("{}", line);
    }
}
