//! Configuration file module.
//!
//! Handles loading, validating, and merging `config.toml`. The file supplies
//! the *defaults* for a request (what the form fields start at), the allowed
//! ranges for user input, and the JPEG quality search tuning. The transform
//! core never reads this file: the caller resolves a
//! [`TransformSettings`] from it and hands the core a validated
//! [`TransformConfig`](crate::imaging::TransformConfig).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! crop_size_inches = 2.0    # Side of the square crop
//! dpi = 300                 # Converts inches to pixels
//! target_width_px = 461     # Final width
//! target_height_px = 579    # Final height
//! max_file_size_mb = 1.0    # Size budget, 1 MB = 1,048,576 bytes
//! output_format = "jpg"     # "jpg" or "png"
//!
//! [limits]
//! crop_size_inches = [0.5, 10.0]
//! dpi = [72, 600]
//! max_file_size_mb = [0.1, 10.0]
//! target_width_px = [1, 4096]   # Upper bound at most 8192
//! target_height_px = [1, 4096]
//!
//! [compression]
//! jpeg_initial_quality = 95 # First quality tried
//! jpeg_min_quality = 10     # Floor; always tried last
//! jpeg_quality_step = 5     # Decrement between attempts
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [defaults]
//! output_format = "png"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::calculations::MAX_TARGET_SIDE;
use crate::imaging::{QualitySearch, TransformSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PixellateConfig {
    /// Starting values for each request.
    pub defaults: TransformSettings,
    /// Accepted ranges for user-supplied values.
    pub limits: LimitsConfig,
    /// JPEG quality search tuning.
    pub compression: CompressionConfig,
}

/// Stock request defaults: the values the photo form starts with.
impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            crop_size_inches: 2.0,
            dpi: 300,
            target_width_px: 461,
            target_height_px: 579,
            max_file_size_mb: 1.0,
            output_format: "jpg".to_string(),
        }
    }
}

impl PixellateConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        self.compression.validate()?;

        if let Err(e) = self.defaults.resolve() {
            return Err(ConfigError::Validation(format!("defaults: {e}")));
        }
        self.limits
            .check(&self.defaults)
            .map_err(|e| ConfigError::Validation(format!("defaults: {e}")))?;
        Ok(())
    }
}

/// Inclusive `[min, max]` ranges for user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub crop_size_inches: [f64; 2],
    pub dpi: [i64; 2],
    pub max_file_size_mb: [f64; 2],
    pub target_width_px: [i64; 2],
    pub target_height_px: [i64; 2],
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            crop_size_inches: [0.5, 10.0],
            dpi: [72, 600],
            max_file_size_mb: [0.1, 10.0],
            target_width_px: [1, 4096],
            target_height_px: [1, 4096],
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_range("limits.crop_size_inches", self.crop_size_inches)?;
        validate_range("limits.dpi", as_f64(self.dpi))?;
        validate_range("limits.max_file_size_mb", self.max_file_size_mb)?;
        validate_pixel_range("limits.target_width_px", self.target_width_px)?;
        validate_pixel_range("limits.target_height_px", self.target_height_px)?;
        Ok(())
    }

    /// Reject user values that fall outside the configured ranges.
    ///
    /// Non-positive and non-finite values are left alone: the transform
    /// core reports those itself as invalid dimensions, with the parameter
    /// name, which is the more precise message.
    pub fn check(&self, settings: &TransformSettings) -> Result<(), ConfigError> {
        check_range(
            "crop_size_inches",
            settings.crop_size_inches,
            self.crop_size_inches,
        )?;
        check_range("dpi", settings.dpi as f64, as_f64(self.dpi))?;
        check_range(
            "max_file_size_mb",
            settings.max_file_size_mb,
            self.max_file_size_mb,
        )?;
        check_range(
            "target_width_px",
            settings.target_width_px as f64,
            as_f64(self.target_width_px),
        )?;
        check_range(
            "target_height_px",
            settings.target_height_px as f64,
            as_f64(self.target_height_px),
        )?;
        Ok(())
    }
}

fn validate_range(name: &str, [min, max]: [f64; 2]) -> Result<(), ConfigError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
        return Err(ConfigError::Validation(format!(
            "{name} must be [min, max] with 0 < min <= max, got [{min}, {max}]"
        )));
    }
    Ok(())
}

fn validate_pixel_range(name: &str, range: [i64; 2]) -> Result<(), ConfigError> {
    validate_range(name, as_f64(range))?;
    if range[1] > i64::from(MAX_TARGET_SIDE) {
        return Err(ConfigError::Validation(format!(
            "{name} upper bound {} exceeds the {MAX_TARGET_SIDE} pixel maximum",
            range[1]
        )));
    }
    Ok(())
}

fn as_f64([min, max]: [i64; 2]) -> [f64; 2] {
    [min as f64, max as f64]
}

fn check_range(name: &str, value: f64, [min, max]: [f64; 2]) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && !(min..=max).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{name} = {value} is outside the allowed range {min}..={max}"
        )));
    }
    Ok(())
}

/// JPEG quality search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// First quality tried (1-100).
    pub jpeg_initial_quality: u8,
    /// Lowest quality tried; the result at this quality is returned even if
    /// it misses the size budget.
    pub jpeg_min_quality: u8,
    /// Decrement between attempts.
    pub jpeg_quality_step: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            jpeg_initial_quality: 95,
            jpeg_min_quality: 10,
            jpeg_quality_step: 5,
        }
    }
}

impl CompressionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let valid = 1..=100;
        if !valid.contains(&self.jpeg_initial_quality) {
            return Err(ConfigError::Validation(
                "compression.jpeg_initial_quality must be 1-100".into(),
            ));
        }
        if !valid.contains(&self.jpeg_min_quality) {
            return Err(ConfigError::Validation(
                "compression.jpeg_min_quality must be 1-100".into(),
            ));
        }
        if self.jpeg_min_quality > self.jpeg_initial_quality {
            return Err(ConfigError::Validation(
                "compression.jpeg_min_quality must not exceed jpeg_initial_quality".into(),
            ));
        }
        if self.jpeg_quality_step == 0 {
            return Err(ConfigError::Validation(
                "compression.jpeg_quality_step must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn quality_search(&self) -> QualitySearch {
        QualitySearch::new(
            self.jpeg_initial_quality,
            self.jpeg_min_quality,
            self.jpeg_quality_step,
        )
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PixellateConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PixellateConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PixellateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<PixellateConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pixellate Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Request defaults (used for any option not given on the command line)
# ---------------------------------------------------------------------------
[defaults]
# Side of the square crop taken from the center of the photo, in inches.
crop_size_inches = 2.0

# Dots per inch; the crop is round(crop_size_inches * dpi) pixels wide.
# A crop larger than the photo is clamped to the photo's short edge.
dpi = 300

# Final size in pixels. The square crop is stretched to fit exactly.
target_width_px = 461
target_height_px = 579

# Size budget for the output file. 1 MB = 1,048,576 bytes.
max_file_size_mb = 1.0

# "jpg" or "png".
output_format = "jpg"

# ---------------------------------------------------------------------------
# Allowed ranges for user input, as [min, max]
# ---------------------------------------------------------------------------
[limits]
crop_size_inches = [0.5, 10.0]
dpi = [72, 600]
max_file_size_mb = [0.1, 10.0]
# Final size; the upper bound may not exceed 8192.
target_width_px = [1, 4096]
target_height_px = [1, 4096]

# ---------------------------------------------------------------------------
# JPEG compression
# ---------------------------------------------------------------------------
[compression]
# Qualities are tried from the initial value downward until the file fits.
# The minimum is always tried last; if even that is too big, it is kept
# and the result is flagged as over budget.
jpeg_initial_quality = 95
jpeg_min_quality = 10
jpeg_quality_step = 5
"##
}
