//! Parameter types for a single transform request.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between whatever collects the user's choices (the CLI, a web
//! form) and the [`pipeline`](crate::pipeline), which does the pixel work.
//!
//! ## Types
//!
//! - [`OutputFormat`]: JPEG or PNG. Parsed from user text; anything else is
//!   [`PipelineError::UnsupportedFormat`].
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`QualitySearch`]: The JPEG quality ladder: start, floor and step.
//! - [`TransformSettings`]: Raw request values exactly as the user typed them.
//! - [`TransformConfig`]: The validated, immutable request. The only way to
//!   get one is through a constructor that rejects non-positive dimensions.

use crate::pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::calculations::{MAX_TARGET_SIDE, mb_to_bytes, quality_ladder};

/// Output encoding of the processed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// MIME type for the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// File extension used when the caller does not pick an output path.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    /// Accepts `jpg`, `jpeg` and `png` in any case, with surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(PipelineError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bounds of the JPEG quality search.
///
/// The search walks down from `initial` in steps of `step` and always ends
/// with an attempt at `floor`, so the number of encodes is bounded by
/// `initial - floor + 1` no matter what the step is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySearch {
    initial: Quality,
    floor: Quality,
    step: u8,
}

impl QualitySearch {
    /// Build a search, normalizing out-of-range values: the floor never
    /// exceeds the starting quality and the step is at least 1.
    pub fn new(initial: u8, floor: u8, step: u8) -> Self {
        let initial = Quality::new(initial);
        let floor = Quality::new(floor.min(initial.value()));
        Self {
            initial,
            floor,
            step: step.max(1),
        }
    }

    pub fn initial(&self) -> Quality {
        self.initial
    }

    pub fn floor(&self) -> Quality {
        self.floor
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    /// Qualities to try, highest first.
    pub fn ladder(&self) -> Vec<Quality> {
        quality_ladder(self.initial.value(), self.floor.value(), self.step)
            .into_iter()
            .map(Quality::new)
            .collect()
    }
}

impl Default for QualitySearch {
    fn default() -> Self {
        Self::new(95, 10, 5)
    }
}

/// Raw request values as a form or command line supplies them.
///
/// Nothing here is validated: signed integers and free-form format text are
/// kept so that a negative DPI or a `"bmp"` format can be reported precisely
/// by [`TransformSettings::resolve`] instead of failing somewhere in parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSettings {
    /// Side of the square crop, in inches.
    pub crop_size_inches: f64,
    /// Dots per inch used to turn `crop_size_inches` into pixels.
    pub dpi: i64,
    pub target_width_px: i64,
    pub target_height_px: i64,
    /// Output size budget in megabytes (1 MB = 1,048,576 bytes).
    pub max_file_size_mb: f64,
    /// `jpg`, `jpeg` or `png`.
    pub output_format: String,
}

impl TransformSettings {
    /// Validate every field and build the immutable request.
    ///
    /// Fields are checked in pipeline order (crop, resize, compression, format)
    /// so the first reported error is the one the pipeline would hit first.
    pub fn resolve(&self) -> Result<TransformConfig, PipelineError> {
        let crop_inches = positive_real("crop_size_inches", self.crop_size_inches)?;
        let dpi = positive_int("dpi", self.dpi)?;
        let target_width = target_side(
            "target_width_px",
            positive_int("target_width_px", self.target_width_px)?,
        )?;
        let target_height = target_side(
            "target_height_px",
            positive_int("target_height_px", self.target_height_px)?,
        )?;
        let max_mb = positive_real("max_file_size_mb", self.max_file_size_mb)?;
        let max_bytes = mb_to_bytes(max_mb);
        if max_bytes == 0 {
            return Err(PipelineError::invalid("max_file_size_mb", max_mb));
        }
        let format: OutputFormat = self.output_format.parse()?;

        TransformConfig::new(
            crop_inches,
            dpi,
            target_width,
            target_height,
            max_bytes,
            format,
        )
    }
}

fn positive_real(parameter: &'static str, value: f64) -> Result<f64, PipelineError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PipelineError::invalid(parameter, value))
    }
}

fn positive_int(parameter: &'static str, value: i64) -> Result<u32, PipelineError> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(PipelineError::invalid(parameter, value)),
    }
}

pub(crate) fn target_side(parameter: &'static str, side: u32) -> Result<u32, PipelineError> {
    if side == 0 {
        return Err(PipelineError::invalid(parameter, side));
    }
    if side > MAX_TARGET_SIDE {
        return Err(PipelineError::invalid_because(
            parameter,
            side,
            "exceeds the 8192 pixel maximum",
        ));
    }
    Ok(side)
}

/// A validated transform request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    crop_inches: f64,
    dpi: u32,
    target_width: u32,
    target_height: u32,
    max_bytes: u64,
    format: OutputFormat,
    search: QualitySearch,
}

impl TransformConfig {
    /// Build a request with the default JPEG quality search.
    ///
    /// Fails with [`PipelineError::InvalidDimension`] naming the first
    /// non-positive (or non-finite) parameter, or a target side above
    /// [`MAX_TARGET_SIDE`].
    pub fn new(
        crop_inches: f64,
        dpi: u32,
        target_width: u32,
        target_height: u32,
        max_bytes: u64,
        format: OutputFormat,
    ) -> Result<Self, PipelineError> {
        positive_real("crop_size_inches", crop_inches)?;
        if dpi == 0 {
            return Err(PipelineError::invalid("dpi", dpi));
        }
        target_side("target_width_px", target_width)?;
        target_side("target_height_px", target_height)?;
        if max_bytes == 0 {
            return Err(PipelineError::invalid("max_bytes", max_bytes));
        }
        Ok(Self {
            crop_inches,
            dpi,
            target_width,
            target_height,
            max_bytes,
            format,
            search: QualitySearch::default(),
        })
    }

    /// Replace the JPEG quality ladder. Ignored for PNG output.
    pub fn with_quality_search(mut self, search: QualitySearch) -> Self {
        self.search = search;
        self
    }

    pub fn crop_inches(&self) -> f64 {
        self.crop_inches
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality_search(&self) -> QualitySearch {
        self.search
    }
}
