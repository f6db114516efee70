//! Size-bounded compression: fit an encoded image under a byte budget.
//!
//! Each output format has its own strategy:
//!
//! | Format | Strategy | Lever |
//! |---|---|---|
//! | JPEG | [`CompressionStrategy::QualitySearch`] | encoder quality, walked down a fixed ladder |
//! | PNG | [`CompressionStrategy::Optimized`] | none; one maximum-effort lossless pass |
//!
//! Every attempt encodes the same resized pixels. Nothing is ever re-encoded
//! from a previous attempt's compressed output, so lowering the quality
//! never compounds artifacts.
//!
//! Missing the budget is not an error. The best effort is returned with
//! [`Compressed::size_exceeded`] set and the caller decides what to tell the
//! user.

use super::backend::ImageBackend;
use super::params::{OutputFormat, Quality, QualitySearch};
use crate::pipeline::PipelineError;
use image::DynamicImage;
use serde::Serialize;

/// One encode performed during compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attempt {
    /// JPEG quality used, `None` for lossless formats.
    pub quality: Option<Quality>,
    /// Encoded size in bytes.
    pub size: usize,
}

/// Final encoding chosen by a strategy.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub quality: Option<Quality>,
    /// Every encode in order, including the chosen one (always last).
    pub attempts: Vec<Attempt>,
    pub size_exceeded: bool,
}

/// Per-format policy for meeting a byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStrategy {
    /// Lossy: try qualities from high to low, stop at the first that fits.
    QualitySearch(QualitySearch),
    /// Lossless: a single best-compression pass, returned whether or not it fits.
    Optimized,
}

impl CompressionStrategy {
    pub fn for_format(format: OutputFormat, search: QualitySearch) -> Self {
        match format {
            OutputFormat::Jpeg => Self::QualitySearch(search),
            OutputFormat::Png => Self::Optimized,
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            Self::QualitySearch(_) => OutputFormat::Jpeg,
            Self::Optimized => OutputFormat::Png,
        }
    }

    /// Encode `image` so it fits in `max_bytes`, or as close as the strategy allows.
    ///
    /// # Errors
    /// [`PipelineError::InvalidDimension`] if `max_bytes` is 0;
    /// [`PipelineError::EncodeFailure`] on the first encoder error.
    pub fn compress(
        &self,
        backend: &impl ImageBackend,
        image: &DynamicImage,
        max_bytes: u64,
    ) -> Result<Compressed, PipelineError> {
        if max_bytes == 0 {
            return Err(PipelineError::invalid("max_bytes", max_bytes));
        }
        match self {
            Self::QualitySearch(search) => search_quality(backend, image, max_bytes, search),
            Self::Optimized => optimize_once(backend, image, max_bytes),
        }
    }
}

fn fits(bytes: &[u8], max_bytes: u64) -> bool {
    bytes.len() as u64 <= max_bytes
}

fn search_quality(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    max_bytes: u64,
    search: &QualitySearch,
) -> Result<Compressed, PipelineError> {
    let ladder = search.ladder();
    let mut attempts = Vec::with_capacity(ladder.len());
    let mut best_effort = None;

    for quality in ladder {
        let bytes = backend.encode_jpeg(image, quality)?;
        attempts.push(Attempt {
            quality: Some(quality),
            size: bytes.len(),
        });
        if fits(&bytes, max_bytes) {
            return Ok(Compressed {
                bytes,
                quality: Some(quality),
                attempts,
                size_exceeded: false,
            });
        }
        best_effort = Some((quality, bytes));
    }

    // The ladder always holds at least the floor, so this only trips if that changes.
    let Some((quality, bytes)) = best_effort else {
        return Err(PipelineError::EncodeFailure {
            format: OutputFormat::Jpeg.label(),
            message: "quality ladder is empty".to_string(),
        });
    };
    Ok(Compressed {
        bytes,
        quality: Some(quality),
        attempts,
        size_exceeded: true,
    })
}

fn optimize_once(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    max_bytes: u64,
) -> Result<Compressed, PipelineError> {
    let bytes = backend.encode_png(image)?;
    let size_exceeded = !fits(&bytes, max_bytes);
    Ok(Compressed {
        attempts: vec![Attempt {
            quality: None,
            size: bytes.len(),
        }],
        bytes,
        quality: None,
        size_exceeded,
    })
}
