//! The transform pipeline: decode → square crop → resize → compress → result.
//!
//! A straight line of four stages with no branching back. The only decision
//! point is inside compression (see [`CompressionStrategy`]), and that is a
//! bounded search.
//!
//! ```text
//! bytes ──decode──▶ source ──crop──▶ square ──resize──▶ target ──compress──▶ EncodedResult
//! ```
//!
//! ## Failure semantics
//!
//! The first failing stage aborts the run and nothing partial is returned.
//! Every failure is deterministic for a given input, so there are no
//! retries. Going over the size budget is *not* a failure: the result comes
//! back with [`EncodedResult::size_exceeded`] set.
//!
//! ## Side effects
//!
//! None. The pipeline does not log and does not write files; the attempt
//! trace in [`EncodedResult::attempts`] is there for the caller to report.

use crate::imaging::{
    Attempt, BackendError, CompressionStrategy, ImageBackend, OutputFormat, Quality, RustBackend,
    TransformConfig, resize_to_target, square_crop,
};
use image::DynamicImage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid {parameter}: {value} ({reason})")]
    InvalidDimension {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("Unsupported output format: {0:?} (expected jpg or png)")]
    UnsupportedFormat(String),
    #[error("Could not decode source image: {0}")]
    DecodeFailure(String),
    #[error("{format} encoding failed: {message}")]
    EncodeFailure {
        format: &'static str,
        message: String,
    },
}

impl PipelineError {
    pub(crate) fn invalid(parameter: &'static str, value: impl Display) -> Self {
        Self::invalid_because(parameter, value, "must be a positive number")
    }

    pub(crate) fn invalid_because(
        parameter: &'static str,
        value: impl Display,
        reason: &'static str,
    ) -> Self {
        Self::InvalidDimension {
            parameter,
            value: value.to_string(),
            reason,
        }
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(message) => Self::DecodeFailure(message),
            BackendError::Encode { format, message } => Self::EncodeFailure { format, message },
        }
    }
}

/// Output of a successful run. The caller owns the bytes.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// Side of the square cut from the source, after clamping.
    pub crop_side: u32,
    /// JPEG quality of the returned bytes; `None` for PNG.
    pub quality: Option<Quality>,
    pub attempts: Vec<Attempt>,
    /// The budget could not be met; `bytes` is the best effort.
    pub size_exceeded: bool,
}

impl EncodedResult {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 of the encoded bytes, as a hex string.
    pub fn sha256(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }
}

/// Decode `source` and run the full pipeline with the pure Rust backend.
pub fn process(source: &[u8], config: &TransformConfig) -> Result<EncodedResult, PipelineError> {
    process_with_backend(&RustBackend::new(), source, config)
}

/// Run the pipeline on an already decoded image.
pub fn process_image(
    image: &DynamicImage,
    config: &TransformConfig,
) -> Result<EncodedResult, PipelineError> {
    transform(&RustBackend::new(), image, config)
}

/// [`process`] with an explicit codec backend.
pub fn process_with_backend(
    backend: &impl ImageBackend,
    source: &[u8],
    config: &TransformConfig,
) -> Result<EncodedResult, PipelineError> {
    let image = backend.decode(source)?;
    transform(backend, &image, config)
}

fn transform(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    config: &TransformConfig,
) -> Result<EncodedResult, PipelineError> {
    let crop = square_crop(image, config.crop_inches(), config.dpi())?;
    let crop_side = crop.region.side;
    let resized = resize_to_target(&crop.image, config.target_width(), config.target_height())?;
    drop(crop);

    let strategy = CompressionStrategy::for_format(config.format(), config.quality_search());
    let compressed = strategy.compress(backend, &resized, config.max_bytes())?;

    let format = strategy.format();
    Ok(EncodedResult {
        bytes: compressed.bytes,
        format,
        mime_type: format.mime_type(),
        width: resized.width(),
        height: resized.height(),
        crop_side,
        quality: compressed.quality,
        attempts: compressed.attempts,
        size_exceeded: compressed.size_exceeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{QualitySearch, TransformSettings};
    use image::RgbImage;

    fn config(format: OutputFormat, max_bytes: u64) -> TransformConfig {
        TransformConfig::new(2.0, 300, 461, 579, max_bytes, format).unwrap()
    }

    fn photo(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn mock_pipeline_runs_stages_in_order() {
        let backend = MockBackend::decoding_to(2000, 3000);
        let result =
            process_with_backend(&backend, b"upload", &config(OutputFormat::Jpeg, 1_048_576))
                .unwrap();

        assert_eq!((result.width, result.height), (461, 579));
        assert_eq!(result.crop_side, 600);
        assert_eq!(result.mime_type, "image/jpeg");
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode(6),
                RecordedOp::EncodeJpeg {
                    quality: 95,
                    width: 461,
                    height: 579
                }
            ]
        );
    }

    #[test]
    fn decode_failure_aborts_before_encoding() {
        let backend = MockBackend::new();
        let err = process_with_backend(&backend, &[], &config(OutputFormat::Png, 1_000)).unwrap_err();
        assert!(matches!(err, PipelineError::DecodeFailure(_)));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(0)]);
    }

    #[test]
    fn encode_failure_is_reported_with_format() {
        let backend = MockBackend {
            fail_encoding: true,
            ..MockBackend::default()
        };
        let err = process_with_backend(&backend, b"x", &config(OutputFormat::Png, 1_000)).unwrap_err();
        assert!(matches!(err, PipelineError::EncodeFailure { format: "PNG", .. }));
    }

    #[test]
    fn result_reports_budget_miss() {
        let backend = MockBackend::with_jpeg_sizes(|_| 2_000_000);
        let result =
            process_with_backend(&backend, b"x", &config(OutputFormat::Jpeg, 1_048_576)).unwrap();
        assert!(result.size_exceeded);
        assert_eq!(result.quality, Some(Quality::new(10)));
        assert_eq!(result.len(), 2_000_000);
    }

    #[test]
    fn custom_quality_search_reaches_backend() {
        let backend = MockBackend::with_jpeg_sizes(|_| 2_000_000);
        let config =
            config(OutputFormat::Jpeg, 1_000).with_quality_search(QualitySearch::new(60, 40, 10));
        process_with_backend(&backend, b"x", &config).unwrap();
        assert_eq!(backend.jpeg_qualities(), vec![60, 50, 40]);
    }

    #[test]
    fn real_jpeg_roundtrip_has_target_dimensions() {
        let result = process_image(&photo(800, 1000), &config(OutputFormat::Jpeg, 1_048_576)).unwrap();
        assert_eq!(image::guess_format(&result.bytes).unwrap(), image::ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (461, 579));
        assert!(!result.size_exceeded);
        assert_eq!(result.quality, Some(Quality::new(95)));
        // 2 in @ 300 dpi = 600, fits inside 800x1000
        assert_eq!(result.crop_side, 600);
    }

    #[test]
    fn real_png_roundtrip() {
        let result = process_image(&photo(300, 200), &config(OutputFormat::Png, 10_485_760)).unwrap();
        assert_eq!(result.mime_type, "image/png");
        assert_eq!(image::guess_format(&result.bytes).unwrap(), image::ImageFormat::Png);
        assert_eq!(result.crop_side, 200);
        assert_eq!(result.attempts.len(), 1);
    }

    #[test]
    fn process_decodes_bytes() {
        let mut png = Vec::new();
        photo(120, 80)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let config = TransformConfig::new(1.0, 100, 32, 40, 1_048_576, OutputFormat::Jpeg).unwrap();
        let result = process(&png, &config).unwrap();
        assert_eq!((result.width, result.height), (32, 40));
        assert_eq!(result.crop_side, 80);
    }

    #[test]
    fn process_is_idempotent() {
        let config = config(OutputFormat::Jpeg, 30_000);
        let image = photo(700, 900);
        let a = process_image(&image, &config).unwrap();
        let b = process_image(&image, &config).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.sha256(), b.sha256());
        assert_eq!(a.attempts, b.attempts);
    }

    #[test]
    fn settings_with_bmp_never_reach_pipeline() {
        let settings = TransformSettings {
            output_format: "BMP".to_string(),
            ..TransformSettings::default()
        };
        assert!(matches!(
            settings.resolve(),
            Err(PipelineError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn error_messages_name_the_parameter() {
        let err = PipelineError::invalid("dpi", -3);
        assert_eq!(err.to_string(), "Invalid dpi: -3 (must be a positive number)");
        let err = PipelineError::UnsupportedFormat("bmp".into());
        assert!(err.to_string().contains("\"bmp\""));
    }

    #[test]
    fn sha256_is_hex() {
        let result = process_image(&photo(10, 10), &config(OutputFormat::Png, 1_000_000)).unwrap();
        let digest = result.sha256();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
