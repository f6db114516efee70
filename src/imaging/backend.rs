//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three codec operations the pipeline
//! needs: decode the upload, encode a JPEG at a given quality, and encode a
//! PNG with maximum compression effort. Geometry (crop, resize) is not part of
//! the trait; it runs on the decoded [`DynamicImage`] directly.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests swap in a mock so
//! the quality search can be driven with exact, predictable sizes.

use super::params::Quality;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("{format} encode failed: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
}

/// Trait for image codec backends.
///
/// Implementations must be deterministic: the same pixels and parameters
/// produce the same bytes. The quality search and the idempotence guarantee
/// of the pipeline both rely on that.
pub trait ImageBackend: Sync {
    /// Decode an uploaded file of any supported input format.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Encode as baseline JPEG at the given quality.
    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;

    /// Encode as PNG with the strongest compression the encoder offers.
    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>, BackendError>;
}
