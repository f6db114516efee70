//! Image processing: pure Rust, no system libraries.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **Square crop** | `DynamicImage::crop_imm`, centered |
//! | **Resize** | `DynamicImage::resize_exact` with Lanczos3 |
//! | **Compress** | JPEG quality ladder / PNG best-compression pass |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry, byte budgets and the quality ladder
//! - **Parameters**: The request types ([`TransformSettings`] → [`TransformConfig`])
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The geometry stages (crop, resize)
//! - **Compression**: The per-format strategy that meets the byte budget

pub mod backend;
pub mod calculations;
pub mod compression;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{BYTES_PER_MB, CropRegion};
pub use compression::{Attempt, CompressionStrategy, Compressed};
pub use operations::{SquareCrop, resize_to_target, square_crop};
pub use params::{OutputFormat, Quality, QualitySearch, TransformConfig, TransformSettings};
pub use rust_backend::RustBackend;
