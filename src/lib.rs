//! # Pixellate
//!
//! Turns a personal photo into a fixed-geometry, size-bounded output image:
//! a centered square crop, an exact resize, and a compression pass that keeps
//! the file under a byte budget.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Decode    bytes   →  DynamicImage   (format sniffed from content)
//! 2. Crop      image   →  square         (round(inches × dpi), clamped, centered)
//! 3. Resize    square  →  target         (exact W×H, Lanczos3)
//! 4. Compress  target  →  EncodedResult  (JPEG quality search / PNG single pass)
//! ```
//!
//! The stages run in order, once, with no feedback between them. Everything
//! the run did is described by the returned [`pipeline::EncodedResult`],
//! including the list of encode attempts, so the caller can report on it
//! without the library logging anything.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Entry points ([`pipeline::process`]), the result type and the error type |
//! | [`imaging`] | Request types, crop geometry, codec backend and compression strategies |
//! | [`config`] | `config.toml` loading, validation and merging: request defaults, input limits, JPEG search tuning |
//! | [`output`] | CLI output formatting and the JSON report |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//!
//! # Design Decisions
//!
//! ## Validated Configuration
//!
//! User input arrives as a loosely typed [`imaging::TransformSettings`]
//! (signed numbers, a format string). [`imaging::TransformSettings::resolve`]
//! turns it into an [`imaging::TransformConfig`] or names the offending
//! parameter. Nothing past that point re-checks input, and the config is
//! never mutated.
//!
//! ## Exact Target Geometry
//!
//! The square crop is stretched to the target size without preserving the
//! aspect ratio. The output always has exactly the requested dimensions;
//! size limits are met by compression alone, never by shrinking.
//!
//! ## Bounded Quality Search
//!
//! JPEG output tries qualities from 95 down to 10 in steps of 5 and keeps the
//! first encode that fits. If none fits, the floor encode is returned with
//! `size_exceeded` set rather than failing: an oversized photo is more useful
//! than no photo. PNG has no lossy lever, so it gets one best-compression pass
//! and the same flag.
//!
//! ## Binary Megabytes
//!
//! Budgets are given in MB and converted with 1 MB = 1,048,576 bytes,
//! truncating any fraction of a byte.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod pipeline;
