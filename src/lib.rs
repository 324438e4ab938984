//! # wsi-openslide
//!
//! Safe Rust bindings to the [OpenSlide](https://openslide.org) library for
//! reading Whole Slide Images (WSI).
//!
//! OpenSlide does the hard work of parsing vendor slide formats and
//! compositing pyramid tiles; this crate is the safety shim in front of
//! its C API. It loads the shared library at runtime, checks the
//! library's per-handle error state after every call, guarantees a slide
//! handle is never used after it is closed, and converts OpenSlide's
//! premultiplied native-endian ARGB pixel buffers into ordinary
//! straight-alpha [`image::RgbaImage`] values.
//!
//! ## Features
//!
//! - **Runtime loading**: finds `libopenslide` at first use, with an
//!   `OPENSLIDE_PATH` override; no build-time linkage required
//! - **Handle safety**: closed handles fail locally instead of reaching
//!   the native library; close is idempotent and runs on drop
//! - **Uniform error surface**: one [`OpenSlideError`] family for native
//!   failures and local validation alike
//! - **Portable pixels**: un-premultiplied RGBA output, independent of
//!   host byte order
//!
//! ## Architecture
//!
//! - [`library`] - shared-library loading and the resolved binding table
//! - [`slide`] - the [`Slide`] handle, metadata queries, and region readers
//! - [`pixel`] - packed-ARGB to RGBA conversion
//! - [`error`] - the error family
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_openslide::Slide;
//!
//! fn main() -> Result<(), wsi_openslide::OpenSlideError> {
//!     let slide = Slide::open("slide.svs")?;
//!
//!     let levels = slide.level_count()?;
//!     let (width, height) = slide.level_dimensions(0)?;
//!     println!("{} levels, {}x{} at full resolution", levels, width, height);
//!
//!     // Read a 512x512 region from the top-left corner of level 0.
//!     let region = slide.read_region(0, 0, 0, 512, 512)?;
//!     assert_eq!((region.width(), region.height()), (512, 512));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Thread safety
//!
//! Calls are synchronous and blocking. A single [`Slide`] must not be used
//! from multiple threads at once (it is `Send` but not `Sync`); distinct
//! slides are independent.

pub mod error;
pub mod library;
pub mod pixel;
pub mod slide;

// Re-export commonly used types
pub use error::{LoadError, OpenSlideError};
pub use library::{candidate_names, version, PATH_ENV_VAR};
pub use pixel::to_rgba_image;
pub use slide::{can_open, Slide};
