//! Safe wrappers around OpenSlide's per-slide C API.
//!
//! This module provides:
//! - [`Slide`], an owned handle to an open whole-slide image with
//!   metadata, property, and associated-image accessors
//! - region and associated-image readers returning non-premultiplied
//!   [`image::RgbaImage`] values
//! - [`can_open`], the format capability probe
//!
//! # Error checking
//!
//! OpenSlide reports most failures through a per-handle error state rather
//! than through return values. Every handle-taking call here runs under a
//! uniform post-call policy that polls `openslide_get_error` and turns a
//! non-empty message into [`crate::error::OpenSlideError::Native`]. See
//! [`Slide`] for the handle lifecycle rules.

mod handle;
mod region;

#[cfg(test)]
pub(crate) mod stub;

pub use handle::{can_open, Slide};
