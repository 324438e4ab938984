//! Function binding table for the OpenSlide C API.
//!
//! Every native entry point used by this crate is declared here exactly
//! once: its symbol name, and its C signature as an `unsafe extern "C"`
//! function-pointer type. [`OpenSlideApi::resolve`] looks all of them up a
//! single time after the library is loaded.
//!
//! A missing symbol is fatal: `openslide_get_version` appeared in
//! OpenSlide 3.3.0 together with the rest of the symbols bound here, so
//! any lookup failure means the installed library predates the minimum
//! supported release.

use std::os::raw::{c_char, c_void};

use libloading::Library;

use crate::error::LoadError;

// =============================================================================
// Signatures
// =============================================================================

/// `openslide_get_version`
pub(crate) type GetVersionFn = unsafe extern "C" fn() -> *const c_char;

/// `openslide_can_open`
pub(crate) type CanOpenFn = unsafe extern "C" fn(*const c_char) -> bool;

/// `openslide_open`
pub(crate) type OpenFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;

/// `openslide_close`
pub(crate) type CloseFn = unsafe extern "C" fn(*mut c_void);

/// `openslide_get_level_count`
pub(crate) type GetLevelCountFn = unsafe extern "C" fn(*mut c_void) -> i32;

/// `openslide_get_level_dimensions`
pub(crate) type GetLevelDimensionsFn =
    unsafe extern "C" fn(*mut c_void, i32, *mut i64, *mut i64);

/// `openslide_get_level_downsample`
pub(crate) type GetLevelDownsampleFn = unsafe extern "C" fn(*mut c_void, i32) -> f64;

/// `openslide_get_best_level_for_downsample`
pub(crate) type GetBestLevelForDownsampleFn =
    unsafe extern "C" fn(*mut c_void, f64) -> i32;

/// `openslide_read_region`
pub(crate) type ReadRegionFn =
    unsafe extern "C" fn(*mut c_void, *mut u32, i64, i64, i32, i64, i64);

/// `openslide_get_error`
pub(crate) type GetErrorFn = unsafe extern "C" fn(*mut c_void) -> *const c_char;

/// `openslide_get_property_names`
pub(crate) type GetPropertyNamesFn =
    unsafe extern "C" fn(*mut c_void) -> *const *const c_char;

/// `openslide_get_property_value`
pub(crate) type GetPropertyValueFn =
    unsafe extern "C" fn(*mut c_void, *const c_char) -> *const c_char;

/// `openslide_get_associated_image_names`
pub(crate) type GetAssociatedImageNamesFn =
    unsafe extern "C" fn(*mut c_void) -> *const *const c_char;

/// `openslide_get_associated_image_dimensions`
pub(crate) type GetAssociatedImageDimensionsFn =
    unsafe extern "C" fn(*mut c_void, *const c_char, *mut i64, *mut i64);

/// `openslide_read_associated_image`
pub(crate) type ReadAssociatedImageFn =
    unsafe extern "C" fn(*mut c_void, *const c_char, *mut u32);

// =============================================================================
// Binding table
// =============================================================================

/// Resolved OpenSlide entry points.
///
/// A plain table of C function pointers, filled in once at load time. The
/// pointers are only valid while the `Library` they were resolved from
/// stays mapped; the process-wide singleton in [`crate::library`] keeps
/// that `Library` alive for the lifetime of the process.
#[derive(Clone, Copy)]
pub(crate) struct OpenSlideApi {
    pub(crate) get_version: GetVersionFn,
    pub(crate) can_open: CanOpenFn,
    pub(crate) open: OpenFn,
    pub(crate) close: CloseFn,
    pub(crate) get_level_count: GetLevelCountFn,
    pub(crate) get_level_dimensions: GetLevelDimensionsFn,
    pub(crate) get_level_downsample: GetLevelDownsampleFn,
    pub(crate) get_best_level_for_downsample: GetBestLevelForDownsampleFn,
    pub(crate) read_region: ReadRegionFn,
    pub(crate) get_error: GetErrorFn,
    pub(crate) get_property_names: GetPropertyNamesFn,
    pub(crate) get_property_value: GetPropertyValueFn,
    pub(crate) get_associated_image_names: GetAssociatedImageNamesFn,
    pub(crate) get_associated_image_dimensions: GetAssociatedImageDimensionsFn,
    pub(crate) read_associated_image: ReadAssociatedImageFn,
}

impl OpenSlideApi {
    /// Resolve every bound symbol from a loaded library.
    ///
    /// The version query is resolved first: it is the sentinel for the
    /// minimum supported release, so its absence produces the clearest
    /// possible error before anything else is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingSymbol`] naming the first symbol that
    /// cannot be found.
    pub(crate) fn resolve(library: &Library) -> Result<Self, LoadError> {
        Ok(Self {
            get_version: symbol(library, "openslide_get_version")?,
            can_open: symbol(library, "openslide_can_open")?,
            open: symbol(library, "openslide_open")?,
            close: symbol(library, "openslide_close")?,
            get_level_count: symbol(library, "openslide_get_level_count")?,
            get_level_dimensions: symbol(library, "openslide_get_level_dimensions")?,
            get_level_downsample: symbol(library, "openslide_get_level_downsample")?,
            get_best_level_for_downsample: symbol(
                library,
                "openslide_get_best_level_for_downsample",
            )?,
            read_region: symbol(library, "openslide_read_region")?,
            get_error: symbol(library, "openslide_get_error")?,
            get_property_names: symbol(library, "openslide_get_property_names")?,
            get_property_value: symbol(library, "openslide_get_property_value")?,
            get_associated_image_names: symbol(
                library,
                "openslide_get_associated_image_names",
            )?,
            get_associated_image_dimensions: symbol(
                library,
                "openslide_get_associated_image_dimensions",
            )?,
            read_associated_image: symbol(library, "openslide_read_associated_image")?,
        })
    }
}

/// Look up one symbol and copy the function pointer out of the
/// [`libloading::Symbol`] guard.
///
/// The copied pointer outlives the guard but not the library; callers must
/// keep the `Library` mapped for as long as the pointer is used.
fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, LoadError> {
    // SAFETY: the signature `T` is declared alongside the symbol name in
    // this module and matches the OpenSlide C headers.
    let sym = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|_| LoadError::MissingSymbol(name))?;
    Ok(*sym)
}
