//! Slide handle lifecycle and per-call error checking.
//!
//! OpenSlide hands out an opaque pointer per open slide and expects every
//! subsequent call to receive it back. The [`Slide`] wrapper owns that
//! pointer, tracks whether it is still valid, and releases it exactly
//! once. Three post-call policies live here alongside it:
//!
//! - **open-check**: a null pointer from `openslide_open` is an open
//!   failure; anything else becomes a valid `Slide`
//! - **error-check**: after every handle-taking call, the library's
//!   per-handle error state is polled and a non-empty message is raised
//! - **name-list**: error-check, then walk a NUL-terminated string array
//!   into an ordered `Vec<String>`

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::path::Path;

use tracing::debug;

use crate::error::OpenSlideError;
use crate::library::{self, OpenSlideApi};

// =============================================================================
// Slide
// =============================================================================

/// An open whole-slide image.
///
/// Wraps the opaque per-slide handle returned by `openslide_open`. The
/// handle stays valid until [`close`](Slide::close) is called or the value
/// is dropped, whichever comes first; afterwards every operation fails
/// with [`OpenSlideError::ClosedHandle`] before reaching the native
/// library.
///
/// # Thread safety
///
/// A `Slide` may be moved to another thread but not shared between
/// threads: the library's per-handle error state is polled immediately
/// after each call, and interleaved calls on one handle would race on it.
/// Distinct slides are independent and may be used from distinct threads
/// concurrently.
pub struct Slide {
    api: &'static OpenSlideApi,
    handle: *mut c_void,
    valid: bool,
}

// A handle can migrate between threads; it just cannot be shared (`Slide`
// is deliberately not `Sync`, which the raw pointer field already ensures).
unsafe impl Send for Slide {}

impl Slide {
    /// Open the whole-slide image at `path`.
    ///
    /// Loads and binds the native library on first use anywhere in the
    /// process.
    ///
    /// # Errors
    ///
    /// - [`OpenSlideError::Load`] if the library cannot be loaded or is
    ///   older than the minimum supported release
    /// - [`OpenSlideError::OpenFailed`] if OpenSlide cannot open the file.
    ///   The native layer reports open failure through its return value
    ///   alone, so this carries no library error message.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenSlideError> {
        Self::open_with(library::library()?, path.as_ref())
    }

    /// Open against an explicit binding table. Split out of [`Slide::open`]
    /// so tests can substitute a stub table for the loaded library.
    pub(crate) fn open_with(
        api: &'static OpenSlideApi,
        path: &Path,
    ) -> Result<Self, OpenSlideError> {
        let c_path = path_to_cstring(path)?;

        // SAFETY: `c_path` is a valid NUL-terminated string; `open` does
        // not retain the pointer past the call.
        let handle = unsafe { (api.open)(c_path.as_ptr()) };
        if handle.is_null() {
            return Err(OpenSlideError::OpenFailed {
                path: path.display().to_string(),
            });
        }

        debug!("opened slide {}", path.display());
        Ok(Self {
            api,
            handle,
            valid: true,
        })
    }

    /// Whether the handle has not been closed yet.
    pub fn is_open(&self) -> bool {
        self.valid
    }

    /// Release the native handle.
    ///
    /// Invalidation is unconditional: even though `openslide_close` itself
    /// cannot fail, no further call is ever issued against this handle
    /// afterwards. Calling `close` again is a no-op.
    pub fn close(&mut self) {
        if self.valid {
            // SAFETY: the handle is valid and this is the single release.
            unsafe { (self.api.close)(self.handle) };
            debug!("closed slide handle");
        }
        self.valid = false;
    }
}

impl Drop for Slide {
    /// Runs the close path exactly once, guarded by the validity flag.
    ///
    /// Depends only on the handle and the `'static` binding table, so it
    /// is safe during process teardown regardless of destruction order.
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Checker policies
// =============================================================================

impl Slide {
    /// Validated access to the raw handle.
    ///
    /// Every native call goes through this first so that a closed handle
    /// can never cross the FFI boundary.
    fn raw(&self) -> Result<*mut c_void, OpenSlideError> {
        if self.valid {
            Ok(self.handle)
        } else {
            Err(OpenSlideError::ClosedHandle)
        }
    }

    /// Run a native call under the error-check policy.
    ///
    /// Invokes `call` with the binding table and the validated handle,
    /// then polls `openslide_get_error`. A non-empty message becomes
    /// [`OpenSlideError::Native`] (discarding the call's own result);
    /// otherwise the result passes through unchanged.
    pub(crate) fn checked<T>(
        &self,
        call: impl FnOnce(&OpenSlideApi, *mut c_void) -> T,
    ) -> Result<T, OpenSlideError> {
        let handle = self.raw()?;
        let result = call(self.api, handle);
        match self.last_error() {
            Some(message) => Err(OpenSlideError::Native(message)),
            None => Ok(result),
        }
    }

    /// Poll the library's per-handle error state.
    ///
    /// OpenSlide keeps the message at least until the next call on the
    /// same handle, which is why this runs immediately after each call and
    /// why a handle must not be shared across threads.
    fn last_error(&self) -> Option<String> {
        // SAFETY: the handle was validated by the caller; `get_error`
        // returns null or a NUL-terminated message owned by the handle.
        let ptr = unsafe { (self.api.get_error)(self.handle) };
        if ptr.is_null() {
            return None;
        }
        let message = unsafe { CStr::from_ptr(ptr) }.to_string_lossy();
        if message.is_empty() {
            None
        } else {
            Some(message.into_owned())
        }
    }

    /// Run a native call returning a NUL-terminated string array under the
    /// name-list policy: error-check first, then collect entries in native
    /// order until the terminating null (or empty) entry.
    fn checked_name_list(
        &self,
        call: impl FnOnce(&OpenSlideApi, *mut c_void) -> *const *const c_char,
    ) -> Result<Vec<String>, OpenSlideError> {
        let array = self.checked(call)?;
        let mut names = Vec::new();
        if array.is_null() {
            return Ok(names);
        }
        for i in 0.. {
            // SAFETY: the array is NUL-terminated; we stop at the first
            // null entry and never read past it.
            let entry = unsafe { *array.add(i) };
            if entry.is_null() {
                break;
            }
            let name = unsafe { CStr::from_ptr(entry) }.to_string_lossy();
            if name.is_empty() {
                break;
            }
            names.push(name.into_owned());
        }
        Ok(names)
    }
}

// =============================================================================
// Metadata queries
// =============================================================================

impl Slide {
    /// Number of levels in the slide's resolution pyramid.
    pub fn level_count(&self) -> Result<i32, OpenSlideError> {
        self.checked(|api, handle| unsafe { (api.get_level_count)(handle) })
    }

    /// Dimensions in pixels of a pyramid level, as `(width, height)`.
    pub fn level_dimensions(&self, level: i32) -> Result<(i64, i64), OpenSlideError> {
        let mut width: i64 = 0;
        let mut height: i64 = 0;
        self.checked(|api, handle| unsafe {
            (api.get_level_dimensions)(handle, level, &mut width, &mut height)
        })?;
        Ok((width, height))
    }

    /// Downsample factor of a pyramid level relative to level 0.
    pub fn level_downsample(&self, level: i32) -> Result<f64, OpenSlideError> {
        self.checked(|api, handle| unsafe { (api.get_level_downsample)(handle, level) })
    }

    /// Index of the best level to read for a target downsample factor.
    pub fn best_level_for_downsample(&self, downsample: f64) -> Result<i32, OpenSlideError> {
        self.checked(|api, handle| unsafe {
            (api.get_best_level_for_downsample)(handle, downsample)
        })
    }

    /// Names of the slide's metadata properties, in native order.
    pub fn property_names(&self) -> Result<Vec<String>, OpenSlideError> {
        self.checked_name_list(|api, handle| unsafe { (api.get_property_names)(handle) })
    }

    /// Value of the named property, or `None` if the slide does not carry
    /// it.
    pub fn property_value(&self, name: &str) -> Result<Option<String>, OpenSlideError> {
        let c_name = cstring_arg(name)?;
        let ptr = self.checked(|api, handle| unsafe {
            (api.get_property_value)(handle, c_name.as_ptr())
        })?;
        if ptr.is_null() {
            return Ok(None);
        }
        // SAFETY: non-null property values are NUL-terminated strings
        // owned by the handle; we copy before returning.
        Ok(Some(
            unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned(),
        ))
    }

    /// Names of the associated images bundled with the slide, in native
    /// order.
    pub fn associated_image_names(&self) -> Result<Vec<String>, OpenSlideError> {
        self.checked_name_list(|api, handle| unsafe {
            (api.get_associated_image_names)(handle)
        })
    }

    /// Dimensions in pixels of the named associated image, as
    /// `(width, height)`.
    pub fn associated_image_dimensions(
        &self,
        name: &str,
    ) -> Result<(i64, i64), OpenSlideError> {
        let c_name = cstring_arg(name)?;
        let mut width: i64 = 0;
        let mut height: i64 = 0;
        self.checked(|api, handle| unsafe {
            (api.get_associated_image_dimensions)(handle, c_name.as_ptr(), &mut width, &mut height)
        })?;
        Ok((width, height))
    }
}

// =============================================================================
// Capability probe
// =============================================================================

/// Ask OpenSlide whether it recognizes the file at `path`.
///
/// A capability probe only: the slide is not opened and no error state is
/// set.
///
/// # Errors
///
/// Returns [`OpenSlideError::Load`] if the native library cannot be loaded
/// or bound.
pub fn can_open(path: impl AsRef<Path>) -> Result<bool, OpenSlideError> {
    let api = library::library()?;
    let c_path = path_to_cstring(path.as_ref())?;
    // SAFETY: `c_path` is a valid NUL-terminated string.
    Ok(unsafe { (api.can_open)(c_path.as_ptr()) })
}

// =============================================================================
// Argument marshaling
// =============================================================================

/// Marshal a filesystem path into the NUL-terminated byte string the C API
/// expects.
///
/// Unix paths are passed through as raw bytes. Elsewhere the path is
/// converted lossily to UTF-8, which matches what OpenSlide expects on
/// those platforms.
pub(crate) fn path_to_cstring(path: &Path) -> Result<CString, OpenSlideError> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path.to_string_lossy().into_owned().into_bytes();

    CString::new(bytes).map_err(|_| OpenSlideError::InvalidString(path.display().to_string()))
}

/// Marshal a string argument (property or associated-image name) for the C
/// API.
pub(crate) fn cstring_arg(s: &str) -> Result<CString, OpenSlideError> {
    CString::new(s).map_err(|_| OpenSlideError::InvalidString(s.to_owned()))
}

// =============================================================================
// Tests
// =============================================================================
