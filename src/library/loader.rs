//! Locating and loading the OpenSlide shared library.
//!
//! OpenSlide is loaded at runtime with `libloading` rather than linked at
//! build time, so the crate compiles without the library installed and
//! picks up whatever ABI-compatible copy the host system provides.
//!
//! # Search order
//!
//! 1. The path named by the `OPENSLIDE_PATH` environment variable, when set.
//! 2. Platform-specific soname candidates, resolved through the system
//!    loader's normal search path.

use libloading::Library;
use tracing::debug;

use crate::error::LoadError;

/// Environment variable naming an explicit path to the OpenSlide shared
/// library. Takes precedence over the built-in candidate names.
pub const PATH_ENV_VAR: &str = "OPENSLIDE_PATH";

/// Candidate file names for the OpenSlide shared library on this platform,
/// in priority order.
///
/// The versioned name (ABI 0, the ABI shipped since OpenSlide 3.3.0) is
/// tried first; the unversioned development symlink is the fallback.
pub const fn candidate_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["libopenslide-0.dll", "libopenslide-1.dll"]
    }
    #[cfg(target_os = "macos")]
    {
        &["libopenslide.0.dylib", "libopenslide.dylib"]
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        &["libopenslide.so.0", "libopenslide.so"]
    }
}

/// Load the OpenSlide shared library.
///
/// # Errors
///
/// Returns [`LoadError::LibraryNotFound`] listing every attempted
/// candidate if none can be loaded.
pub fn load() -> Result<Library, LoadError> {
    let mut attempts = Vec::new();

    if let Ok(path) = std::env::var(PATH_ENV_VAR) {
        debug!("loading OpenSlide from {}={}", PATH_ENV_VAR, path);
        // SAFETY: loading a shared library runs its initializers; the
        // operator pointed us at this file explicitly.
        match unsafe { Library::new(&path) } {
            Ok(library) => return Ok(library),
            Err(e) => attempts.push(format!("{}: {}", path, e)),
        }
    }

    for name in candidate_names() {
        debug!("probing for OpenSlide shared library: {}", name);
        // SAFETY: as above; these are the well-known OpenSlide sonames.
        match unsafe { Library::new(name) } {
            Ok(library) => return Ok(library),
            Err(e) => attempts.push(format!("{}: {}", name, e)),
        }
    }

    Err(LoadError::LibraryNotFound(attempts.join("; ")))
}
