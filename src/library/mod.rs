//! Process-wide OpenSlide library state.
//!
//! The shared library is located, loaded, and its symbols resolved exactly
//! once per process, on first use. The outcome is cached either way: a
//! load failure is returned to every subsequent caller rather than
//! retried, and a loaded library stays mapped until the process exits so
//! the resolved function pointers in the binding table remain valid
//! forever.

mod api;
mod loader;

pub use loader::{candidate_names, PATH_ENV_VAR};

pub(crate) use api::OpenSlideApi;

use std::ffi::CStr;
use std::sync::OnceLock;

use libloading::Library;
use tracing::info;

use crate::error::OpenSlideError;

/// The loaded library plus its resolved binding table.
///
/// `_library` is never read again after resolution; it exists to keep the
/// shared object mapped while the fn pointers in `api` are in use.
struct LoadedLibrary {
    api: OpenSlideApi,
    _library: Library,
}

static LIBRARY: OnceLock<Result<LoadedLibrary, OpenSlideError>> = OnceLock::new();

/// Get the resolved binding table, loading the library on first use.
///
/// # Errors
///
/// Returns the cached [`crate::error::LoadError`] (wrapped in
/// [`OpenSlideError::Load`]) if the one-time initialization failed.
pub(crate) fn library() -> Result<&'static OpenSlideApi, OpenSlideError> {
    let loaded = LIBRARY.get_or_init(|| {
        let library = loader::load()?;
        let api = OpenSlideApi::resolve(&library)?;
        info!("loaded OpenSlide {}", raw_version(&api));
        Ok(LoadedLibrary {
            api,
            _library: library,
        })
    });

    match loaded {
        Ok(loaded) => Ok(&loaded.api),
        Err(e) => Err(e.clone()),
    }
}

/// Version string reported by the loaded OpenSlide library.
///
/// Loads the library on first use.
pub fn version() -> Result<String, OpenSlideError> {
    Ok(raw_version(library()?))
}

fn raw_version(api: &OpenSlideApi) -> String {
    // SAFETY: `get_version` takes no arguments and returns a pointer to a
    // static string owned by the library, or null.
    let ptr = unsafe { (api.get_version)() };
    if ptr.is_null() {
        return "unknown".to_string();
    }
    // SAFETY: non-null pointers from `openslide_get_version` are
    // NUL-terminated strings with static lifetime.
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}
