use thiserror::Error;

/// Errors locating and binding the native OpenSlide library.
///
/// These occur at most once per process: the library is loaded lazily on
/// first use and the outcome (success or failure) is cached for the process
/// lifetime.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// No candidate shared library could be loaded
    #[error("could not load the OpenSlide library ({0})")]
    LibraryNotFound(String),

    /// A required symbol is absent from the loaded library, meaning it
    /// predates the minimum supported release
    #[error("OpenSlide >= 3.3.0 required (symbol `{0}` not found)")]
    MissingSymbol(&'static str),
}

/// Errors produced by slide operations.
///
/// Native failures (`Load`, `OpenFailed`, `Native`) originate in or around
/// the OpenSlide library and are surfaced without masking or retry. The
/// remaining variants are local validation errors raised before any call
/// crosses the FFI boundary.
#[derive(Debug, Clone, Error)]
pub enum OpenSlideError {
    /// The library failed to load or bind
    #[error("{0}")]
    Load(#[from] LoadError),

    /// OpenSlide could not open the file
    ///
    /// `openslide_open` reports failure through its return value alone,
    /// without setting per-handle error state, so no library message is
    /// available here.
    #[error("could not open image file: {path}")]
    OpenFailed { path: String },

    /// Error message reported by the library's per-handle error state
    #[error("{0}")]
    Native(String),

    /// Operation attempted on a handle that has already been closed
    #[error("slide handle has been closed")]
    ClosedHandle,

    /// Negative region dimensions requested
    #[error("negative width ({width}) or negative height ({height}) not allowed")]
    NegativeDimensions { width: i64, height: i64 },

    /// Requested region does not fit pixel-buffer arithmetic
    #[error("requested region too large: {width}x{height} pixels")]
    RegionTooLarge { width: i64, height: i64 },

    /// A string argument cannot be passed across the C boundary
    #[error("string argument contains an interior NUL byte: {0:?}")]
    InvalidString(String),

    /// Pixel buffer length does not match the stated dimensions
    #[error("pixel buffer size mismatch: expected {expected} pixels, got {actual}")]
    PixelBufferSize { expected: u64, actual: u64 },
}
