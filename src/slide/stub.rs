//! Test doubles for the native binding table.
//!
//! The binding table is a plain struct of C function pointers, so tests
//! swap in Rust `extern "C"` stubs that simulate OpenSlide's observable
//! behavior: handle allocation, per-handle error state, NUL-terminated
//! name arrays, and pixel fills. Stub state is process-global; tests that
//! touch it serialize through [`serial`], which also resets the state.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::path::Path;
use std::ptr;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::library::OpenSlideApi;

use super::handle::Slide;

// =============================================================================
// Shared state
// =============================================================================

struct StubState {
    error: Option<CString>,
    fill_pixel: u32,
    close_calls: usize,
    native_calls: usize,
}

static STATE: Mutex<StubState> = Mutex::new(StubState {
    error: None,
    fill_pixel: 0xFF00_0000,
    close_calls: 0,
    native_calls: 0,
});

static TEST_LOCK: Mutex<()> = Mutex::new(());

fn state() -> MutexGuard<'static, StubState> {
    STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Every handle-taking stub bumps this counter, so tests can assert that a
/// rejected call never reached the "native" layer. The error accessor and
/// close do not count: they are part of the wrapper's own policies.
fn bump() {
    state().native_calls += 1;
}

/// Serialize a stub-using test and reset the stub state.
pub(crate) fn serial() -> MutexGuard<'static, ()> {
    let guard = TEST_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut s = state();
    s.error = None;
    s.fill_pixel = 0xFF00_0000;
    s.close_calls = 0;
    s.native_calls = 0;
    drop(s);
    guard
}

pub(crate) fn set_error(message: Option<&str>) {
    state().error = message.map(|m| CString::new(m).expect("stub error message"));
}

pub(crate) fn set_fill_pixel(pixel: u32) {
    state().fill_pixel = pixel;
}

pub(crate) fn close_calls() -> usize {
    state().close_calls
}

pub(crate) fn native_calls() -> usize {
    state().native_calls
}

/// The stub binding table.
pub(crate) fn api() -> &'static OpenSlideApi {
    static API: OnceLock<OpenSlideApi> = OnceLock::new();
    API.get_or_init(|| OpenSlideApi {
        get_version,
        can_open,
        open,
        close,
        get_level_count,
        get_level_dimensions,
        get_level_downsample,
        get_best_level_for_downsample,
        read_region,
        get_error,
        get_property_names,
        get_property_value,
        get_associated_image_names,
        get_associated_image_dimensions,
        read_associated_image,
    })
}

/// Open a slide against the stub table.
pub(crate) fn open_slide(path: &str) -> Slide {
    Slide::open_with(api(), Path::new(path)).expect("stub open")
}

// =============================================================================
// Stub entry points
// =============================================================================

unsafe extern "C" fn get_version() -> *const c_char {
    b"3.4.1\0".as_ptr() as *const c_char
}

unsafe extern "C" fn can_open(_path: *const c_char) -> bool {
    true
}

unsafe extern "C" fn open(path: *const c_char) -> *mut c_void {
    if CStr::from_ptr(path).to_string_lossy().contains("unreadable") {
        ptr::null_mut()
    } else {
        // Any non-null value works; no stub ever dereferences the handle.
        1 as *mut c_void
    }
}

unsafe extern "C" fn close(_handle: *mut c_void) {
    state().close_calls += 1;
}

unsafe extern "C" fn get_level_count(_handle: *mut c_void) -> i32 {
    bump();
    3
}

unsafe extern "C" fn get_level_dimensions(
    _handle: *mut c_void,
    level: i32,
    width: *mut i64,
    height: *mut i64,
) {
    bump();
    *width = 4096 >> level;
    *height = 2048 >> level;
}

unsafe extern "C" fn get_level_downsample(_handle: *mut c_void, level: i32) -> f64 {
    bump();
    f64::from(1 << level)
}

unsafe extern "C" fn get_best_level_for_downsample(_handle: *mut c_void, downsample: f64) -> i32 {
    bump();
    if downsample >= 4.0 {
        2
    } else if downsample >= 2.0 {
        1
    } else {
        0
    }
}

unsafe extern "C" fn read_region(
    _handle: *mut c_void,
    buf: *mut u32,
    _x: i64,
    _y: i64,
    _level: i32,
    width: i64,
    height: i64,
) {
    bump();
    let fill = state().fill_pixel;
    for i in 0..(width * height) as usize {
        *buf.add(i) = fill;
    }
}

unsafe extern "C" fn get_error(_handle: *mut c_void) -> *const c_char {
    match &state().error {
        Some(message) => message.as_ptr(),
        None => ptr::null(),
    }
}

struct NameArray<const N: usize>([*const c_char; N]);

// The pointers reference static byte strings; sharing them is fine.
unsafe impl<const N: usize> Sync for NameArray<N> {}

static PROPERTY_NAMES: NameArray<3> = NameArray([
    b"openslide.vendor\0".as_ptr() as *const c_char,
    b"openslide.mpp-x\0".as_ptr() as *const c_char,
    ptr::null(),
]);

static ASSOCIATED_NAMES: NameArray<3> = NameArray([
    b"thumbnail\0".as_ptr() as *const c_char,
    b"label\0".as_ptr() as *const c_char,
    ptr::null(),
]);

unsafe extern "C" fn get_property_names(_handle: *mut c_void) -> *const *const c_char {
    bump();
    PROPERTY_NAMES.0.as_ptr()
}

unsafe extern "C" fn get_property_value(
    _handle: *mut c_void,
    name: *const c_char,
) -> *const c_char {
    bump();
    if CStr::from_ptr(name).to_bytes() == b"openslide.vendor" {
        b"stub\0".as_ptr() as *const c_char
    } else {
        ptr::null()
    }
}

unsafe extern "C" fn get_associated_image_names(_handle: *mut c_void) -> *const *const c_char {
    bump();
    ASSOCIATED_NAMES.0.as_ptr()
}

unsafe extern "C" fn get_associated_image_dimensions(
    _handle: *mut c_void,
    _name: *const c_char,
    width: *mut i64,
    height: *mut i64,
) {
    bump();
    *width = 3;
    *height = 2;
}

unsafe extern "C" fn read_associated_image(
    _handle: *mut c_void,
    _name: *const c_char,
    buf: *mut u32,
) {
    bump();
    let fill = state().fill_pixel;
    for i in 0..6 {
        *buf.add(i) = fill;
    }
}
