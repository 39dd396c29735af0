//! Error-as-value plumbing shared by every exported function.

use std::any::Any;
use std::ffi::{CStr, CString, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};

use concord_common::{Error, ErrorCode, Result};

/// A `#[repr(C)]` return struct that can carry a failure.
pub(crate) trait Retval: Sized {
    fn failure(err: *mut c_char, err_code: c_int) -> Self;
}

/// Runs `f`, converting both errors and panics into a failed `R`.
///
/// Nothing partially built by `f` escapes on failure: any handle it created
/// is still owned by Rust and dropped here.
pub(crate) fn run<R: Retval>(op: &'static str, f: impl FnOnce() -> Result<R>) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(r)) => r,
        Ok(Err(e)) => {
            tracing::debug!(op, error = %e, code = e.code().as_i32(), "call failed");
            R::failure(into_c_string(e.to_string()), e.code().as_i32())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(op, panic = %message, "panic at the C boundary");
            R::failure(into_c_string(message), ErrorCode::Generic.as_i32())
        }
    }
}

/// Like [`run`] for calls without an error channel; a panic yields `fallback`.
pub(crate) fn run_infallible<T>(op: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(panic) => {
            tracing::error!(op, panic = %panic_message(panic.as_ref()), "panic at the C boundary");
            fallback
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("internal error: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("internal error: {s}")
    } else {
        "internal error".to_string()
    }
}

/// Converts to an owned C string; interior NUL bytes are dropped.
pub(crate) fn to_c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

/// Hands an owned C string to the caller, who frees it with
/// `concord_free_string`.
pub(crate) fn into_c_string(s: impl AsRef<str>) -> *mut c_char {
    to_c_string(s.as_ref()).into_raw()
}

/// # Safety
///
/// `ptr` must be NULL or point to a NUL-terminated string that stays valid
/// for `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::invalid_arg(name, "null pointer"));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| Error::invalid_arg(name, e.to_string()))
}

/// Optional string argument: NULL and the empty string both mean "absent".
///
/// # Safety
///
/// Same as [`str_arg`].
pub(crate) unsafe fn opt_str_arg<'a>(ptr: *const c_char, name: &str) -> Result<Option<&'a str>> {
    if ptr.is_null() {
        return Ok(None);
    }
    let s = unsafe { str_arg(ptr, name) }?;
    Ok((!s.is_empty()).then_some(s))
}

/// Comma-separated list argument; NULL is an empty list.
///
/// # Safety
///
/// Same as [`str_arg`].
pub(crate) unsafe fn list_arg(ptr: *const c_char, name: &str) -> Result<Vec<String>> {
    Ok(unsafe { opt_str_arg(ptr, name) }?
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

/// # Safety
///
/// `ptr` must be NULL or a live handle of type `T` obtained from this
/// library, not aliased mutably for `'a`.
pub(crate) unsafe fn handle_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T> {
    unsafe { ptr.as_ref() }.ok_or_else(|| Error::invalid_arg(name, "null handle"))
}

/// # Safety
///
/// `ptr` must be NULL or a live handle of type `T` obtained from this
/// library, not aliased for `'a`.
pub(crate) unsafe fn handle_mut<'a, T>(ptr: *mut T, name: &str) -> Result<&'a mut T> {
    unsafe { ptr.as_mut() }.ok_or_else(|| Error::invalid_arg(name, "null handle"))
}

/// Releases a boxed handle; NULL is ignored.
///
/// # Safety
///
/// `ptr` must be NULL or a handle obtained from `Box::into_raw` in this
/// library that has not been released yet.
pub(crate) unsafe fn release<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(ptr) });
    }
}

pub(crate) fn size_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        err: *mut c_char,
        code: c_int,
    }

    impl Retval for Probe {
        fn failure(err: *mut c_char, err_code: c_int) -> Self {
            Probe { err, code: err_code }
        }
    }

    fn take(ptr: *mut c_char) -> String {
        unsafe { CString::from_raw(ptr) }.into_string().unwrap()
    }

    #[test]
    fn test_error_becomes_value() {
        let r: Probe = run("test", || Err(Error::out_of_range(15, 10)));
        assert_eq!(r.code, ErrorCode::OutOfRange.as_i32());
        assert_eq!(
            take(r.err),
            "requested line offset 15 exceeds concordance size 10"
        );
    }

    #[test]
    fn test_panic_becomes_value() {
        let r: Probe = run("test", || -> Result<Probe> { panic!("boom") });
        assert_eq!(r.code, ErrorCode::Generic.as_i32());
        assert_eq!(take(r.err), "internal error: boom");
        assert_eq!(run_infallible("test", 7, || -> i32 { panic!("boom") }), 7);
    }

    #[test]
    fn test_string_args() {
        let s = CString::new("word, lemma,,tag").unwrap();
        assert_eq!(
            unsafe { list_arg(s.as_ptr(), "attrs") }.unwrap(),
            vec!["word", "lemma", "tag"]
        );
        assert!(unsafe { list_arg(std::ptr::null(), "attrs") }.unwrap().is_empty());
        assert!(unsafe { str_arg(std::ptr::null(), "query") }.is_err());
        let empty = CString::new("").unwrap();
        assert_eq!(unsafe { opt_str_arg(empty.as_ptr(), "s") }.unwrap(), None);
        assert_eq!(to_c_string("a\0b").to_str().unwrap(), "ab");
    }
}
