//! Marshaled collections: text sequences, integer sequences and
//! value-to-size maps with their external iterators.

use std::ffi::{CString, c_char};
use std::ptr;
use std::sync::Arc;

use concord::{IntVector, StrVector, ValueSizeIter, ValueSizeMap};

use crate::retval::{into_c_string, release, run_infallible, size_to_i64, str_arg, to_c_string};

/// A sequence of strings. Elements stay valid until the vector is freed.
pub struct StrVectorHandle {
    items: Vec<CString>,
}

impl StrVectorHandle {
    pub(crate) fn new(v: StrVector) -> StrVectorHandle {
        StrVectorHandle {
            items: v.iter().map(to_c_string).collect(),
        }
    }

    pub(crate) fn into_raw(self) -> *mut StrVectorHandle {
        Box::into_raw(Box::new(self))
    }
}

pub struct IntVectorHandle {
    items: IntVector,
}

impl IntVectorHandle {
    pub(crate) fn new(items: IntVector) -> IntVectorHandle {
        IntVectorHandle { items }
    }

    pub(crate) fn into_raw(self) -> *mut IntVectorHandle {
        Box::into_raw(Box::new(self))
    }
}

/// A value-to-size map, shared with any iterators created from it.
pub struct ValueSizeMapHandle {
    map: Arc<ValueSizeMap>,
}

impl ValueSizeMapHandle {
    pub(crate) fn new(map: Arc<ValueSizeMap>) -> ValueSizeMapHandle {
        ValueSizeMapHandle { map }
    }

    pub(crate) fn into_raw(self) -> *mut ValueSizeMapHandle {
        Box::into_raw(Box::new(self))
    }
}

/// An independent traversal of a [`ValueSizeMapHandle`]. It holds its own
/// reference to the map, so the map handle may be freed first.
pub struct ValueSizeIterHandle {
    iter: ValueSizeIter,
}

/// One map entry. `key` is NULL once the iterator is exhausted; otherwise it
/// is owned by the caller and freed with `concord_free_string`.
#[repr(C)]
pub struct ValueSizeEntry {
    pub key: *mut c_char,
    pub value: i64,
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_str_vector_size(v: *const StrVectorHandle) -> i64 {
    run_infallible("str_vector_size", -1, || {
        unsafe { v.as_ref() }.map_or(-1, |v| v.items.len() as i64)
    })
}

/// Element `i`, or NULL when out of bounds. The string is owned by the vector.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_str_vector_get(v: *const StrVectorHandle, i: i64) -> *const c_char {
    run_infallible("str_vector_get", ptr::null(), || {
        let Some(v) = (unsafe { v.as_ref() }) else {
            return ptr::null();
        };
        usize::try_from(i)
            .ok()
            .and_then(|i| v.items.get(i))
            .map_or(ptr::null(), |s| s.as_ptr())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_str_vector_free(v: *mut StrVectorHandle) {
    run_infallible("str_vector_free", (), || unsafe { release(v) })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_int_vector_size(v: *const IntVectorHandle) -> i64 {
    run_infallible("int_vector_size", -1, || {
        unsafe { v.as_ref() }.map_or(-1, |v| v.items.len() as i64)
    })
}

/// Element `i`, or -1 when out of bounds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_int_vector_get(v: *const IntVectorHandle, i: i64) -> i64 {
    run_infallible("int_vector_get", -1, || {
        let Some(v) = (unsafe { v.as_ref() }) else {
            return -1;
        };
        usize::try_from(i)
            .ok()
            .and_then(|i| v.items.get(i))
            .map_or(-1, size_to_i64)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_int_vector_free(v: *mut IntVectorHandle) {
    run_infallible("int_vector_free", (), || unsafe { release(v) })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_map_size(m: *const ValueSizeMapHandle) -> i64 {
    run_infallible("value_size_map_size", -1, || {
        unsafe { m.as_ref() }.map_or(-1, |m| m.map.len() as i64)
    })
}

/// Size recorded for `key`, or -1 when the key is absent.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_map_get(
    m: *const ValueSizeMapHandle,
    key: *const c_char,
) -> i64 {
    run_infallible("value_size_map_get", -1, || {
        let Some(m) = (unsafe { m.as_ref() }) else {
            return -1;
        };
        match unsafe { str_arg(key, "key") } {
            Ok(key) => m.map.get(key).map_or(-1, size_to_i64),
            Err(_) => -1,
        }
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_map_free(m: *mut ValueSizeMapHandle) {
    run_infallible("value_size_map_free", (), || unsafe { release(m) })
}

/// Starts a new traversal; returns NULL for a NULL map.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_iter_new(
    m: *const ValueSizeMapHandle,
) -> *mut ValueSizeIterHandle {
    run_infallible("value_size_iter_new", ptr::null_mut(), || {
        let Some(m) = (unsafe { m.as_ref() }) else {
            return ptr::null_mut();
        };
        Box::into_raw(Box::new(ValueSizeIterHandle {
            iter: ValueSizeIter::new(Arc::clone(&m.map)),
        }))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_iter_has_next(it: *const ValueSizeIterHandle) -> bool {
    run_infallible("value_size_iter_has_next", false, || {
        unsafe { it.as_ref() }.is_some_and(|it| it.iter.has_next())
    })
}

/// Returns the entry under the iterator and advances. Past the end the key
/// is NULL and the value 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_iter_next(it: *mut ValueSizeIterHandle) -> ValueSizeEntry {
    let end = || ValueSizeEntry {
        key: ptr::null_mut(),
        value: 0,
    };
    run_infallible("value_size_iter_next", end(), || {
        match unsafe { it.as_mut() }.and_then(|it| it.iter.next()) {
            Some((key, value)) => ValueSizeEntry {
                key: into_c_string(key),
                value: size_to_i64(value),
            },
            None => end(),
        }
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_value_size_iter_free(it: *mut ValueSizeIterHandle) {
    run_infallible("value_size_iter_free", (), || unsafe { release(it) })
}
