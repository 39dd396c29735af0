//! C ABI of the concord boundary layer.
//!
//! Every engine object crosses the boundary as a pointer to an opaque handle
//! type ([`CorpusHandle`], [`ConcHandle`], [`CollsHandle`], ...). Each handle
//! type has exactly one release function, and a handle is never released
//! implicitly by another call: freeing a corpus does not free the result sets
//! created from it, and those stay usable.
//!
//! Calls that can fail return a `#[repr(C)]` struct carrying the payload
//! together with `err` and `err_code`. On success `err` is NULL and
//! `err_code` is 0; on failure every handle field is NULL, `err` holds an
//! owned message (release it with [`concord_free_string`]) and `err_code`
//! one of the [`ErrorCode`](concord_common::ErrorCode) values. Panics never
//! unwind into the caller; they are reported as generic errors.
//!
//! # Safety
//!
//! Handle arguments must be NULL or live handles of the declared type
//! obtained from this library. String arguments must be NULL or valid
//! NUL-terminated UTF-8. A handle must not be used concurrently from several
//! threads; distinct result sets over one corpus may be.

#![allow(clippy::missing_safety_doc)]

mod collections;
mod conc;
mod corpus;
mod kwic;
mod retval;

use std::ffi::{CString, c_char};

pub use collections::{
    IntVectorHandle, StrVectorHandle, ValueSizeEntry, ValueSizeIterHandle, ValueSizeMapHandle,
    concord_int_vector_free, concord_int_vector_get, concord_int_vector_size,
    concord_str_vector_free, concord_str_vector_get, concord_str_vector_size,
    concord_value_size_iter_free, concord_value_size_iter_has_next, concord_value_size_iter_new,
    concord_value_size_iter_next, concord_value_size_map_free, concord_value_size_map_get,
    concord_value_size_map_size,
};
pub use conc::{
    CollItemRetval, CollsHandle, CollsRetval, ConcHandle, ConcRetval, FreqsRetval,
    concord_add_coll_filter, concord_colls_free, concord_colls_has_next, concord_colls_next,
    concord_collocations, concord_conc_free, concord_concordance_arf, concord_concordance_shuffle,
    concord_concordance_size, concord_create_concordance, concord_freq_dist,
    concord_negate_coll_filter, concord_remove_coll_filter,
};
pub use corpus::{
    CorpusHandle, CorpusRetval, SizeRetval, StringRetval, SubcorpusHandle, SubcorpusRetval,
    ValueSizesRetval, concord_attr_value_sizes, concord_close_corpus, concord_corpus_attributes,
    concord_corpus_conf, concord_corpus_size, concord_corpus_structures, concord_open_corpus,
    concord_open_subcorpus, concord_posattr_size, concord_struct_size, concord_subcorpus_free,
};
pub use kwic::{
    KwicPageHandle, KwicRetval, concord_conc_examples, concord_kwic_page_conc_size,
    concord_kwic_page_free, concord_kwic_page_get, concord_kwic_page_size,
};

/// Releases a string returned by this library; NULL is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_free_string(s: *mut c_char) {
    retval::run_infallible("free_string", (), || {
        if !s.is_null() {
            drop(unsafe { CString::from_raw(s) });
        }
    })
}
