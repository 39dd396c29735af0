//! Corpus and sub-corpus handles.

use std::ffi::{c_char, c_int};
use std::ptr;
use std::sync::Arc;

use concord::{Corpus, Subcorpus};

use crate::collections::{StrVectorHandle, ValueSizeMapHandle};
use crate::retval::{
    Retval, handle_ref, into_c_string, release, run, run_infallible, size_to_i64, str_arg,
};

pub struct CorpusHandle {
    pub(crate) corpus: Corpus,
}

pub struct SubcorpusHandle {
    pub(crate) subcorpus: Arc<Subcorpus>,
}

#[repr(C)]
pub struct CorpusRetval {
    pub value: *mut CorpusHandle,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for CorpusRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        CorpusRetval {
            value: ptr::null_mut(),
            err,
            err_code,
        }
    }
}

#[repr(C)]
pub struct SubcorpusRetval {
    pub value: *mut SubcorpusHandle,
    /// Number of tokens the sub-corpus covers.
    pub size: i64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for SubcorpusRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        SubcorpusRetval {
            value: ptr::null_mut(),
            size: 0,
            err,
            err_code,
        }
    }
}

#[repr(C)]
pub struct SizeRetval {
    pub value: i64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl SizeRetval {
    pub(crate) fn ok(value: u64) -> SizeRetval {
        SizeRetval {
            value: size_to_i64(value),
            err: ptr::null_mut(),
            err_code: 0,
        }
    }
}

impl Retval for SizeRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        SizeRetval {
            value: 0,
            err,
            err_code,
        }
    }
}

/// `value` is owned by the caller and freed with `concord_free_string`.
#[repr(C)]
pub struct StringRetval {
    pub value: *mut c_char,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for StringRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        StringRetval {
            value: ptr::null_mut(),
            err,
            err_code,
        }
    }
}

#[repr(C)]
pub struct ValueSizesRetval {
    pub value: *mut ValueSizeMapHandle,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for ValueSizesRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        ValueSizesRetval {
            value: ptr::null_mut(),
            err,
            err_code,
        }
    }
}

/// Opens the corpus whose registry file is at `path`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_open_corpus(path: *const c_char) -> CorpusRetval {
    run("open_corpus", || {
        let path = unsafe { str_arg(path, "path") }?;
        let corpus = Corpus::open(path)?;
        Ok(CorpusRetval {
            value: Box::into_raw(Box::new(CorpusHandle { corpus })),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

/// Releases the handle. Result sets created from it stay usable until they
/// are freed themselves.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_close_corpus(corpus: *mut CorpusHandle) {
    run_infallible("close_corpus", (), || unsafe { release(corpus) })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_corpus_size(corpus: *const CorpusHandle) -> SizeRetval {
    run("corpus_size", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        Ok(SizeRetval::ok(h.corpus.size()))
    })
}

/// Registry configuration value, e.g. `INFO` or `ATTRLIST`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_corpus_conf(
    corpus: *const CorpusHandle,
    prop: *const c_char,
) -> StringRetval {
    run("corpus_conf", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let prop = unsafe { str_arg(prop, "prop") }?;
        Ok(StringRetval {
            value: into_c_string(h.corpus.conf(prop)?),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

/// Number of distinct values of a positional attribute.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_posattr_size(
    corpus: *const CorpusHandle,
    name: *const c_char,
) -> SizeRetval {
    run("posattr_size", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let name = unsafe { str_arg(name, "name") }?;
        Ok(SizeRetval::ok(h.corpus.posattr_size(name)?))
    })
}

/// Number of instances of a structure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_struct_size(
    corpus: *const CorpusHandle,
    name: *const c_char,
) -> SizeRetval {
    run("struct_size", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let name = unsafe { str_arg(name, "name") }?;
        Ok(SizeRetval::ok(h.corpus.struct_size(name)?))
    })
}

/// Names of the positional attributes; NULL for a NULL corpus.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_corpus_attributes(
    corpus: *const CorpusHandle,
) -> *mut StrVectorHandle {
    run_infallible("corpus_attributes", ptr::null_mut(), || {
        match unsafe { corpus.as_ref() } {
            Some(h) => StrVectorHandle::new(h.corpus.attributes()).into_raw(),
            None => ptr::null_mut(),
        }
    })
}

/// Names of the structures; NULL for a NULL corpus.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_corpus_structures(
    corpus: *const CorpusHandle,
) -> *mut StrVectorHandle {
    run_infallible("corpus_structures", ptr::null_mut(), || {
        match unsafe { corpus.as_ref() } {
            Some(h) => StrVectorHandle::new(h.corpus.structures()).into_raw(),
            None => ptr::null_mut(),
        }
    })
}

/// Total size of the instances of `structure` per value of `attr`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_attr_value_sizes(
    corpus: *const CorpusHandle,
    structure: *const c_char,
    attr: *const c_char,
) -> ValueSizesRetval {
    run("attr_value_sizes", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let structure = unsafe { str_arg(structure, "structure") }?;
        let attr = unsafe { str_arg(attr, "attr") }?;
        let map = h.corpus.attr_value_sizes(structure, attr)?;
        Ok(ValueSizesRetval {
            value: ValueSizeMapHandle::new(map).into_raw(),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

/// Reads a sub-corpus file and checks it against `corpus`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_open_subcorpus(
    corpus: *const CorpusHandle,
    path: *const c_char,
) -> SubcorpusRetval {
    run("open_subcorpus", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let path = unsafe { str_arg(path, "path") }?;
        let subcorpus = Subcorpus::open(path)?;
        subcorpus.check_bounds(h.corpus.size())?;
        Ok(SubcorpusRetval {
            size: size_to_i64(subcorpus.search_size()),
            value: Box::into_raw(Box::new(SubcorpusHandle {
                subcorpus: Arc::new(subcorpus),
            })),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_subcorpus_free(subcorpus: *mut SubcorpusHandle) {
    run_infallible("subcorpus_free", (), || unsafe { release(subcorpus) })
}
