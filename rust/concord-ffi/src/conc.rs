//! Result sets and the statistics derived from them.

use std::ffi::{c_char, c_int};
use std::ptr;
use std::sync::Arc;

use concord::colls::CollMeasure;
use concord::freqs::freq_dist;
use concord::{CollocItems, Concordance};
use concord_common::Error;

use crate::collections::{IntVectorHandle, StrVectorHandle};
use crate::corpus::{CorpusHandle, SizeRetval, SubcorpusHandle};
use crate::retval::{
    Retval, handle_mut, handle_ref, into_c_string, release, run, run_infallible, size_to_i64,
    str_arg,
};

pub struct ConcHandle {
    pub(crate) conc: Concordance,
}

pub struct CollsHandle {
    items: CollocItems,
}

/// A result set with the sizes computed on creation.
#[repr(C)]
pub struct ConcRetval {
    pub value: *mut ConcHandle,
    pub conc_size: i64,
    pub corpus_size: i64,
    pub search_size: i64,
    pub arf: f64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for ConcRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        ConcRetval {
            value: ptr::null_mut(),
            conc_size: 0,
            corpus_size: 0,
            search_size: 0,
            arf: 0.0,
            err,
            err_code,
        }
    }
}

/// Three parallel sequences: values, their counts and their norms.
#[repr(C)]
pub struct FreqsRetval {
    pub words: *mut StrVectorHandle,
    pub freqs: *mut IntVectorHandle,
    pub norms: *mut IntVectorHandle,
    pub conc_size: i64,
    pub corpus_size: i64,
    pub search_size: i64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for FreqsRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        FreqsRetval {
            words: ptr::null_mut(),
            freqs: ptr::null_mut(),
            norms: ptr::null_mut(),
            conc_size: 0,
            corpus_size: 0,
            search_size: 0,
            err,
            err_code,
        }
    }
}

#[repr(C)]
pub struct CollsRetval {
    pub value: *mut CollsHandle,
    pub conc_size: i64,
    pub corpus_size: i64,
    pub search_size: i64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for CollsRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        CollsRetval {
            value: ptr::null_mut(),
            conc_size: 0,
            corpus_size: 0,
            search_size: 0,
            err,
            err_code,
        }
    }
}

/// One collocate. `word` is owned by the caller; it is NULL when the cursor
/// was already exhausted.
#[repr(C)]
pub struct CollItemRetval {
    pub word: *mut c_char,
    pub score: f64,
    pub freq: i64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for CollItemRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        CollItemRetval {
            word: ptr::null_mut(),
            score: 0.0,
            freq: 0,
            err,
            err_code,
        }
    }
}

fn measure_arg(code: c_char, name: &str) -> concord_common::Result<CollMeasure> {
    let code = u8::try_from(code)
        .map(char::from)
        .map_err(|_| Error::invalid_arg(name, format!("invalid measure code {code}")))?;
    CollMeasure::from_code(code)
}

/// Evaluates `query` over `corpus`, restricted to `subcorpus` unless it is
/// NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_create_concordance(
    corpus: *const CorpusHandle,
    query: *const c_char,
    subcorpus: *const SubcorpusHandle,
) -> ConcRetval {
    run("create_concordance", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let query = unsafe { str_arg(query, "query") }?;
        let subcorpus = unsafe { subcorpus.as_ref() }.map(|s| Arc::clone(&s.subcorpus));
        let conc = Concordance::new(&h.corpus, query, subcorpus)?;
        let size = conc.conc_size();
        Ok(ConcRetval {
            value: Box::into_raw(Box::new(ConcHandle { conc })),
            conc_size: size_to_i64(size.conc_size),
            corpus_size: size_to_i64(size.corpus_size),
            search_size: size_to_i64(size.search_size),
            arf: size.arf,
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

/// Number of visible hits, or -1 for a NULL handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_concordance_size(conc: *const ConcHandle) -> i64 {
    run_infallible("concordance_size", -1, || {
        unsafe { conc.as_ref() }.map_or(-1, |h| size_to_i64(h.conc.size()))
    })
}

/// Average reduced frequency of the visible hits, or -1 for a NULL handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_concordance_arf(conc: *const ConcHandle) -> f64 {
    run_infallible("concordance_arf", -1.0, || {
        unsafe { conc.as_ref() }.map_or(-1.0, |h| h.conc.arf())
    })
}

/// Randomizes hit order. With `seeded` the order is reproducible from
/// `seed`; otherwise a fresh seed is drawn. Returns the seed used.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_concordance_shuffle(
    conc: *mut ConcHandle,
    seed: u64,
    seeded: bool,
) -> u64 {
    run_infallible("concordance_shuffle", 0, || match unsafe { conc.as_mut() } {
        Some(h) => h.conc.shuffle(seeded.then_some(seed)),
        None => 0,
    })
}

/// Adds a collocation filter; the returned value is its 1-based number.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_add_coll_filter(
    conc: *mut ConcHandle,
    query: *const c_char,
    lctx: i64,
    rctx: i64,
    positive: bool,
) -> SizeRetval {
    run("add_coll_filter", || {
        let h = unsafe { handle_mut(conc, "conc") }?;
        let query = unsafe { str_arg(query, "query") }?;
        let number = h.conc.add_coll_filter(query, lctx, rctx, positive)?;
        Ok(SizeRetval::ok(number as u64))
    })
}

/// Flips filter `number` between positive and negative; returns the new
/// result set size.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_negate_coll_filter(conc: *mut ConcHandle, number: i64) -> SizeRetval {
    run("negate_coll_filter", || {
        let h = unsafe { handle_mut(conc, "conc") }?;
        let number = filter_number(number)?;
        h.conc.negate_coll_filter(number)?;
        Ok(SizeRetval::ok(h.conc.size()))
    })
}

/// Drops filter `number`; returns the new result set size.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_remove_coll_filter(conc: *mut ConcHandle, number: i64) -> SizeRetval {
    run("remove_coll_filter", || {
        let h = unsafe { handle_mut(conc, "conc") }?;
        let number = filter_number(number)?;
        h.conc.remove_coll_filter(number)?;
        Ok(SizeRetval::ok(h.conc.size()))
    })
}

fn filter_number(number: i64) -> concord_common::Result<usize> {
    usize::try_from(number)
        .map_err(|_| Error::not_found("collocation filter", number.to_string()))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_conc_free(conc: *mut ConcHandle) {
    run_infallible("conc_free", (), || unsafe { release(conc) })
}

/// Frequency distribution of the result set by criterion `fcrit`, keeping
/// values with at least `flimit` hits.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_freq_dist(
    conc: *const ConcHandle,
    fcrit: *const c_char,
    flimit: i64,
) -> FreqsRetval {
    run("freq_dist", || {
        let h = unsafe { handle_ref(conc, "conc") }?;
        let fcrit = unsafe { str_arg(fcrit, "fcrit") }?;
        let freqs = freq_dist(&h.conc, fcrit, flimit.max(0) as u64)?;
        let (conc_size, corpus_size, search_size) =
            (freqs.conc_size, freqs.corpus_size, freqs.search_size);
        let (words, counts, norms) = freqs.into_vectors();
        Ok(FreqsRetval {
            words: StrVectorHandle::new(words).into_raw(),
            freqs: IntVectorHandle::new(counts).into_raw(),
            norms: IntVectorHandle::new(norms).into_raw(),
            conc_size: size_to_i64(conc_size),
            corpus_size: size_to_i64(corpus_size),
            search_size: size_to_i64(search_size),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

/// Ranks collocates of `attr` in the window `from_w..=to_w` by the measure
/// with code `sort_code`, keeping at most `max_items`. Read the items with
/// `concord_colls_next`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn concord_collocations(
    conc: *const ConcHandle,
    attr: *const c_char,
    sort_code: c_char,
    min_freq: i64,
    min_bgr: i64,
    from_w: i64,
    to_w: i64,
    max_items: i64,
) -> CollsRetval {
    run("collocations", || {
        let h = unsafe { handle_ref(conc, "conc") }?;
        let attr = unsafe { str_arg(attr, "attr") }?;
        let sort = measure_arg(sort_code, "sort_code")?;
        let items = CollocItems::new(
            &h.conc,
            attr,
            sort,
            min_freq.max(0) as u64,
            min_bgr.max(0) as u64,
            from_w,
            to_w,
            max_items.max(0) as usize,
        )?;
        Ok(CollsRetval {
            value: Box::into_raw(Box::new(CollsHandle { items })),
            conc_size: size_to_i64(h.conc.size()),
            corpus_size: size_to_i64(h.conc.corpus_size()),
            search_size: size_to_i64(h.conc.search_size()),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_colls_has_next(colls: *const CollsHandle) -> bool {
    run_infallible("colls_has_next", false, || {
        unsafe { colls.as_ref() }.is_some_and(|h| h.items.has_next())
    })
}

/// Returns the collocate under the cursor, scored by the measure with code
/// `measure_code`, and advances.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_colls_next(
    colls: *mut CollsHandle,
    measure_code: c_char,
) -> CollItemRetval {
    run("colls_next", || {
        let h = unsafe { handle_mut(colls, "colls") }?;
        let measure = measure_arg(measure_code, "measure_code")?;
        Ok(match h.items.next_item(measure) {
            Some(item) => CollItemRetval {
                word: into_c_string(&item.word),
                score: item.score,
                freq: size_to_i64(item.freq),
                err: ptr::null_mut(),
                err_code: 0,
            },
            None => CollItemRetval {
                word: ptr::null_mut(),
                score: 0.0,
                freq: 0,
                err: ptr::null_mut(),
                err_code: 0,
            },
        })
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_colls_free(colls: *mut CollsHandle) {
    run_infallible("colls_free", (), || unsafe { release(colls) })
}
