//! KWIC pages.

use std::ffi::{CString, c_char, c_int};
use std::ptr;
use std::sync::Arc;

use concord::kwic::{CollQuery, KwicArgs, conc_examples};
use concord::{ConcordConfig, KwicPage};
use concord_common::Error;

use crate::corpus::{CorpusHandle, SubcorpusHandle};
use crate::retval::{
    Retval, handle_ref, list_arg, opt_str_arg, release, run, run_infallible, size_to_i64,
    str_arg, to_c_string,
};

/// Rendered lines of one page. Lines stay valid until the page is freed.
pub struct KwicPageHandle {
    lines: Vec<CString>,
    conc_size: u64,
}

impl KwicPageHandle {
    fn new(page: KwicPage) -> KwicPageHandle {
        KwicPageHandle {
            lines: page.lines.iter().map(|l| to_c_string(l)).collect(),
            conc_size: page.conc_size,
        }
    }
}

/// A page of lines. `err_code` is 2 when `from_line` lies beyond the result
/// set.
#[repr(C)]
pub struct KwicRetval {
    pub value: *mut KwicPageHandle,
    pub conc_size: i64,
    pub err: *mut c_char,
    pub err_code: c_int,
}

impl Retval for KwicRetval {
    fn failure(err: *mut c_char, err_code: c_int) -> Self {
        KwicRetval {
            value: ptr::null_mut(),
            conc_size: 0,
            err,
            err_code,
        }
    }
}

/// Evaluates `query`, shuffles the hits and renders lines
/// `from_line..from_line + limit`, padded with empty lines up to `limit`.
///
/// `attrs`, `structs` and `refs` are comma-separated lists; `refs` items
/// are `struct.attr` or `#`. `view_context_struct` may be NULL. Only
/// `query` is mandatory.
///
/// A non-NULL `coll_query` keeps only hits with a match of it inside
/// `[start + coll_lctx, end - 1 + coll_rctx]`; the matched tokens are marked
/// in the rendered lines. `limit` above the configured page size bound, or
/// negative, is an invalid argument (code 4).
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn concord_conc_examples(
    corpus: *const CorpusHandle,
    subcorpus: *const SubcorpusHandle,
    query: *const c_char,
    attrs: *const c_char,
    structs: *const c_char,
    refs: *const c_char,
    ref_separator: *const c_char,
    from_line: i64,
    limit: i64,
    max_context: i64,
    view_context_struct: *const c_char,
    coll_query: *const c_char,
    coll_lctx: i64,
    coll_rctx: i64,
) -> KwicRetval {
    run("conc_examples", || {
        let h = unsafe { handle_ref(corpus, "corpus") }?;
        let subcorpus = unsafe { subcorpus.as_ref() }.map(|s| Arc::clone(&s.subcorpus));
        let mut args = KwicArgs::new(unsafe { str_arg(query, "query") }?, &ConcordConfig::default());
        args.attrs = unsafe { list_arg(attrs, "attrs") }?;
        args.structs = unsafe { list_arg(structs, "structs") }?;
        args.refs = unsafe { list_arg(refs, "refs") }?;
        if let Some(sep) = unsafe { opt_str_arg(ref_separator, "ref_separator") }? {
            args.ref_separator = sep.to_string();
        }
        args.from_line = from_line.max(0) as u64;
        args.limit = usize::try_from(limit)
            .map_err(|_| Error::invalid_arg("limit", format!("negative page size {limit}")))?;
        args.max_context = max_context.max(0) as usize;
        args.view_context_struct = unsafe { opt_str_arg(view_context_struct, "view_context_struct") }?
            .map(str::to_string);
        args.coll_query = unsafe { opt_str_arg(coll_query, "coll_query") }?.map(|q| CollQuery {
            query: q.to_string(),
            lctx: coll_lctx,
            rctx: coll_rctx,
        });

        let page = conc_examples(&h.corpus, subcorpus, &args)?;
        Ok(KwicRetval {
            conc_size: size_to_i64(page.conc_size),
            value: Box::into_raw(Box::new(KwicPageHandle::new(page))),
            err: ptr::null_mut(),
            err_code: 0,
        })
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_kwic_page_size(page: *const KwicPageHandle) -> i64 {
    run_infallible("kwic_page_size", -1, || {
        unsafe { page.as_ref() }.map_or(-1, |p| p.lines.len() as i64)
    })
}

/// Size of the result set the page was cut from.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_kwic_page_conc_size(page: *const KwicPageHandle) -> i64 {
    run_infallible("kwic_page_conc_size", -1, || {
        unsafe { page.as_ref() }.map_or(-1, |p| size_to_i64(p.conc_size))
    })
}

/// Line `i`, or NULL when out of bounds. Padding lines are empty strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_kwic_page_get(page: *const KwicPageHandle, i: i64) -> *const c_char {
    run_infallible("kwic_page_get", ptr::null(), || {
        let Some(page) = (unsafe { page.as_ref() }) else {
            return ptr::null();
        };
        usize::try_from(i)
            .ok()
            .and_then(|i| page.lines.get(i))
            .map_or(ptr::null(), |l| l.as_ptr())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn concord_kwic_page_free(page: *mut KwicPageHandle) {
    run_infallible("kwic_page_free", (), || unsafe { release(page) })
}
