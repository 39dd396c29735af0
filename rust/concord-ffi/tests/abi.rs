use std::ffi::{CStr, CString, c_char};
use std::ptr;

use concord_ffi::*;
use concord_testkit::TestCorpus;

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

unsafe fn take(s: *mut c_char) -> String {
    let out = unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string();
    unsafe { concord_free_string(s) };
    out
}

unsafe fn open(tc: &TestCorpus) -> *mut CorpusHandle {
    let path = c(tc.registry_path().to_str().unwrap());
    let r = unsafe { concord_open_corpus(path.as_ptr()) };
    assert!(r.err.is_null());
    assert_eq!(r.err_code, 0);
    r.value
}

#[test]
fn test_corpus_lifecycle() {
    let tc = TestCorpus::sample().unwrap();
    unsafe {
        let corpus = open(&tc);
        let size = concord_corpus_size(corpus);
        assert_eq!(size.value, 14);

        let info = concord_corpus_conf(corpus, c("ATTRLIST").as_ptr());
        assert!(info.err.is_null());
        assert_eq!(take(info.value), "word,lemma,tag");

        let missing = concord_corpus_conf(corpus, c("NOPE").as_ptr());
        assert!(missing.value.is_null());
        assert_eq!(missing.err_code, 3);
        concord_free_string(missing.err);

        assert_eq!(concord_struct_size(corpus, c("s").as_ptr()).value, 3);
        let attrs = concord_corpus_attributes(corpus);
        assert_eq!(concord_str_vector_size(attrs), 3);
        concord_str_vector_free(attrs);

        concord_close_corpus(corpus);
        concord_close_corpus(ptr::null_mut());
    }
}

#[test]
fn test_open_failure() {
    unsafe {
        let r = concord_open_corpus(c("/nonexistent/registry").as_ptr());
        assert!(r.value.is_null());
        assert_eq!(r.err_code, 1);
        assert!(take(r.err).contains("/nonexistent/registry"));

        let r = concord_open_corpus(ptr::null());
        assert_eq!(r.err_code, 4);
        concord_free_string(r.err);
    }
}

#[test]
fn test_conc_freqs_colls() {
    let tc = TestCorpus::sample().unwrap();
    unsafe {
        let corpus = open(&tc);
        let conc = concord_create_concordance(corpus, c(r#"[tag="NNS?"]"#).as_ptr(), ptr::null());
        assert!(conc.err.is_null());
        assert_eq!(conc.conc_size, 4);
        assert_eq!(conc.search_size, 14);
        assert!(conc.arf > 0.0);
        // result sets outlive the corpus handle they came from
        concord_close_corpus(corpus);

        let freqs = concord_freq_dist(conc.value, c("word 0").as_ptr(), 1);
        assert!(freqs.err.is_null());
        assert_eq!(concord_str_vector_size(freqs.words), 3);
        assert_eq!(
            CStr::from_ptr(concord_str_vector_get(freqs.words, 0)).to_str().unwrap(),
            "cat"
        );
        assert_eq!(concord_int_vector_get(freqs.freqs, 0), 2);
        assert_eq!(concord_int_vector_get(freqs.norms, 0), 2);
        concord_str_vector_free(freqs.words);
        concord_int_vector_free(freqs.freqs);
        concord_int_vector_free(freqs.norms);

        let colls = concord_collocations(conc.value, c("word").as_ptr(), b'f' as c_char, 1, 1, -1, -1, 2);
        assert!(colls.err.is_null());
        let mut words = Vec::new();
        while concord_colls_has_next(colls.value) {
            let item = concord_colls_next(colls.value, b'f' as c_char);
            assert!(item.err.is_null());
            assert_eq!(item.freq, 1);
            words.push(take(item.word));
        }
        assert_eq!(words, vec!["A", "Big"]);
        let past = concord_colls_next(colls.value, b'f' as c_char);
        assert!(past.word.is_null() && past.err.is_null());
        concord_colls_free(colls.value);

        let bad = concord_collocations(conc.value, c("word").as_ptr(), b'x' as c_char, 1, 1, -1, 1, 2);
        assert!(bad.value.is_null());
        assert_eq!(bad.err_code, 4);
        concord_free_string(bad.err);

        concord_conc_free(conc.value);
    }
}

#[test]
fn test_coll_filters() {
    let tc = TestCorpus::sample().unwrap();
    unsafe {
        let corpus = open(&tc);
        let conc = concord_create_concordance(corpus, c(r#"[lemma="cat"]"#).as_ptr(), ptr::null());
        let n = concord_add_coll_filter(conc.value, c(r#"[word="sat"]"#).as_ptr(), 1, 1, true);
        assert_eq!(n.value, 1);
        assert_eq!(concord_concordance_size(conc.value), 1);
        assert_eq!(concord_negate_coll_filter(conc.value, 1).value, 1);
        assert_eq!(concord_remove_coll_filter(conc.value, 1).value, 2);
        let gone = concord_remove_coll_filter(conc.value, 1);
        assert_eq!(gone.err_code, 3);
        concord_free_string(gone.err);

        let seed = concord_concordance_shuffle(conc.value, 42, true);
        assert_eq!(seed, 42);
        concord_conc_free(conc.value);
        concord_close_corpus(corpus);
    }
}

#[test]
fn test_kwic_out_of_range_code() {
    let tc = TestCorpus::sample().unwrap();
    unsafe {
        let corpus = open(&tc);
        let query = c(r#"[tag="NNS?"]"#);
        let page = concord_conc_examples(
            corpus,
            ptr::null(),
            query.as_ptr(),
            c("word").as_ptr(),
            ptr::null(),
            c("doc.id").as_ptr(),
            c("|").as_ptr(),
            0,
            6,
            2,
            c("s").as_ptr(),
            ptr::null(),
            0,
            0,
        );
        assert!(page.err.is_null());
        assert_eq!(page.conc_size, 4);
        assert_eq!(concord_kwic_page_size(page.value), 6);
        assert_eq!(concord_kwic_page_conc_size(page.value), 4);
        let first = CStr::from_ptr(concord_kwic_page_get(page.value, 0)).to_str().unwrap();
        assert!(first.starts_with("d1|") || first.starts_with("d2|"));
        let pad = CStr::from_ptr(concord_kwic_page_get(page.value, 5)).to_str().unwrap();
        assert!(pad.is_empty());
        assert!(concord_kwic_page_get(page.value, 6).is_null());
        concord_kwic_page_free(page.value);

        let past = concord_conc_examples(
            corpus,
            ptr::null(),
            query.as_ptr(),
            ptr::null(),
            ptr::null(),
            ptr::null(),
            ptr::null(),
            5,
            6,
            2,
            ptr::null(),
            ptr::null(),
            0,
            0,
        );
        assert!(past.value.is_null());
        assert_eq!(past.err_code, 2);
        concord_free_string(past.err);

        let broken = concord_conc_examples(
            corpus,
            ptr::null(),
            c("[word=").as_ptr(),
            ptr::null(),
            ptr::null(),
            ptr::null(),
            ptr::null(),
            0,
            6,
            2,
            ptr::null(),
            ptr::null(),
            0,
            0,
        );
        assert_eq!(broken.err_code, 1);
        assert!(!take(broken.err).is_empty());
        concord_close_corpus(corpus);
    }
}

#[test]
fn test_value_sizes_and_subcorpus() {
    let tc = TestCorpus::sample().unwrap();
    let subc_path = tc.dir().join("fiction.subc");
    std::fs::write(&subc_path, "7\t14\n").unwrap();
    unsafe {
        let corpus = open(&tc);
        let sizes = concord_attr_value_sizes(corpus, c("doc").as_ptr(), c("genre").as_ptr());
        assert!(sizes.err.is_null());
        assert_eq!(concord_value_size_map_size(sizes.value), 2);
        let it = concord_value_size_iter_new(sizes.value);
        let first = concord_value_size_iter_next(it);
        assert_eq!(take(first.key), "fiction");
        assert_eq!(first.value, 7);
        concord_value_size_iter_free(it);
        concord_value_size_map_free(sizes.value);

        let subc = concord_open_subcorpus(corpus, c(subc_path.to_str().unwrap()).as_ptr());
        assert!(subc.err.is_null());
        assert_eq!(subc.size, 7);
        let conc = concord_create_concordance(corpus, c(r#"[lemma="cat"]"#).as_ptr(), subc.value);
        assert_eq!(conc.conc_size, 1);
        assert_eq!(conc.search_size, 7);
        assert_eq!(conc.corpus_size, 14);
        concord_conc_free(conc.value);
        concord_subcorpus_free(subc.value);

        let bad = concord_attr_value_sizes(corpus, c("doc").as_ptr(), c("title").as_ptr());
        assert_eq!(bad.err_code, 3);
        concord_free_string(bad.err);
        concord_close_corpus(corpus);
    }
}

#[test]
fn test_kwic_limit_and_coll_query() {
    let tc = TestCorpus::sample().unwrap();
    unsafe {
        let corpus = open(&tc);
        let query = c(r#"[lemma="cat"]"#);
        for limit in [i64::MAX, 10_001, -1] {
            let page = concord_conc_examples(
                corpus,
                ptr::null(),
                query.as_ptr(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                0,
                limit,
                2,
                ptr::null(),
                ptr::null(),
                0,
                0,
            );
            assert!(page.value.is_null(), "{limit}");
            assert_eq!(page.err_code, 4, "{limit}");
            concord_free_string(page.err);
        }

        let page = concord_conc_examples(
            corpus,
            ptr::null(),
            query.as_ptr(),
            c("word").as_ptr(),
            ptr::null(),
            c("doc.id").as_ptr(),
            c("|").as_ptr(),
            0,
            3,
            2,
            ptr::null(),
            c(r#"[word="sat"]"#).as_ptr(),
            1,
            1,
        );
        assert!(page.err.is_null());
        assert_eq!(page.conc_size, 1);
        assert_eq!(concord_kwic_page_size(page.value), 3);
        let line = CStr::from_ptr(concord_kwic_page_get(page.value, 0)).to_str().unwrap();
        assert_eq!(line, "d1|The cat sat");
        let pad = CStr::from_ptr(concord_kwic_page_get(page.value, 2)).to_str().unwrap();
        assert!(pad.is_empty());
        concord_kwic_page_free(page.value);
        concord_close_corpus(corpus);
    }
}
