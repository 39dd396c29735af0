//! Kwic command implementation

use anyhow::{Context, Result};
use clap::Args;

use concord::kwic::{CollQuery, KwicArgs, conc_examples};
use concord::{ConcordConfig, Corpus, KwicPage};

use crate::QueryArgs;
use crate::commands::{open_corpus, open_subcorpus, print_json};

#[derive(Args, Debug, Clone)]
pub struct KwicCmd {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Comma-separated positional attributes per token
    #[arg(long, value_delimiter = ',')]
    pub attrs: Vec<String>,

    /// Comma-separated structures to mark (`s`, `doc.genre`)
    #[arg(long, value_delimiter = ',')]
    pub structs: Vec<String>,

    /// Comma-separated references (`doc.id`, `#`)
    #[arg(long, value_delimiter = ',')]
    pub refs: Vec<String>,

    #[arg(long, default_value_t = 0)]
    pub from_line: u64,

    #[arg(long)]
    pub limit: Option<usize>,

    /// Total context tokens around each hit
    #[arg(long)]
    pub max_context: Option<usize>,

    /// Structure that bounds the context, e.g. s
    #[arg(long)]
    pub view_struct: Option<String>,

    /// Hits must have a match of this query nearby
    #[arg(long)]
    pub coll_query: Option<String>,

    #[arg(long, default_value_t = -5, allow_negative_numbers = true)]
    pub coll_lctx: i64,

    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub coll_rctx: i64,

    /// Seed for a reproducible line order
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(cmd: &KwicCmd, config: &ConcordConfig) -> Result<()> {
    let corpus = open_corpus(&cmd.query.corpus)?;
    print_json(&page(&corpus, cmd, config)?)
}

fn page(corpus: &Corpus, cmd: &KwicCmd, config: &ConcordConfig) -> Result<KwicPage> {
    let subcorpus = open_subcorpus(cmd.query.subc.as_deref())?;
    let mut args = KwicArgs::new(cmd.query.query.as_str(), config);
    args.attrs = cmd.attrs.clone();
    args.structs = cmd.structs.clone();
    args.refs = cmd.refs.clone();
    args.from_line = cmd.from_line;
    if let Some(limit) = cmd.limit {
        args.limit = limit;
    }
    if let Some(ctx) = cmd.max_context {
        args.max_context = ctx;
    }
    args.view_context_struct = cmd.view_struct.clone();
    args.coll_query = cmd.coll_query.as_ref().map(|q| CollQuery {
        query: q.clone(),
        lctx: cmd.coll_lctx,
        rctx: cmd.coll_rctx,
    });
    if cmd.seed.is_some() {
        args.shuffle_seed = cmd.seed;
    }
    conc_examples(corpus, subcorpus, &args).with_context(|| {
        format!(
            "Failed to render lines {}.. of {}",
            cmd.from_line, cmd.query.query
        )
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use concord_testkit::TestCorpus;

    fn cmd(registry: PathBuf, query: &str) -> KwicCmd {
        KwicCmd {
            query: QueryArgs {
                corpus: registry,
                query: query.to_string(),
                subc: None,
            },
            attrs: vec!["word".into()],
            structs: Vec::new(),
            refs: vec!["doc.id".into()],
            from_line: 0,
            limit: Some(3),
            max_context: Some(0),
            view_struct: None,
            coll_query: None,
            coll_lctx: -5,
            coll_rctx: 5,
            seed: Some(1),
        }
    }

    #[test]
    fn test_page() {
        let tc = TestCorpus::sample().unwrap();
        let corpus = Corpus::open(tc.registry_path()).unwrap();
        let mut config = ConcordConfig::default();
        config.ref_separator = "|".into();
        let c = cmd(tc.registry_path().to_path_buf(), r#"[word="dogs"]"#);
        let p = page(&corpus, &c, &config).unwrap();
        assert_eq!(p.conc_size, 1);
        assert_eq!(p.lines, vec!["d2|dogs", "", ""]);

        let mut c = c;
        c.from_line = 2;
        assert!(page(&corpus, &c, &config).is_err());
    }
}
