use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use concord::ConcordConfig;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "concord-cmd")]
#[command(about = "Command-line utility for corpus queries and statistics")]
#[command(version)]
struct Cli {
    /// Debug-level log output on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON file with default values (context size, page size, window, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// A query over a corpus, optionally restricted to a sub-corpus file.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Corpus registry file
    pub corpus: PathBuf,

    /// Query, e.g. '[lemma="dog"] [tag="VB.*"]'
    pub query: String,

    /// Sub-corpus file (`start<TAB>end` lines)
    #[arg(long)]
    pub subc: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Corpus size, attributes, structures and selected registry values
    Info {
        /// Corpus registry file
        corpus: PathBuf,
    },

    /// Result set size, corpus and search sizes and ARF
    ConcSize {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Frequency distribution of a result set
    Freqs {
        #[command(flatten)]
        query: QueryArgs,

        /// Criterion such as "lemma/i 0" or "doc.genre 0"
        #[arg(long, default_value = "word 0")]
        fcrit: String,

        /// Minimum frequency of a reported value
        #[arg(long, default_value_t = 1)]
        flimit: u64,
    },

    /// Collocations of a result set
    Colls {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, default_value = "word")]
        attr: String,

        /// Reported measure, as a code (d) or a name (logDice)
        #[arg(long, default_value = "d")]
        measure: String,

        /// Measure to rank by; defaults to --measure
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, default_value_t = 1)]
        min_freq: u64,

        #[arg(long, default_value_t = 1)]
        min_bgr: u64,

        #[arg(long, allow_negative_numbers = true)]
        from_w: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        to_w: Option<i64>,

        #[arg(long)]
        max_items: Option<usize>,
    },

    /// A page of keyword-in-context lines
    Kwic(commands::kwic::KwicCmd),

    /// Total size of the structure instances per attribute value
    Ttsizes {
        /// Corpus registry file
        corpus: PathBuf,

        /// Structure, e.g. doc
        structure: String,

        /// Structural attribute, e.g. genre
        attr: String,
    },

    /// Tokens of a position range
    Region {
        /// Corpus registry file
        corpus: PathBuf,

        from: u64,

        to: u64,

        /// Comma-separated positional attributes
        #[arg(long, value_delimiter = ',')]
        attrs: Vec<String>,

        /// Comma-separated structures (`s`, `doc.id`)
        #[arg(long, value_delimiter = ',')]
        structs: Vec<String>,
    },

    /// Write a sub-corpus file of the structure instances with the given values
    Subc {
        /// Corpus registry file
        corpus: PathBuf,

        structure: String,

        attr: String,

        /// Accepted attribute values
        #[arg(required = true)]
        values: Vec<String>,

        /// Output file; its stem becomes the sub-corpus name
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => ConcordConfig::load(path)?,
        None => ConcordConfig::default(),
    };

    match cli.command {
        Commands::Info { corpus } => commands::info::run(&corpus),
        Commands::ConcSize { query } => commands::conc::run(&query),
        Commands::Freqs {
            query,
            fcrit,
            flimit,
        } => commands::freqs::run(&query, &fcrit, flimit),
        Commands::Colls {
            query,
            attr,
            measure,
            sort,
            min_freq,
            min_bgr,
            from_w,
            to_w,
            max_items,
        } => {
            let opts = commands::colls::CollsOpts {
                attr,
                measure,
                sort,
                min_freq,
                min_bgr,
                from_w,
                to_w,
                max_items,
            };
            commands::colls::run(&query, &opts, &config)
        }
        Commands::Kwic(cmd) => commands::kwic::run(&cmd, &config),
        Commands::Ttsizes {
            corpus,
            structure,
            attr,
        } => commands::ttsizes::run(&corpus, &structure, &attr),
        Commands::Region {
            corpus,
            from,
            to,
            attrs,
            structs,
        } => commands::region::run(&corpus, from, to, &attrs, &structs),
        Commands::Subc {
            corpus,
            structure,
            attr,
            values,
            output,
        } => commands::subc::run(&corpus, &structure, &attr, &values, &output),
    }
}
