//! Command-line front end: build graph files and query them.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dawgdict::dawg::builder::{filters, BuilderConfig, DawgBuilder, MAX_WORD_LEN};
use dawgdict::dawg::DawgDictionary;
use dawgdict::DawgError;

#[derive(Parser, Debug)]
#[clap(name = "dawg", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Builds a graph file from sorted word lists.
    ///
    /// The first input must be sorted; the others are sorted in memory.
    Build(BuildArgs),

    /// Checks whether words are in a graph.
    Find {
        /// Graph file.
        graph: PathBuf,
        /// Words to look up.
        #[clap(required = true)]
        words: Vec<String>,
    },

    /// Lists the words matching a pattern, `?` matching any letter.
    Match {
        /// Graph file.
        graph: PathBuf,
        /// The pattern.
        pattern: String,
        /// Sort the result.
        #[clap(long)]
        sort: bool,
    },

    /// Lists the words that can be spelled from a rack of letters.
    Permute {
        /// Graph file.
        graph: PathBuf,
        /// Available letters; `?` stands for any letter.
        rack: String,
        /// Shortest word to report.
        #[clap(long, default_value_t = 0)]
        min_len: usize,
    },

    /// Splits compound words into words of the graph.
    Compound {
        /// Graph file.
        graph: PathBuf,
        /// Words to split.
        #[clap(required = true)]
        words: Vec<String>,
        /// Print every split instead of the preferred one.
        #[clap(long)]
        all: bool,
    },
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Word lists, one word per line.
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Output graph file.
    #[clap(short, long)]
    output: PathBuf,

    /// Sorted list of words to leave out.
    #[clap(long)]
    removals: Option<PathBuf>,

    /// Longest word accepted; longer words abort the build.
    #[clap(long, default_value_t = MAX_WORD_LEN)]
    max_len: usize,

    /// Silently drop words longer than this.
    #[clap(long)]
    filter_max_len: Option<usize>,

    /// Drop words that are not all lowercase letters.
    #[clap(long)]
    alphabetic: bool,

    /// Abort on out-of-order input instead of skipping the word.
    #[clap(long)]
    strict: bool,
}

fn build(args: BuildArgs) -> Result<(), DawgError> {
    let config = BuilderConfig {
        max_len: args.max_len,
        strict_order: args.strict,
    };
    let mut builder = DawgBuilder::new(config);
    match (args.filter_max_len, args.alphabetic) {
        (Some(n), true) => {
            let short = filters::max_length(n);
            let alpha = filters::alphabetic_only();
            builder = builder.with_filter(move |w| short(w) && alpha(w));
        }
        (Some(n), false) => builder = builder.with_filter(filters::max_length(n)),
        (None, true) => builder = builder.with_filter(filters::alphabetic_only()),
        (None, false) => {}
    }
    let stats = builder.build(&args.inputs, &args.output, args.removals.as_deref())?;
    println!(
        "{} words read, {} written, {} duplicates, {} removed, {} filtered, {} rejected, {} out of order, {} nodes",
        stats.read,
        stats.written,
        stats.duplicates,
        stats.removed,
        stats.filtered,
        stats.rejected,
        stats.out_of_order,
        stats.nodes
    );
    Ok(())
}

fn open(graph: &Path) -> Result<DawgDictionary, DawgError> {
    let dict = DawgDictionary::new();
    dict.load(graph)?;
    Ok(dict)
}

fn main() -> Result<(), DawgError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => build(args)?,
        Command::Find { graph, words } => {
            let dict = open(&graph)?;
            for word in words {
                println!("{word}\t{}", if dict.find(&word) { "yes" } else { "no" });
            }
        }
        Command::Match {
            graph,
            pattern,
            sort,
        } => {
            for word in open(&graph)?.find_matches(&pattern, sort) {
                println!("{word}");
            }
        }
        Command::Permute {
            graph,
            rack,
            min_len,
        } => {
            for word in open(&graph)?.find_permutations(&rack, min_len) {
                println!("{word}");
            }
        }
        Command::Compound { graph, words, all } => {
            let dict = open(&graph)?;
            for word in words {
                if all {
                    for parts in dict.find_combinations(&word) {
                        println!("{word}\t{}", parts.join(" "));
                    }
                } else {
                    match dict.slice_compound_word(&word) {
                        Some(parts) => println!("{word}\t{}", parts.join(" ")),
                        None => println!("{word}\t-"),
                    }
                }
            }
        }
    }
    Ok(())
}
