//! # dawgdict
//!
//! Compressed [DAWG](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton)
//! (Directed Acyclic Word Graph) dictionaries with a pluggable traversal.
//!
//! A graph is built once from sorted word lists, written in a compact line-based
//! text format, and loaded back for querying. Chains of single-child nodes are
//! stored as multi-character edges, and structurally identical subgraphs are
//! stored once.
//!
//! ## Features
//!
//! - **Incremental construction** in a single pass over sorted input, merging
//!   several word lists and an optional removal list
//! - **One traversal, many queries**: exact lookup, `?` wildcard patterns,
//!   letter-rack permutations and compound-word splitting are all policies
//!   ([`Navigator`](dawg::Navigator)s) over the same depth-first walk
//! - **Thread-safe sharing**: a [`DawgDictionary`](dawg::DawgDictionary) is
//!   loaded at most once, then read concurrently without locking
//!
//! ## Quick Start
//!
//! ```
//! use dawgdict::dawg::build_dawg;
//!
//! let dict = build_dawg(["board", "card", "cards", "cat"])
//!     .unwrap()
//!     .into_dictionary()
//!     .unwrap();
//!
//! assert!(dict.find("cards"));
//! assert!(!dict.find("car"));
//! assert_eq!(dict.find_matches("ca??", true), ["card"]);
//! assert_eq!(dict.find_permutations("tac", 0), ["cat"]);
//! assert_eq!(dict.slice_compound_word("cardboard").unwrap(), ["card", "board"]);
//! ```
//!
//! ## Text format
//!
//! The first line lists the root's edges as `label:id` pairs joined by `_`.
//! Every following line is one node, its id being its line number. A node line
//! starting with `|_` is final. An id of `0` means the edge ends a word with
//! nothing after it, and a `|` inside a label marks a word ending partway
//! through the edge:
//!
//! ```text
//! ca:2
//! r|d|s:0_t:0
//! ```
//!
//! encodes `car`, `card`, `cards` and `cat`.

#![warn(missing_docs)]

/// Graph construction, loading and navigation.
pub mod dawg;
/// Error types.
pub mod errors;
/// Lazily loaded, shared dictionaries and compound meaning lookup.
pub mod wordbase;

pub use errors::{DawgError, Result};
pub use wordbase::{CompoundMatch, LexiconLookup, Wordbase};
