//! Process-wide access to a word graph, loaded on first use.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::dawg::DawgDictionary;
use crate::errors::Result;

static GLOBAL: OnceCell<Wordbase> = OnceCell::new();

/// Source of morphological meanings for a word, such as a lexicon database.
pub trait LexiconLookup {
    /// One meaning record.
    type Meaning;

    /// All meanings of `word`; empty if the word is unknown.
    fn lookup_meanings(&self, word: &str) -> Vec<Self::Meaning>;
}

impl<M: Clone> LexiconLookup for HashMap<String, Vec<M>> {
    type Meaning = M;

    fn lookup_meanings(&self, word: &str) -> Vec<M> {
        self.get(word).cloned().unwrap_or_default()
    }
}

/// A word split into graph words, with the meanings of its last part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundMatch<M> {
    /// The parts, in order.
    pub parts: Vec<String>,
    /// Meanings of the last part.
    pub meanings: Vec<M>,
}

impl<M> CompoundMatch<M> {
    /// Everything before the last part, joined with hyphens, e.g. `"hús-bíl"`.
    pub fn prefix(&self) -> String {
        let n = self.parts.len().saturating_sub(1);
        self.parts[..n].join("-")
    }

    /// The last part.
    pub fn last(&self) -> &str {
        self.parts.last().map_or("", String::as_str)
    }
}

/// A graph file together with the dictionary it loads into.
///
/// The file is read on the first call to [`dawg`](Wordbase::dawg). After that
/// the graph is shared by reference with every caller and never copied.
#[derive(Debug)]
pub struct Wordbase {
    path: PathBuf,
    dawg: DawgDictionary,
}

impl Wordbase {
    /// A wordbase backed by the graph file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Wordbase {
            path: path.into(),
            dawg: DawgDictionary::new(),
        }
    }

    /// The process-wide wordbase. The path given on the first call is the one
    /// used; later paths are ignored.
    pub fn global(path: impl AsRef<Path>) -> &'static Wordbase {
        GLOBAL.get_or_init(|| {
            debug!(path = %path.as_ref().display(), "creating global wordbase");
            Wordbase::new(path.as_ref())
        })
    }

    /// The graph file backing this wordbase.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded dictionary, loading it first if needed.
    pub fn dawg(&self) -> Result<&DawgDictionary> {
        self.dawg.load(&self.path)?;
        Ok(&self.dawg)
    }

    /// Splits `word` into graph words and looks up the meanings of the last part.
    ///
    /// Returns `None` if the word cannot be split or the lexicon knows nothing
    /// about the last part.
    pub fn lookup_compound<L: LexiconLookup>(
        &self,
        word: &str,
        lexicon: &L,
    ) -> Result<Option<CompoundMatch<L::Meaning>>> {
        let Some(parts) = self.dawg()?.slice_compound_word(word) else {
            return Ok(None);
        };
        let meanings = parts
            .last()
            .map(|last| lexicon.lookup_meanings(last))
            .unwrap_or_default();
        if meanings.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompoundMatch { parts, meanings }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dawg::build_dawg;
    use crate::errors::DawgError;
    use std::fs::File;

    fn graph_file(words: &[&str]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let built = build_dawg(words).unwrap();
        built.write_text(File::create(file.path()).unwrap()).unwrap();
        file
    }

    fn lexicon() -> HashMap<String, Vec<&'static str>> {
        let mut lex = HashMap::new();
        lex.insert("bíll".to_string(), vec!["kk"]);
        lex.insert("bílstjóri".to_string(), vec!["kk"]);
        lex.insert("hús".to_string(), vec!["hk"]);
        lex
    }

    #[test]
    fn loads_on_first_use() {
        let file = graph_file(&["bíll", "hús"]);
        let wb = Wordbase::new(file.path());
        assert_eq!(wb.path(), file.path());
        assert!(wb.dawg().unwrap().find("bíll"));
        assert!(wb.dawg().unwrap().is_loaded());
    }

    #[test]
    fn missing_file_is_an_error_every_time() {
        let wb = Wordbase::new("/nonexistent/words.dawg.txt");
        assert!(matches!(wb.dawg(), Err(DawgError::Io(_))));
        assert!(matches!(wb.dawg(), Err(DawgError::Io(_))));
    }

    #[test]
    fn compound_lookup_uses_last_part() {
        let file = graph_file(&["bílar", "bíll", "bílstjóri", "hús", "stjóri"]);
        let wb = Wordbase::new(file.path());
        let lex = lexicon();

        let m = wb.lookup_compound("húsbílstjóri", &lex).unwrap().unwrap();
        assert_eq!(m.parts, ["hús", "bílstjóri"]);
        assert_eq!(m.meanings, ["kk"]);

        let m = wb.lookup_compound("húsbíll", &lex).unwrap().unwrap();
        assert_eq!(m.prefix(), "hús");
        assert_eq!(m.last(), "bíll");

        // "bílar" is in the graph but not in the lexicon.
        assert!(wb.lookup_compound("húsbílar", &lex).unwrap().is_none());
        assert!(wb.lookup_compound("xyz", &lex).unwrap().is_none());
    }

    #[test]
    fn concurrent_first_use_loads_once() {
        let file = graph_file(&["alfa", "bravo", "charlie"]);
        let wb = Wordbase::new(file.path());
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let dawg = wb.dawg().unwrap();
                    assert!(dawg.find("bravo"));
                    assert!(!dawg.find("delta"));
                });
            }
        });
        assert_eq!(wb.dawg().unwrap().num_nodes(), 1);
    }

    #[test]
    fn global_keeps_first_path() {
        let a = Wordbase::global("first.dawg.txt");
        let b = Wordbase::global("second.dawg.txt");
        assert!(std::ptr::eq(a, b));
        assert_eq!(b.path(), Path::new("first.dawg.txt"));
    }
}
