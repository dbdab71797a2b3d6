use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use hashbrown::HashMap;
use itertools::{Itertools, Position};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::dictionary::DawgDictionary;
use super::node::{reserved_char, write_signature, FINAL_MARKER};
use crate::errors::{DawgError, Result};

/// Default upper bound on the length of a word, in characters.
pub const MAX_WORD_LEN: usize = 64;

/// Incremental DAWG builder.
///
/// Words must be added in strictly ascending order (by `str` ordering). Each new
/// word closes the branches of the previous word that it does not share; closed
/// nodes are compressed into multi-character edges when they have a single
/// child, and otherwise looked up in a register of canonical strings so that
/// identical subgraphs are stored once. Each node is closed exactly once, so the
/// total work is linear in the number of input characters.
///
/// ```
/// use dawgdict::dawg::builder::Builder;
///
/// let mut builder = Builder::new();
/// builder.add_word("abx").unwrap();
/// builder.add_word("aby").unwrap();
/// builder.add_word("bx").unwrap();
/// builder.add_word("by").unwrap();
/// let built = builder.build();
/// assert_eq!(built.to_text(), "ab:2_b:2\nx:0_y:0\n");
/// ```
pub struct Builder {
    build_state: Vec<BuildState>,
    register: HashMap<String, u32>,
    nodes: Vec<FrozenNode>,
    max_len: usize,
}

/// A node on the path of the most recently added word. Its edges already point
/// to closed nodes; only the edge towards the next path entry is still missing.
struct BuildState {
    ch: char,
    word: bool,
    edges: Vec<(String, u32)>,
}

impl BuildState {
    fn new(ch: char, word: bool) -> Self {
        BuildState {
            ch,
            word,
            edges: Vec::new(),
        }
    }
}

/// A canonical node. Edge targets are register ids, 1-based, `0` for a final leaf.
struct FrozenNode {
    word: bool,
    edges: Vec<(Box<str>, u32)>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Creates a builder accepting words up to [`MAX_WORD_LEN`] characters.
    pub fn new() -> Self {
        Builder::with_max_len(MAX_WORD_LEN)
    }

    /// Creates a builder accepting words up to `max_len` characters.
    pub fn with_max_len(max_len: usize) -> Self {
        Builder {
            build_state: vec![BuildState::new(char::default(), false)],
            register: HashMap::new(),
            nodes: Vec::new(),
            max_len,
        }
    }

    /// Adds a word to the graph being constructed.
    ///
    /// # Errors
    ///
    /// - [`DawgError::EmptyWord`] for the empty string.
    /// - [`DawgError::ReservedChar`] if the word contains `_`, `|`, `:` or a newline.
    /// - [`DawgError::WordTooLong`] if the word exceeds the maximum length.
    /// - [`DawgError::Order`] if the word does not sort strictly after the previous one.
    ///
    /// A rejected word leaves the builder unchanged.
    pub fn add_word(&mut self, word: &str) -> Result<()> {
        if word.is_empty() {
            return Err(DawgError::EmptyWord);
        }
        if let Some(ch) = reserved_char(word) {
            return Err(DawgError::ReservedChar {
                word: word.to_string(),
                ch,
            });
        }
        let chars: SmallVec<[char; 32]> = word.chars().collect();
        if chars.len() > self.max_len {
            return Err(DawgError::WordTooLong {
                word: word.to_string(),
                len: chars.len(),
                max: self.max_len,
            });
        }
        let prefix_length = self.prefix_length(&chars)?;
        self.close_suffix(prefix_length);
        self.build_state.extend(
            chars[prefix_length..]
                .iter()
                .copied()
                .with_position()
                .map(|(pos, ch)| {
                    BuildState::new(ch, matches!(pos, Position::Last | Position::Only))
                }),
        );
        Ok(())
    }

    /// Length of the prefix shared with the previous word, checking that `word`
    /// sorts strictly after it.
    fn prefix_length(&self, word: &[char]) -> Result<usize> {
        let mut prefix_len = 0;
        for (i, &ch) in word.iter().enumerate() {
            let is_last = i == word.len() - 1;
            if let Some(prev_state) = self.build_state.get(prefix_len + 1) {
                if ch > prev_state.ch {
                    break;
                }
                if ch < prev_state.ch || is_last {
                    return Err(DawgError::Order {
                        previous: self.previous_word(),
                        word: word.iter().collect(),
                    });
                }
                prefix_len += 1;
            } else {
                break;
            }
        }
        Ok(prefix_len)
    }

    fn previous_word(&self) -> String {
        self.build_state[1..].iter().map(|e| e.ch).collect()
    }

    /// Closes every path entry deeper than `target_length`, attaching each closed
    /// node to its parent.
    fn close_suffix(&mut self, target_length: usize) {
        while self.build_state.len() > target_length + 1 {
            let state = self.pop_build_state();
            let mut label = String::new();
            label.push(state.ch);
            let target = self.collapse(state, &mut label);
            self.build_state
                .last_mut()
                .expect("root entry is never popped here")
                .edges
                .push((label, target));
        }
    }

    fn pop_build_state(&mut self) -> BuildState {
        self.build_state
            .pop()
            .expect("build state always holds the root entry")
    }

    /// Turns a closed node into the tail of its parent's edge label plus a target.
    ///
    /// A final node without edges becomes the leaf target `0`. A node with a
    /// single edge is merged into the parent edge, carrying its finality as an
    /// embedded marker. Anything else is canonicalized.
    fn collapse(&mut self, mut state: BuildState, label: &mut String) -> u32 {
        match state.edges.len() {
            0 => {
                debug_assert!(state.word, "a leaf always ends a word");
                0
            }
            1 => {
                let (tail, target) = state.edges.pop().expect("one edge");
                if state.word {
                    label.push(FINAL_MARKER);
                }
                label.push_str(&tail);
                target
            }
            _ => self.canonicalize(state),
        }
    }

    fn canonicalize(&mut self, state: BuildState) -> u32 {
        let mut signature = String::new();
        write_signature(
            &mut signature,
            state.word,
            state.edges.iter().map(|(l, id)| (l.as_str(), *id)),
        );
        if let Some(&id) = self.register.get(&signature) {
            return id;
        }
        self.nodes.push(FrozenNode {
            word: state.word,
            edges: state
                .edges
                .into_iter()
                .map(|(l, id)| (l.into_boxed_str(), id))
                .collect(),
        });
        let id = self.nodes.len() as u32;
        self.register.insert(signature, id);
        id
    }

    /// Finalizes construction, renumbering the surviving nodes in depth-first
    /// order starting at 2, and returns the serialized graph.
    pub fn build(mut self) -> BuiltDawg {
        self.close_suffix(0);
        let root = self.pop_build_state();

        // Register ids are 1-based; slot 0 stands for the final leaf.
        let mut renumber = vec![0u32; self.nodes.len() + 1];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut next_id = 2;
        for (_, target) in &root.edges {
            self.number_nodes(*target, &mut renumber, &mut order, &mut next_id);
        }

        let mut lines = Vec::with_capacity(order.len() + 1);
        let mut line = String::new();
        write_signature(
            &mut line,
            false,
            root.edges
                .iter()
                .map(|(l, id)| (l.as_str(), renumber[*id as usize])),
        );
        lines.push(line);
        for id in order {
            let node = &self.nodes[id as usize - 1];
            let mut line = String::new();
            write_signature(
                &mut line,
                node.word,
                node.edges
                    .iter()
                    .map(|(l, id)| (&**l, renumber[*id as usize])),
            );
            lines.push(line);
        }
        BuiltDawg { lines }
    }

    fn number_nodes(&self, id: u32, renumber: &mut [u32], order: &mut Vec<u32>, next_id: &mut u32) {
        if id == 0 || renumber[id as usize] != 0 {
            return;
        }
        renumber[id as usize] = *next_id;
        *next_id += 1;
        order.push(id);
        for (_, target) in &self.nodes[id as usize - 1].edges {
            self.number_nodes(*target, renumber, order, next_id);
        }
    }
}

/// A finished graph in its text serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltDawg {
    lines: Vec<String>,
}

impl BuiltDawg {
    /// Number of unique nodes, not counting the root.
    pub fn node_count(&self) -> usize {
        self.lines.len() - 1
    }

    /// The serialized lines, root first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes the text serialization, one newline-terminated line per node.
    pub fn write_text<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for line in &self.lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Returns the text serialization as a string.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Loads this graph into a dictionary without going through a file.
    pub fn into_dictionary(self) -> Result<DawgDictionary> {
        DawgDictionary::from_text(&self.to_text())
    }
}

/// Builds a graph from words in strictly ascending order.
///
/// ```
/// use dawgdict::dawg::builder::build_dawg;
///
/// let built = build_dawg(["car", "card", "cards", "cat"]).unwrap();
/// assert_eq!(built.to_text(), "ca:2\nr|d|s:0_t:0\n");
/// ```
pub fn build_dawg<W: AsRef<str>>(words: impl IntoIterator<Item = W>) -> Result<BuiltDawg> {
    let mut builder = Builder::new();
    for word in words {
        builder.add_word(word.as_ref())?;
    }
    Ok(builder.build())
}

/// Settings for [`DawgBuilder`].
#[derive(Clone, Debug)]
pub struct BuilderConfig {
    /// Words longer than this abort the build.
    pub max_len: usize,
    /// Abort on out-of-order input instead of skipping the offending word.
    pub strict_order: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            max_len: MAX_WORD_LEN,
            strict_order: false,
        }
    }
}

/// Counters reported at the end of a build run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Words read from all inputs.
    pub read: usize,
    /// Words added to the graph.
    pub written: usize,
    /// Exact duplicates skipped.
    pub duplicates: usize,
    /// Words dropped because they appear in the removal list.
    pub removed: usize,
    /// Words rejected by the filter predicate.
    pub filtered: usize,
    /// Words skipped for containing reserved characters.
    pub rejected: usize,
    /// Words skipped because they arrived out of order.
    pub out_of_order: usize,
    /// Unique nodes in the output, not counting the root.
    pub nodes: usize,
}

type WordFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Batch builder merging several word lists into one graph file.
///
/// The first input is streamed and must already be sorted; further inputs are
/// read fully and sorted in memory, so small unsorted supplements can be mixed
/// with a large pre-sorted list. An optional removal list, also sorted, is
/// consulted in lock-step with the merged stream.
pub struct DawgBuilder {
    config: BuilderConfig,
    filter: Option<WordFilter>,
}

impl Default for DawgBuilder {
    fn default() -> Self {
        DawgBuilder::new(BuilderConfig::default())
    }
}

impl DawgBuilder {
    /// Creates a batch builder.
    pub fn new(config: BuilderConfig) -> Self {
        DawgBuilder {
            config,
            filter: None,
        }
    }

    /// Only words for which `filter` returns true are added.
    pub fn with_filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Merges the word lists at `inputs`, minus the words in `removals`, and
    /// writes the graph to `output`.
    pub fn build<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        output: impl AsRef<Path>,
        removals: Option<&Path>,
    ) -> Result<BuildStats> {
        let mut streams = Vec::with_capacity(inputs.len());
        for (i, path) in inputs.iter().enumerate() {
            let path = path.as_ref();
            debug!(path = %path.display(), "opening word list");
            let reader = open(path)?;
            streams.push(if i == 0 {
                WordStream::from_reader(reader)
            } else {
                WordStream::sorted_from_reader(reader)?
            });
        }
        let removals = removals
            .map(|path| open(path).map(WordStream::from_reader))
            .transpose()?;

        let (built, stats) = self.build_from_streams(streams, removals)?;

        let output = output.as_ref();
        let file = File::create(output)?;
        built.write_text(BufWriter::new(file))?;
        info!(
            output = %output.display(),
            read = stats.read,
            written = stats.written,
            duplicates = stats.duplicates,
            removed = stats.removed,
            nodes = stats.nodes,
            "graph written"
        );
        Ok(stats)
    }

    /// Like [`build`](DawgBuilder::build), but over in-memory readers and
    /// without writing anything.
    pub fn build_from_readers<R: BufRead + 'static>(
        &self,
        inputs: Vec<R>,
        removals: Option<R>,
    ) -> Result<(BuiltDawg, BuildStats)> {
        let mut streams = Vec::with_capacity(inputs.len());
        for (i, reader) in inputs.into_iter().enumerate() {
            let reader: Box<dyn BufRead> = Box::new(reader);
            streams.push(if i == 0 {
                WordStream::from_reader(reader)
            } else {
                WordStream::sorted_from_reader(reader)?
            });
        }
        let removals = removals.map(|r| WordStream::from_reader(Box::new(r)));
        self.build_from_streams(streams, removals)
    }

    fn build_from_streams(
        &self,
        mut streams: Vec<WordStream>,
        mut removals: Option<WordStream>,
    ) -> Result<(BuiltDawg, BuildStats)> {
        let mut stats = BuildStats::default();
        let mut builder = Builder::with_max_len(self.config.max_len);

        let mut heads = streams
            .iter_mut()
            .map(WordStream::next_word)
            .collect::<Result<Vec<_>>>()?;
        let mut removal = match removals.as_mut() {
            Some(r) => r.next_word()?,
            None => None,
        };
        let mut last: Option<String> = None;

        loop {
            // Smallest head; ties go to the earliest input.
            let Some(ix) = heads
                .iter()
                .enumerate()
                .filter_map(|(i, w)| w.as_ref().map(|w| (i, w)))
                .min_by(|a, b| a.1.cmp(b.1))
                .map(|(i, _)| i)
            else {
                break;
            };
            let next = streams[ix].next_word()?;
            let word = std::mem::replace(&mut heads[ix], next).expect("selected head is present");
            stats.read += 1;

            if last.as_deref() == Some(word.as_str()) {
                stats.duplicates += 1;
                continue;
            }
            last = Some(word.clone());

            if let Some(filter) = &self.filter {
                if !filter(&word) {
                    stats.filtered += 1;
                    continue;
                }
            }

            if let Some(r) = removals.as_mut() {
                while removal.as_deref().is_some_and(|rw| rw < word.as_str()) {
                    removal = r.next_word()?;
                }
                if removal.as_deref() == Some(word.as_str()) {
                    stats.removed += 1;
                    continue;
                }
            }

            match builder.add_word(&word) {
                Ok(()) => stats.written += 1,
                Err(DawgError::ReservedChar { word, ch }) => {
                    warn!(%word, %ch, "skipping word with reserved character");
                    stats.rejected += 1;
                }
                Err(DawgError::Order { previous, word }) if !self.config.strict_order => {
                    warn!(%previous, %word, "input is not sorted, skipping word");
                    stats.out_of_order += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let built = builder.build();
        stats.nodes = built.node_count();
        Ok((built, stats))
    }
}

fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.is_dir() {
        return Err(DawgError::PathIsDirectory(path.to_path_buf()));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

/// A source of words, one per line. Blank lines and comments are skipped.
enum WordStream {
    Reader { reader: Box<dyn BufRead>, buf: String },
    Sorted(std::vec::IntoIter<String>),
}

impl WordStream {
    fn from_reader(reader: Box<dyn BufRead>) -> Self {
        WordStream::Reader {
            reader,
            buf: String::with_capacity(80),
        }
    }

    fn sorted_from_reader(reader: Box<dyn BufRead>) -> Result<Self> {
        let mut words = Vec::new();
        let mut stream = WordStream::from_reader(reader);
        while let Some(word) = stream.next_word()? {
            words.push(word);
        }
        words.sort_unstable();
        Ok(WordStream::Sorted(words.into_iter()))
    }

    fn next_word(&mut self) -> Result<Option<String>> {
        match self {
            WordStream::Sorted(words) => Ok(words.next()),
            WordStream::Reader { reader, buf } => loop {
                // read_line reuses one buffer instead of allocating per line.
                buf.clear();
                if reader.read_line(buf)? == 0 {
                    return Ok(None);
                }
                let word = buf.trim_end();
                if !word.is_empty() && !is_comment(word) {
                    return Ok(Some(word.to_string()));
                }
            },
        }
    }
}

/// Returns true if this line is a comment.
pub(crate) fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Ready-made filter predicates for [`DawgBuilder::with_filter`].
pub mod filters {
    /// Accepts words of at most `max` characters.
    pub fn max_length(max: usize) -> impl Fn(&str) -> bool + Send + Sync + 'static {
        move |word| word.chars().count() <= max
    }

    /// Accepts words made only of lowercase alphabetic characters.
    pub fn alphabetic_only() -> impl Fn(&str) -> bool + Send + Sync + 'static {
        |word| word.chars().all(|c| c.is_alphabetic() && !c.is_uppercase())
    }
}
