use std::cmp::Reverse;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::navigation::{Navigation, Navigator, ResumePoint};
use super::navigators::{CompoundNavigator, FindNavigator, MatchNavigator, PermutationNavigator};
use super::node::{GraphNode, NodeId};
use crate::errors::{DawgError, Result};

/// Nodes indexed by id. Slot 0 ("no node") holds an empty placeholder that is
/// never reached, slot 1 is the root.
#[derive(Debug)]
pub(crate) struct Graph {
    nodes: Vec<GraphNode>,
}

impl Graph {
    #[inline]
    pub(crate) fn root(&self) -> &GraphNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// The node with this id, or `None` if the id is not part of this graph.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    /// Parses the text serialization.
    ///
    /// An edge may refer to a node defined further down, so references are
    /// only checked once every line has been read. The table grows one slot
    /// per line and never by a referenced id.
    fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut nodes = vec![GraphNode::default()];
        let mut highest = NodeId::ROOT;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let node = GraphNode::parse(&line, line_no)?;
            if line_no == 1 && node.is_word() {
                return Err(DawgError::format(1, "the root cannot be final"));
            }
            if let Some(id) = node.edges().iter().filter_map(|e| e.next()).max() {
                highest = highest.max(id);
            }
            nodes.push(node);
        }
        if nodes.len() < 2 {
            return Err(DawgError::format(0, "the graph has no root line"));
        }
        if highest.index() >= nodes.len() {
            return Err(DawgError::format(
                0,
                format!("node {highest} is referenced but never defined"),
            ));
        }
        Ok(Graph { nodes })
    }
}

/// A word graph loaded from its text serialization.
///
/// The graph is loaded at most once: the first successful [`load`] wins and
/// every later call is a no-op, also when several threads race to load it
/// (they block until the winner is done). A failed load leaves the dictionary
/// unloaded. Queries on an unloaded dictionary find nothing.
///
/// Once loaded the graph is immutable, so any number of threads may query it
/// at the same time; each query owns its navigator.
///
/// [`load`]: DawgDictionary::load
///
/// ```
/// use dawgdict::dawg::DawgDictionary;
///
/// let dict = DawgDictionary::from_text("ca:2\nr|d|s:0_t:0\n").unwrap();
/// assert!(dict.find("card"));
/// assert!(!dict.find("ca"));
/// assert_eq!(dict.find_matches("ca??", true), ["card"]);
/// ```
#[derive(Debug, Default)]
pub struct DawgDictionary {
    graph: OnceCell<Graph>,
}

impl DawgDictionary {
    /// Creates an unloaded dictionary.
    pub fn new() -> Self {
        DawgDictionary::default()
    }

    /// Creates a dictionary from serialized text.
    pub fn from_text(text: &str) -> Result<Self> {
        let dict = DawgDictionary::new();
        dict.load_from_reader(text.as_bytes())?;
        Ok(dict)
    }

    /// Loads the graph file at `path` unless a graph is already loaded.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.init(|| {
            if path.is_dir() {
                return Err(DawgError::PathIsDirectory(path.to_path_buf()));
            }
            debug!(path = %path.display(), "loading graph");
            Graph::parse(BufReader::new(File::open(path)?))
        })
    }

    /// Loads the graph from `reader` unless a graph is already loaded.
    pub fn load_from_reader<R: BufRead>(&self, reader: R) -> Result<()> {
        self.init(|| Graph::parse(reader))
    }

    fn init(&self, parse: impl FnOnce() -> Result<Graph>) -> Result<()> {
        let mut parsed = false;
        let graph = self.graph.get_or_try_init(|| {
            parsed = true;
            parse()
        })?;
        if parsed {
            info!(nodes = graph.nodes.len() - 1, "graph loaded");
        } else {
            debug!("graph already loaded");
        }
        Ok(())
    }

    /// True once a graph has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.graph.get().is_some()
    }

    /// Number of nodes, the root included. Zero while unloaded.
    pub fn num_nodes(&self) -> usize {
        self.graph.get().map_or(0, |g| g.nodes.len() - 1)
    }

    /// Walks the graph with `navigator`.
    pub fn navigate<N: Navigator>(&self, navigator: &mut N) {
        Navigation::new(self.graph.get(), navigator).go();
    }

    /// Continues a walk from a point saved by a resumable navigator.
    pub fn resume<N: Navigator>(&self, navigator: &mut N, point: ResumePoint) {
        Navigation::new(self.graph.get(), navigator).resume(point);
    }

    /// True if `word` is in the graph.
    pub fn find(&self, word: &str) -> bool {
        let mut nav = FindNavigator::new(word);
        self.navigate(&mut nav);
        nav.is_found()
    }

    /// All words matching `pattern`, where `?` matches any single letter.
    pub fn find_matches(&self, pattern: &str, sort: bool) -> Vec<String> {
        let mut nav = MatchNavigator::new(pattern, sort);
        self.navigate(&mut nav);
        nav.into_result()
    }

    /// All words that can be spelled from the letters in `rack`, longest first.
    /// A `?` in the rack stands for any letter.
    pub fn find_permutations(&self, rack: &str, min_len: usize) -> Vec<String> {
        let mut nav = PermutationNavigator::new(rack, min_len);
        self.navigate(&mut nav);
        nav.into_result()
    }

    /// Every way of writing `word` as a sequence of words in the graph.
    ///
    /// Splits are listed by increasing length of the first part; the word
    /// itself, if present, comes last as a single part.
    pub fn find_combinations(&self, word: &str) -> Vec<Vec<String>> {
        let mut result = Vec::new();
        let mut nav = CompoundNavigator::new(word);
        self.navigate(&mut nav);
        while let Some(point) = nav.take_paused() {
            let prefix = point.matched().to_string();
            for tail in self.find_combinations(&word[prefix.len()..]) {
                let mut parts = Vec::with_capacity(tail.len() + 1);
                parts.push(prefix.clone());
                parts.extend(tail);
                result.push(parts);
            }
            self.resume(&mut nav, point);
        }
        if nav.is_whole() {
            result.push(vec![word.to_string()]);
        }
        result
    }

    /// The preferred way of writing `word` as words in the graph: the one with
    /// the longest last part, then the fewest parts, then the first found.
    ///
    /// A word present in the graph is returned as its own single part.
    pub fn slice_compound_word(&self, word: &str) -> Option<Vec<String>> {
        self.find_combinations(word).into_iter().min_by_key(|parts| {
            let last = parts.last().map_or(0, |p| p.chars().count());
            (Reverse(last), parts.len())
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dawg::builder::build_dawg;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dict(words: &[&str]) -> DawgDictionary {
        let mut words = words.to_vec();
        words.sort_unstable();
        build_dawg(words).unwrap().into_dictionary().unwrap()
    }

    #[test]
    fn find_words() {
        let d = dict(&["car", "card", "cards", "cat", "dog"]);
        for w in ["car", "card", "cards", "cat", "dog"] {
            assert!(d.find(w), "{w}");
        }
        for w in ["", "c", "ca", "carb", "cardss", "do", "dogs", "x"] {
            assert!(!d.find(w), "{w}");
        }
    }

    #[test]
    fn unloaded_dictionary_finds_nothing() {
        let d = DawgDictionary::new();
        assert!(!d.is_loaded());
        assert_eq!(d.num_nodes(), 0);
        assert!(!d.find("a"));
        assert!(d.find_matches("?", false).is_empty());
        assert!(d.find_permutations("abc", 0).is_empty());
        assert_eq!(d.slice_compound_word("ab"), None);
    }

    #[test]
    fn done_is_called_once() {
        struct Counting(FindNavigator, usize);
        impl crate::dawg::navigation::private::Sealed for Counting {}
        impl Navigator for Counting {
            fn push_edge(&mut self, first: char) -> bool {
                self.0.push_edge(first)
            }
            fn accepting(&self) -> bool {
                self.0.accepting()
            }
            fn accepts(&mut self, ch: char) -> bool {
                self.0.accepts(ch)
            }
            fn accept(&mut self, matched: &str, is_final: bool) {
                self.0.accept(matched, is_final)
            }
            fn pop_edge(&mut self) -> bool {
                self.0.pop_edge()
            }
            fn done(&mut self) {
                self.1 += 1;
            }
        }
        let mut nav = Counting(FindNavigator::new("card"), 0);
        DawgDictionary::new().navigate(&mut nav);
        assert_eq!(nav.1, 1);
        let mut nav = Counting(FindNavigator::new("card"), 0);
        dict(&["car", "card"]).navigate(&mut nav);
        assert_eq!(nav.1, 1);
        assert!(nav.0.is_found());
    }

    #[test]
    fn wildcard_matches() {
        let d = dict(&["hallo", "hello", "help", "hullo", "hzllox"]);
        let mut m = d.find_matches("h?llo", false);
        m.sort();
        assert_eq!(m, ["hallo", "hello", "hullo"]);
        assert_eq!(d.find_matches("he??", true), ["help"]);
        assert_eq!(d.find_matches("?????", true), ["hallo", "hello", "hullo"]);
        assert!(d.find_matches("h?l", true).is_empty());
        assert!(d.find_matches("", true).is_empty());
    }

    #[test]
    fn literal_positions_do_not_need_siblings() {
        let d = dict(&["ab", "ac", "bc"]);
        assert_eq!(d.find_matches("a?", true), ["ab", "ac"]);
        assert_eq!(d.find_matches("?c", true), ["ac", "bc"]);
        assert_eq!(d.find_matches("bc", true), ["bc"]);
    }

    #[test]
    fn rack_permutations() {
        let d = dict(&["ab", "abc", "bac", "cab", "cc", "dab"]);
        assert_eq!(d.find_permutations("abc", 0), ["abc", "bac", "cab", "ab"]);
        assert_eq!(d.find_permutations("abc", 3), ["abc", "bac", "cab"]);
        assert_eq!(d.find_permutations("cc", 0), ["cc"]);
        assert!(d.find_permutations("c", 0).is_empty());
        assert!(d.find_permutations("", 0).is_empty());
    }

    #[test]
    fn rack_wildcards() {
        let d = dict(&["ab", "abc", "bac", "cab", "cc", "dab"]);
        assert_eq!(
            d.find_permutations("ab?", 0),
            ["abc", "bac", "cab", "dab", "ab"]
        );
        assert_eq!(d.find_permutations("c?", 0), ["cc"]);
    }

    #[test]
    fn compound_combinations() {
        let d = dict(&["board", "card", "cardb", "oard"]);
        assert_eq!(
            d.find_combinations("cardboard"),
            [vec!["card", "board"], vec!["cardb", "oard"]]
        );
        assert_eq!(
            d.slice_compound_word("cardboard").unwrap(),
            ["card", "board"]
        );
    }

    #[test]
    fn whole_word_wins_over_split() {
        let d = dict(&["board", "card", "cardboard"]);
        assert_eq!(
            d.find_combinations("cardboard"),
            [vec!["card", "board"], vec!["cardboard"]]
        );
        assert_eq!(d.slice_compound_word("cardboard").unwrap(), ["cardboard"]);
    }

    #[test]
    fn fewer_parts_break_ties() {
        // Both splits end in "ur"; the two-part one wins.
        let d = dict(&["a", "ab", "b", "ur"]);
        assert_eq!(
            d.find_combinations("abur"),
            [vec!["a", "b", "ur"], vec!["ab", "ur"]]
        );
        assert_eq!(d.slice_compound_word("abur").unwrap(), ["ab", "ur"]);
    }

    #[test]
    fn compound_pauses_inside_edges() {
        // "hús" and "húsbíl" share one edge label "hús|bíl" after compression.
        let d = dict(&["bíll", "bílstjóri", "hús", "húsbíl", "stjóri"]);
        assert_eq!(
            d.find_combinations("húsbílstjóri"),
            [vec!["hús", "bílstjóri"], vec!["húsbíl", "stjóri"]]
        );
        assert_eq!(
            d.slice_compound_word("húsbílstjóri").unwrap(),
            ["hús", "bílstjóri"]
        );
        assert_eq!(d.slice_compound_word("húsbílx"), None);
    }

    #[test]
    fn resume_point_from_another_graph_finds_nothing() {
        let big = DawgDictionary::from_text("ab:2\n|_c:3_d:0\ne:0_f:0\n").unwrap();
        let mut nav = CompoundNavigator::new("abce");
        big.navigate(&mut nav);
        let point = nav.take_paused().unwrap();
        assert_eq!(point.matched(), "ab");
        assert_eq!(point.next(), NodeId::new(2));

        let small = DawgDictionary::from_text("q:0\n").unwrap();
        small.resume(&mut nav, point);
        assert!(nav.take_paused().is_none());
        assert!(!nav.is_whole());
    }

    /// Counts how many readers were read from at all.
    struct CountingReader<'a> {
        inner: &'a [u8],
        touched: bool,
        count: &'a AtomicUsize,
    }

    impl CountingReader<'_> {
        fn touch(&mut self) {
            if !self.touched {
                self.touched = true;
                self.count.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl Read for CountingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.touch();
            self.inner.read(buf)
        }
    }

    impl BufRead for CountingReader<'_> {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            self.touch();
            Ok(self.inner)
        }

        fn consume(&mut self, amt: usize) {
            self.inner = &self.inner[amt..];
        }
    }

    #[test]
    fn racing_loads_parse_once() {
        let text = build_dawg(["alfa", "bravo", "charlie"]).unwrap().to_text();
        let parses = AtomicUsize::new(0);
        let d = DawgDictionary::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let reader = CountingReader {
                        inner: text.as_bytes(),
                        touched: false,
                        count: &parses,
                    };
                    d.load_from_reader(reader).unwrap();
                    assert!(d.find("bravo"));
                });
            }
        });
        assert_eq!(parses.load(Ordering::SeqCst), 1);
        let late = CountingReader {
            inner: text.as_bytes(),
            touched: false,
            count: &parses,
        };
        d.load_from_reader(late).unwrap();
        assert_eq!(parses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn load_is_idempotent() {
        let d = DawgDictionary::from_text("a:0\n").unwrap();
        d.load_from_reader("b:0\n".as_bytes()).unwrap();
        d.load("/nonexistent/graph.txt").unwrap();
        assert!(d.find("a"));
        assert!(!d.find("b"));
    }

    #[test]
    fn failed_load_leaves_dictionary_unloaded() {
        let d = DawgDictionary::new();
        assert!(matches!(d.load("/nonexistent/graph.txt"), Err(DawgError::Io(_))));
        assert!(!d.is_loaded());
        assert!(d.load_from_reader("a:2\n".as_bytes()).is_err());
        assert!(!d.is_loaded());
        d.load_from_reader("a:0\n".as_bytes()).unwrap();
        assert!(d.find("a"));
    }

    #[test]
    fn forward_references_resolve() {
        let d = DawgDictionary::from_text("a:2_bx:3\nx:3_y:0_z:0\na:0_b:0\n").unwrap();
        assert_eq!(d.num_nodes(), 3);
        for w in ["axa", "axb", "ay", "az", "bxa", "bxb"] {
            assert!(d.find(w), "{w}");
        }
        assert!(!d.find("bx"));
    }

    #[test]
    fn malformed_graphs_are_rejected() {
        assert!(DawgDictionary::from_text("").is_err());
        assert!(DawgDictionary::from_text("|_a:0\n").is_err());
        assert!(matches!(
            DawgDictionary::from_text("a:2\nb:5\n"),
            Err(DawgError::Format { .. })
        ));
        assert!(DawgDictionary::from_text("a:2\nb:x\n").is_err());
    }

    #[test]
    fn huge_reference_is_an_error() {
        let res = DawgDictionary::from_text("a:4000000000\n");
        match res {
            Err(DawgError::Format { line: 0, message }) => {
                assert!(message.contains("4000000000"), "{message}")
            }
            other => panic!("expected a format error, got {other:?}"),
        }
        assert!(DawgDictionary::from_text("a:2_b:3\nc:0\n").is_err());
    }

    #[test]
    fn empty_graph_loads() {
        let d = DawgDictionary::from_text("\n").unwrap();
        assert!(d.is_loaded());
        assert_eq!(d.num_nodes(), 1);
        assert!(!d.find("a"));
    }
}
