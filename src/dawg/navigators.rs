//! The traversal policies behind the dictionary queries.

use std::cmp::Reverse;

use smallvec::SmallVec;

use super::navigation::{private::Sealed, Navigator, ResumePoint};

/// Pattern and rack character matching any single letter.
pub const WILDCARD: char = '?';

type Letters = SmallVec<[char; 32]>;

/// Exact lookup of a single word.
#[derive(Debug)]
pub struct FindNavigator {
    word: Letters,
    index: usize,
    found: bool,
}

impl FindNavigator {
    /// Looks for `word`.
    pub fn new(word: &str) -> Self {
        FindNavigator {
            word: word.chars().collect(),
            index: 0,
            found: false,
        }
    }

    /// True if the word was found as a complete word.
    pub fn is_found(&self) -> bool {
        self.found
    }
}

impl Sealed for FindNavigator {}

impl Navigator for FindNavigator {
    fn push_edge(&mut self, first: char) -> bool {
        self.word.get(self.index) == Some(&first)
    }

    fn accepting(&self) -> bool {
        self.index < self.word.len()
    }

    fn accepts(&mut self, ch: char) -> bool {
        if self.word.get(self.index) != Some(&ch) {
            return false;
        }
        self.index += 1;
        true
    }

    fn accept(&mut self, _matched: &str, is_final: bool) {
        if is_final && self.index == self.word.len() {
            self.found = true;
        }
    }

    fn pop_edge(&mut self) -> bool {
        // Only one edge per node can start with the next letter.
        false
    }
}

/// Finds all words matching a pattern where [`WILDCARD`] stands for any letter.
///
/// Only words of exactly the pattern's length are reported; a path that reaches
/// a final node before the pattern is used up is not a match.
#[derive(Debug)]
pub struct MatchNavigator {
    pattern: Letters,
    index: usize,
    stack: Vec<usize>,
    sort: bool,
    result: Vec<String>,
}

impl MatchNavigator {
    /// Matches `pattern`; with `sort` the result is sorted when the walk is done.
    pub fn new(pattern: &str, sort: bool) -> Self {
        MatchNavigator {
            pattern: pattern.chars().collect(),
            index: 0,
            stack: Vec::new(),
            sort,
            result: Vec::new(),
        }
    }

    /// The matching words.
    pub fn into_result(self) -> Vec<String> {
        self.result
    }

    fn matches(&self, ch: char) -> bool {
        self.pattern
            .get(self.index)
            .is_some_and(|&p| p == WILDCARD || p == ch)
    }
}

impl Sealed for MatchNavigator {}

impl Navigator for MatchNavigator {
    fn push_edge(&mut self, first: char) -> bool {
        if !self.matches(first) {
            return false;
        }
        self.stack.push(self.index);
        true
    }

    fn accepting(&self) -> bool {
        self.index < self.pattern.len()
    }

    fn accepts(&mut self, ch: char) -> bool {
        if !self.matches(ch) {
            return false;
        }
        self.index += 1;
        true
    }

    fn accept(&mut self, matched: &str, is_final: bool) {
        if is_final && self.index == self.pattern.len() {
            self.result.push(matched.to_string());
        }
    }

    fn pop_edge(&mut self) -> bool {
        let Some(index) = self.stack.pop() else {
            return false;
        };
        self.index = index;
        // Siblings can only match at a wildcard position.
        self.pattern.get(index) == Some(&WILDCARD)
    }

    fn done(&mut self) {
        if self.sort {
            self.result.sort();
        }
    }
}

/// Finds all words that can be spelled from a rack of letters.
///
/// Each rack letter is used at most once; a [`WILDCARD`] in the rack stands for
/// any one letter. Exact letters are consumed before wildcards. Results are
/// ordered longest first, then alphabetically.
#[derive(Debug)]
pub struct PermutationNavigator {
    rack: Letters,
    stack: Vec<Letters>,
    min_len: usize,
    result: Vec<String>,
}

impl PermutationNavigator {
    /// Permutes `rack`, reporting words of at least `min_len` characters.
    pub fn new(rack: &str, min_len: usize) -> Self {
        PermutationNavigator {
            rack: rack.chars().collect(),
            stack: Vec::new(),
            min_len,
            result: Vec::new(),
        }
    }

    /// The words found.
    pub fn into_result(self) -> Vec<String> {
        self.result
    }

    fn position(&self, ch: char) -> Option<usize> {
        self.rack
            .iter()
            .position(|&c| c == ch)
            .or_else(|| self.rack.iter().position(|&c| c == WILDCARD))
    }
}

impl Sealed for PermutationNavigator {}

impl Navigator for PermutationNavigator {
    fn push_edge(&mut self, first: char) -> bool {
        if self.position(first).is_none() {
            return false;
        }
        self.stack.push(self.rack.clone());
        true
    }

    fn accepting(&self) -> bool {
        !self.rack.is_empty()
    }

    fn accepts(&mut self, ch: char) -> bool {
        match self.position(ch) {
            Some(pos) => {
                self.rack.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    fn accept(&mut self, matched: &str, is_final: bool) {
        if is_final && matched.chars().count() >= self.min_len {
            self.result.push(matched.to_string());
        }
    }

    fn pop_edge(&mut self) -> bool {
        match self.stack.pop() {
            Some(rack) => {
                self.rack = rack;
                true
            }
            None => false,
        }
    }

    fn done(&mut self) {
        self.result
            .sort_by(|a, b| (Reverse(a.chars().count()), a).cmp(&(Reverse(b.chars().count()), b)));
    }
}

/// Walks a word exactly, pausing at every proper prefix that is a word.
///
/// The caller searches the remainder after each pause and then resumes the walk
/// from the saved [`ResumePoint`]. Used by
/// [`DawgDictionary::find_combinations`](super::dictionary::DawgDictionary::find_combinations).
#[derive(Debug)]
pub struct CompoundNavigator {
    word: Letters,
    index: usize,
    paused: Option<ResumePoint>,
    whole: bool,
}

impl CompoundNavigator {
    /// Walks `word`.
    pub fn new(word: &str) -> Self {
        CompoundNavigator {
            word: word.chars().collect(),
            index: 0,
            paused: None,
            whole: false,
        }
    }

    /// Takes the pending pause point, if the walk stopped at a word boundary.
    pub fn take_paused(&mut self) -> Option<ResumePoint> {
        self.paused.take()
    }

    /// True if the entire word was matched as one complete word.
    pub fn is_whole(&self) -> bool {
        self.whole
    }
}

impl Sealed for CompoundNavigator {}

impl Navigator for CompoundNavigator {
    const RESUMABLE: bool = true;

    fn push_edge(&mut self, first: char) -> bool {
        self.word.get(self.index) == Some(&first)
    }

    fn accepting(&self) -> bool {
        self.paused.is_none() && self.index < self.word.len()
    }

    fn accepts(&mut self, ch: char) -> bool {
        if self.word.get(self.index) != Some(&ch) {
            return false;
        }
        self.index += 1;
        true
    }

    fn accept(&mut self, _matched: &str, is_final: bool) {
        if is_final && self.index == self.word.len() {
            self.whole = true;
        }
    }

    fn accept_resumable(&mut self, point: ResumePoint, is_final: bool) {
        if !is_final {
            return;
        }
        if self.index == self.word.len() {
            self.whole = true;
        } else {
            self.paused = Some(point);
        }
    }

    fn pop_edge(&mut self) -> bool {
        false
    }
}
