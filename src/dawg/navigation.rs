//! Generic depth-first traversal of a loaded graph.
//!
//! The walk itself never decides anything: which edges to enter, when to stop
//! and what to record are all delegated to a [`Navigator`]. Every query in this
//! crate (lookup, pattern matching, rack permutations, compound splitting) is a
//! navigator driven by the same [`Navigation`].

use super::dictionary::Graph;
use super::node::{GraphNode, NodeId, FINAL_MARKER};

pub(crate) mod private {
    pub trait Sealed {}
}

/// A traversal policy.
///
/// This trait is sealed; the navigators in
/// [`navigators`](super::navigators) are the complete set.
pub trait Navigator: private::Sealed {
    /// Resumable navigators receive [`accept_resumable`](Navigator::accept_resumable)
    /// calls instead of [`accept`](Navigator::accept).
    const RESUMABLE: bool = false;

    /// May an edge starting with `first` be entered at all?
    fn push_edge(&mut self, first: char) -> bool;

    /// Does the navigator want more characters?
    fn accepting(&self) -> bool;

    /// Consume `ch` if acceptable, updating internal position.
    fn accepts(&mut self, ch: char) -> bool;

    /// The path in `matched` is valid so far; `is_final` tells whether it is also
    /// a complete word.
    fn accept(&mut self, matched: &str, is_final: bool);

    /// Resumable form of [`accept`](Navigator::accept): `point` can be handed to
    /// [`DawgDictionary::resume`](super::dictionary::DawgDictionary::resume) to
    /// continue the walk from this exact position.
    fn accept_resumable(&mut self, point: ResumePoint, is_final: bool) {
        self.accept(point.matched(), is_final)
    }

    /// Leaving an edge. Returning false skips the remaining sibling edges.
    fn pop_edge(&mut self) -> bool;

    /// Called once when the traversal finishes.
    fn done(&mut self) {}
}

/// A saved traversal position, possibly inside an edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumePoint {
    rest: String,
    next: Option<NodeId>,
    matched: String,
}

impl ResumePoint {
    /// The path matched up to this point.
    pub fn matched(&self) -> &str {
        &self.matched
    }

    /// The unconsumed remainder of the current edge label.
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// The node at the end of the current edge.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

pub(crate) struct Navigation<'a, N: Navigator> {
    graph: Option<&'a Graph>,
    nav: &'a mut N,
    resumable: bool,
}

impl<'a, N: Navigator> Navigation<'a, N> {
    pub(crate) fn new(graph: Option<&'a Graph>, nav: &'a mut N) -> Self {
        Navigation {
            graph,
            nav,
            resumable: N::RESUMABLE,
        }
    }

    /// Walks the whole graph from the root.
    pub(crate) fn go(mut self) {
        if let Some(graph) = self.graph {
            let mut matched = String::new();
            self.from_node(graph, graph.root(), &mut matched);
        }
        self.nav.done();
    }

    /// Continues a walk from a saved position.
    pub(crate) fn resume(mut self, point: ResumePoint) {
        if let Some(graph) = self.graph {
            let ResumePoint {
                rest,
                next,
                mut matched,
            } = point;
            self.from_edge(graph, &rest, next, &mut matched);
        }
        self.nav.done();
    }

    fn from_node(&mut self, graph: &'a Graph, node: &'a GraphNode, matched: &mut String) {
        for edge in node.edges() {
            if self.nav.push_edge(edge.first_char()) {
                self.from_edge(graph, edge.label(), edge.next(), matched);
                if !self.nav.pop_edge() {
                    break;
                }
            }
        }
    }

    fn from_edge(
        &mut self,
        graph: &'a Graph,
        label: &str,
        next: Option<NodeId>,
        matched: &mut String,
    ) {
        let base = matched.len();
        let mut rest = label;
        while let Some(ch) = rest.chars().next() {
            if !self.nav.accepting() || !self.nav.accepts(ch) {
                matched.truncate(base);
                return;
            }
            matched.push(ch);
            rest = &rest[ch.len_utf8()..];
            let is_final = match rest.strip_prefix(FINAL_MARKER) {
                Some(after) => {
                    rest = after;
                    true
                }
                None => {
                    rest.is_empty()
                        && next.map_or(true, |id| graph.get(id).is_some_and(GraphNode::is_word))
                }
            };
            if self.resumable {
                let point = ResumePoint {
                    rest: rest.to_string(),
                    next,
                    matched: matched.clone(),
                };
                self.nav.accept_resumable(point, is_final);
            } else {
                self.nav.accept(matched.as_str(), is_final);
            }
        }
        if let Some(node) = next.and_then(|id| graph.get(id)) {
            if self.nav.accepting() {
                self.from_node(graph, node, matched);
            }
        }
        matched.truncate(base);
    }
}
