use std::fmt;
use std::num::NonZeroU32;

use crate::errors::{DawgError, Result};

/// Marks a position where a word ends. At the start of a node line (followed by
/// [`EDGE_SEPARATOR`]) it marks the node itself as final; inside an edge label it
/// marks a word ending after the preceding character.
pub const FINAL_MARKER: char = '|';
/// Separates the edges of a node in the text serialization.
pub const EDGE_SEPARATOR: char = '_';
/// Separates an edge label from the id of the node it leads to.
pub const ID_SEPARATOR: char = ':';
/// Characters that may never occur in a dictionary word.
pub const RESERVED_CHARS: [char; 4] = [EDGE_SEPARATOR, FINAL_MARKER, ID_SEPARATOR, '\n'];

/// Returns the first reserved character in `word`, if any.
pub fn reserved_char(word: &str) -> Option<char> {
    word.chars().find(|ch| RESERVED_CHARS.contains(ch))
}

/// Identity of a node in a loaded graph.
///
/// Ids are positional: a node's id is the line it occupies in the text
/// serialization, so the root is always id 1 and other nodes start at 2. The
/// serialized id `0` means "no node" and is represented as `None` wherever an
/// `Option<NodeId>` appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// The root node, found on the first line.
    pub const ROOT: NodeId = NodeId(NonZeroU32::MIN);

    /// Creates an id from its serialized value. Returns `None` for `0`.
    #[inline]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(NodeId)
    }

    /// The serialized value of this id.
    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0.get() as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outgoing edge: a non-empty label, possibly carrying embedded
/// [`FINAL_MARKER`]s, and the node reached after consuming all of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    label: Box<str>,
    next: Option<NodeId>,
}

impl Edge {
    /// Creates an edge. `next == None` means the edge ends in an implicit final leaf.
    pub fn new(label: impl Into<Box<str>>, next: Option<NodeId>) -> Self {
        Edge {
            label: label.into(),
            next,
        }
    }

    /// The raw label, including any embedded final markers.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The node this edge leads to, or `None` for a final leaf.
    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// The first character of the label.
    #[inline]
    pub fn first_char(&self) -> char {
        // The parser and the builder never produce empty labels.
        self.label.chars().next().unwrap_or_default()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.next.map_or(0, NodeId::get);
        write!(f, "{}{ID_SEPARATOR}{id}", self.label)
    }
}

/// A node of a loaded word graph.
///
/// Nodes are immutable once loaded. The `Display` form is the canonical string
/// used by the text serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphNode {
    word: bool,
    edges: Vec<Edge>,
}

impl GraphNode {
    /// Creates a node from its finality flag and ordered edges.
    pub fn new(word: bool, edges: Vec<Edge>) -> Self {
        GraphNode { word, edges }
    }

    /// True if a word ends exactly at this node.
    #[inline]
    pub fn is_word(&self) -> bool {
        self.word
    }

    /// The outgoing edges, in the order they were serialized.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Parses one line of the text serialization.
    ///
    /// `line_no` is only used for error reporting. Every referenced id is
    /// returned through the edges; resolving them is left to the caller.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let (word, rest) = if line == "|" {
            (true, "")
        } else if let Some(rest) = line.strip_prefix("|_") {
            (true, rest)
        } else {
            (false, line)
        };
        if rest.is_empty() {
            return Ok(GraphNode::new(word, Vec::new()));
        }
        let edges = rest
            .split(EDGE_SEPARATOR)
            .map(|edge| parse_edge(edge, line_no))
            .collect::<Result<Vec<_>>>()?;
        Ok(GraphNode { word, edges })
    }
}

fn parse_edge(edge: &str, line_no: usize) -> Result<Edge> {
    let (label, id) = edge
        .rsplit_once(ID_SEPARATOR)
        .ok_or_else(|| DawgError::format(line_no, format!("edge {edge:?} has no node id")))?;
    if label.is_empty() {
        return Err(DawgError::format(line_no, "empty edge label"));
    }
    if label.starts_with(FINAL_MARKER)
        || label.ends_with(FINAL_MARKER)
        || label.contains("||")
    {
        return Err(DawgError::format(
            line_no,
            format!("misplaced final marker in label {label:?}"),
        ));
    }
    let id: u32 = id
        .parse()
        .map_err(|e| DawgError::format(line_no, format!("bad node id {id:?}: {e}")))?;
    if id == NodeId::ROOT.get() {
        return Err(DawgError::format(line_no, "edge refers to the root node"));
    }
    Ok(Edge::new(label, NodeId::new(id)))
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if self.word {
            f.write_str("|")?;
            sep = "_";
        }
        for edge in &self.edges {
            write!(f, "{sep}{edge}")?;
            sep = "_";
        }
        Ok(())
    }
}

/// Appends the canonical string of a node to `out`.
///
/// `edges` yields each label with the serialized id of its target (`0` for a
/// final leaf). The builder uses the result both as the deduplication key and as
/// the written line.
pub(crate) fn write_signature<'a>(
    out: &mut String,
    word: bool,
    edges: impl IntoIterator<Item = (&'a str, u32)>,
) {
    use std::fmt::Write;
    let mut sep = "";
    if word {
        out.push(FINAL_MARKER);
        sep = "_";
    }
    for (label, id) in edges {
        // Writing to a String cannot fail.
        let _ = write!(out, "{sep}{label}{ID_SEPARATOR}{id}");
        sep = "_";
    }
}
