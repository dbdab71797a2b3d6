/// Incremental graph builder and the batch word-list merger.
pub mod builder;
/// Loaded graphs and the queries run against them.
pub mod dictionary;
/// The generic traversal and the navigator contract.
pub mod navigation;
/// Lookup, pattern, rack and compound navigators.
pub mod navigators;
/// Node model and the text serialization grammar.
pub mod node;

pub use builder::{build_dawg, BuildStats, Builder, BuilderConfig, BuiltDawg, DawgBuilder};
pub use dictionary::DawgDictionary;
pub use navigation::{Navigator, ResumePoint};
pub use node::{Edge, GraphNode, NodeId};
