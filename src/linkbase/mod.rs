//! The link base: every note of a run, indexed by id and name, and the graph of links between
//! them.
//!
//! [`NoteIndex`] is built once from the parsed notes and never changes afterwards.
//! [`LinkGraph::build`] resolves every outgoing link against it; the backlinks of a note are the
//! incoming edges of its node.

pub mod graph;
pub mod index;

pub use graph::{broken_links, BacklinkSet, BrokenLink, LinkGraph};
pub use index::{normalize_name, MatchKind, NoteIndex, NoteKey, Resolution};
