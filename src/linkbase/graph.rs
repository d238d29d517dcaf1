use crate::{
    codec::{diagnostic::Diagnostic, section::BacklinkEntry},
    linkbase::index::{NoteIndex, NoteKey, Resolution},
};
use petgraph::{graphmap::DiGraphMap, Direction};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf};

/// Directed graph of resolved links between notes. An edge `a -> b` means `a` links to `b`; its
/// weight counts how often.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    graph: DiGraphMap<NoteKey, u32>,
    include_self_links: bool,
}

/// A link whose target matched no note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrokenLink {
    pub source: PathBuf,
    pub token: String,
}

/// The notes linking to one target, deduplicated and in rendering order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklinkSet {
    pub target: NoteKey,
    pub sources: Vec<NoteKey>,
}

impl BacklinkSet {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// The bullets of the target's backlink section.
    pub fn entries(&self, index: &NoteIndex) -> Vec<BacklinkEntry> {
        self.sources
            .iter()
            .filter_map(|key| index.get(*key))
            .map(|note| note.backlink_entry())
            .collect()
    }
}

impl LinkGraph {
    /// Resolves every outgoing link of every note in `index`.
    ///
    /// Unresolved and ambiguous links are dropped from the graph and returned as diagnostics, one
    /// per distinct source and link text. Every note is a node, linked or not.
    pub fn build(index: &NoteIndex, include_self_links: bool) -> (LinkGraph, Vec<Diagnostic>) {
        let mut graph: DiGraphMap<NoteKey, u32> = DiGraphMap::with_capacity(index.len(), 0);
        let mut diagnostics = Vec::new();
        let mut reported: BTreeSet<(NoteKey, &str)> = BTreeSet::new();

        for key in index.keys() {
            graph.add_node(key);
        }

        for (source, note) in index.notes() {
            for token in note.links.iter() {
                match index.resolve(token) {
                    Resolution::Resolved { key: target, by } => {
                        tracing::trace!(
                            "[LinkGraph] {} -> {} via {:?} ([[{}]])",
                            source,
                            target,
                            by,
                            token.raw
                        );
                        match graph.edge_weight_mut(source, target) {
                            Some(count) => *count += 1,
                            None => {
                                graph.add_edge(source, target, 1);
                            }
                        }
                    }
                    Resolution::Unresolved => {
                        if reported.insert((source, token.raw.as_str())) {
                            diagnostics.push(Diagnostic::UnresolvedLink {
                                source: note.path.clone(),
                                token: token.raw.clone(),
                            });
                        }
                    }
                    Resolution::Ambiguous(candidates) => {
                        if reported.insert((source, token.raw.as_str())) {
                            diagnostics.push(Diagnostic::AmbiguousLink {
                                source: note.path.clone(),
                                token: token.raw.clone(),
                                candidates: candidates
                                    .iter()
                                    .filter_map(|k| index.get(*k))
                                    .map(|n| n.path.clone())
                                    .collect(),
                            });
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "[LinkGraph] {} notes, {} linked pairs, {} link diagnostics",
            graph.node_count(),
            graph.edge_count(),
            diagnostics.len()
        );

        (
            LinkGraph {
                graph,
                include_self_links,
            },
            diagnostics,
        )
    }

    fn counts_as_backlink(&self, source: NoteKey, target: NoteKey) -> bool {
        self.include_self_links || source != target
    }

    /// The notes linking to `target`, ordered by [`NoteIndex::sort_key`].
    pub fn backlinks(&self, index: &NoteIndex, target: NoteKey) -> BacklinkSet {
        let mut sources: Vec<NoteKey> = if self.graph.contains_node(target) {
            self.graph
                .neighbors_directed(target, Direction::Incoming)
                .filter(|source| self.counts_as_backlink(*source, target))
                .collect()
        } else {
            Vec::new()
        };
        sources.sort_by(|a, b| index.sort_key(*a).cmp(&index.sort_key(*b)));
        sources.dedup();
        BacklinkSet { target, sources }
    }

    /// The notes `source` links to, in key order.
    pub fn outgoing(&self, source: NoteKey) -> Vec<NoteKey> {
        if !self.graph.contains_node(source) {
            return Vec::new();
        }
        let mut targets: Vec<NoteKey> = self
            .graph
            .neighbors_directed(source, Direction::Outgoing)
            .collect();
        targets.sort();
        targets
    }

    /// How many times `source` links to `target`.
    pub fn link_count(&self, source: NoteKey, target: NoteKey) -> u32 {
        self.graph.edge_weight(source, target).copied().unwrap_or(0)
    }

    /// Notes no other note links to.
    pub fn orphans(&self) -> Vec<NoteKey> {
        let mut orphans: Vec<NoteKey> = self
            .graph
            .nodes()
            .filter(|node| {
                !self
                    .graph
                    .neighbors_directed(*node, Direction::Incoming)
                    .any(|source| source != *node)
            })
            .collect();
        orphans.sort();
        orphans
    }
}

/// Unresolved links among `diagnostics`, sorted by source then link text.
pub fn broken_links(diagnostics: &[Diagnostic]) -> Vec<BrokenLink> {
    let mut broken: Vec<BrokenLink> = diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::UnresolvedLink { source, token } => Some(BrokenLink {
                source: source.clone(),
                token: token.clone(),
            }),
            _ => None,
        })
        .collect();
    broken.sort();
    broken
}
