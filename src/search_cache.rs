use std::collections::VecDeque;

use crate::tree::{NodeId, RbTree};

/// A remembered tree node together with where it starts in the document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct CacheEntry {
    pub node: NodeId,
    pub start_offset: usize,
    /// One-based number of the line the node's first code unit is on, when
    /// known.
    pub start_line: Option<usize>,
}

/// A small bounded set of recently located nodes.
///
/// Editing tends to hit the same node many times in a row, so lookups
/// check here before descending the tree.  Entries are searched newest
/// first.  The cache never owns nodes: it is passed the tree it indexes
/// on every lookup and drops entries whose node is no longer live.
#[derive(Debug, Clone)]
pub(crate) struct SearchCache {
    limit: usize,
    entries: VecDeque<CacheEntry>,
}

impl SearchCache {
    pub fn new(limit: usize) -> Self {
        SearchCache {
            limit,
            entries: VecDeque::with_capacity(limit),
        }
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    /// Finds a node whose span `[start, start + len]` contains `offset`.
    pub fn get_by_offset(&self, tree: &RbTree, offset: usize) -> Option<CacheEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| {
                tree.is_live(e.node)
                    && e.start_offset <= offset
                    && offset <= e.start_offset + tree.piece(e.node).length
            })
            .copied()
    }

    /// Finds a node inside which line `line_number` begins, i.e. with
    /// `start_line < line_number <= start_line + line_feeds`.
    pub fn get_by_line(&self, tree: &RbTree, line_number: usize) -> Option<CacheEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| match e.start_line {
                Some(start_line) => {
                    tree.is_live(e.node)
                        && start_line < line_number
                        && line_number <= start_line + tree.piece(e.node).line_feed_count
                }
                None => false,
            })
            .copied()
    }

    /// Records a node, evicting the oldest entry when full.
    pub fn remember(&mut self, entry: CacheEntry) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Drops entries that start at or after `offset`, and entries whose
    /// node has been detached.
    pub fn invalidate_from_offset(&mut self, tree: &RbTree, offset: usize) {
        self.entries
            .retain(|e| tree.is_live(e.node) && e.start_offset < offset);
    }

    /// Drops every entry for `node`.  Must be called before the node's
    /// slot can be reused.
    pub fn forget_node(&mut self, node: NodeId) {
        self.entries.retain(|e| e.node != node);
    }

    /// Drops entries whose recorded start no longer matches the tree.
    pub fn validate(&mut self, tree: &RbTree) {
        self.entries.retain(|e| {
            tree.is_live(e.node)
                && tree.offset_of(e.node) == e.start_offset
                && e.start_line
                    .map_or(true, |line| tree.line_feeds_before(e.node) + 1 == line)
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//=============================================================
