//! Iterators over a `PieceTree`'s data.
//!
//! The text of a piece tree is stored in pieces, each of which refers to
//! a contiguous run of one chunk buffer.  The [`Chunks`] iterator yields
//! the text of those pieces in document order, which is the cheapest way
//! to stream a whole document out of a tree, e.g. to write it to a file:
//!
//! ```
//! # use piecetree::PieceTree;
//! let mut tree = PieceTree::from_str("Hello world!");
//! tree.insert(5, ",").unwrap();
//!
//! let mut text = String::new();
//! for chunk in tree.chunks() {
//!     text.push_str(chunk);
//! }
//! assert_eq!(text, "Hello, world!");
//! ```

use crate::piece_tree::PieceTree;
use crate::tree::InOrder;

/// An iterator over the text of a `PieceTree`'s pieces.
///
/// Chunks are never empty, and a CRLF pair is never split across two
/// chunks.
#[derive(Clone)]
pub struct Chunks<'a> {
    tree: &'a PieceTree,
    nodes: InOrder<'a>,
    remaining: usize,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(tree: &'a PieceTree) -> Chunks<'a> {
        Chunks {
            tree,
            nodes: tree.tree().iter(),
            remaining: tree.piece_count(),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let id = self.nodes.next()?;
        self.remaining -= 1;
        let tree = self.tree;
        Some(tree.piece_text(tree.tree().piece(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> ExactSizeIterator for Chunks<'a> {}

impl<'a> std::fmt::Debug for Chunks<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunks")
            .field("remaining", &self.remaining)
            .finish()
    }
}

//===========================================================
