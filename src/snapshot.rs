use std::sync::Arc;

use crate::chunk_buffer::ChunkBuffer;
use crate::tree::Piece;

/// An immutable, point-in-time copy of a `PieceTree`'s document.
///
/// A snapshot shares the tree's chunk buffers rather than copying text,
/// and is unaffected by any later edit of the tree: frozen buffers never
/// change, and the add buffer is copied on write while a snapshot still
/// holds it.
///
/// Snapshots are `Send` and `Sync`, so they can be handed to another
/// thread, e.g. to save a document in the background.
///
/// # Example
/// ```
/// # use piecetree::PieceTree;
/// let mut tree = PieceTree::from_str("Hello");
/// let snapshot = tree.create_snapshot("");
/// tree.insert(5, " world").unwrap();
///
/// assert_eq!(snapshot.read(), "Hello");
/// assert_eq!(tree, "Hello world");
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot {
    buffers: Vec<Arc<ChunkBuffer>>,
    pieces: Vec<Piece>,
    bom: String,
}

impl Snapshot {
    pub(crate) fn new(buffers: Vec<Arc<ChunkBuffer>>, pieces: Vec<Piece>, bom: String) -> Self {
        Snapshot {
            buffers,
            pieces,
            bom,
        }
    }

    /// Returns the byte order mark followed by the captured text.
    ///
    /// Runs in O(N) time.
    pub fn read(&self) -> String {
        let mut text = String::with_capacity(self.bom.len() + self.len());
        for chunk in self.chunks() {
            text.push_str(chunk);
        }
        text
    }

    /// Iterates over the captured text: the byte order mark first, if
    /// there is one, then the text of each piece.
    pub fn chunks(&self) -> impl Iterator<Item = &str> + '_ {
        let bom = Some(self.bom.as_str()).filter(|bom| !bom.is_empty());
        bom.into_iter().chain(self.pieces.iter().map(move |piece| {
            self.buffers[piece.buffer_index].text_between_cursors(piece.start, piece.end)
        }))
    }

    /// Length of the captured text in UTF-16 code units, not counting
    /// the byte order mark.
    pub fn len(&self) -> usize {
        self.pieces.iter().map(|p| p.length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    #[inline]
    pub fn bom(&self) -> &str {
        &self.bom
    }

    #[inline]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }
}

//=============================================================
