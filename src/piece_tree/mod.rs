mod edit;
mod lines;

use std::sync::Arc;

use str_indices::lines_crlf;

use crate::builder::EolCounts;
use crate::chunk_buffer::{BufferCursor, ChunkBuffer};
use crate::crlf::{seam_is_break, SplitText};
use crate::eol::{normalize_chunks, EndOfLine, DEFAULT_CHUNK_SIZE};
use crate::iter::Chunks;
use crate::search_cache::{CacheEntry, SearchCache};
use crate::snapshot::Snapshot;
use crate::tree::{Color, NodeId, Piece, RbTree, SENTINEL};
use crate::{Error, Result};

/// A piece tree text buffer.
///
/// The document is the in-order concatenation of the pieces held by an
/// augmented red-black tree.  Pieces point into immutable chunk buffers,
/// plus one append-only "add buffer" (buffer 0) that receives all small
/// inserted text.
///
/// All offsets and lengths are in UTF-16 code units, and lines are
/// numbered from 1.  CR, LF and CRLF each count as one line break.
///
/// Queries that consult the search cache (`line_content()`, and all
/// edits) take `&mut self`.  Everything else takes `&self`.
#[derive(Debug, Clone)]
pub struct PieceTree {
    buffers: Vec<Arc<ChunkBuffer>>,
    tree: RbTree,
    cache: SearchCache,
    last_change_buffer_pos: BufferCursor,
    last_visited_line: Option<(usize, String)>,
    length: usize,
    line_feeds: usize,
    eol: EndOfLine,
    eol_normalized: bool,
    chunk_size: usize,
}

/// A node located by offset: the node, the offset within its piece, and
/// the document offset at which the piece starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct NodeHit {
    pub node: NodeId,
    pub remainder: usize,
    pub node_start: usize,
}

/// A read-only view of one tree node, for diagnostics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub piece: Piece,
    pub color: Color,
    /// Total length of the node's left subtree.
    pub size_left: usize,
    /// Total line feeds of the node's left subtree.
    pub line_feeds_left: usize,
}

impl PieceTree {
    //-----------------------------------------------------------------------
    // Constructors.

    /// Creates an empty `PieceTree`.
    pub fn new() -> Self {
        Self::from_buffers(Vec::new(), EndOfLine::LF, true, DEFAULT_CHUNK_SIZE, 1)
    }

    /// Creates a `PieceTree` holding exactly `text`.
    ///
    /// Unlike the [`PieceTreeBuilder`](crate::PieceTreeBuilder), this
    /// neither strips a byte order mark nor normalizes line breaks.  The
    /// dominant line break style is still detected.
    ///
    /// Runs in O(N) time.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        let buffers: Vec<ChunkBuffer> = SplitText::new(text, DEFAULT_CHUNK_SIZE)
            .map(ChunkBuffer::from_text)
            .collect();
        let eol = EolCounts::from_buffers(&buffers).dominant(EndOfLine::LF);
        Self::from_buffers(buffers, eol, false, DEFAULT_CHUNK_SIZE, 1)
    }

    /// Builds a tree with one piece per non-empty chunk, in order.
    pub(crate) fn from_buffers(
        chunks: Vec<ChunkBuffer>,
        eol: EndOfLine,
        eol_normalized: bool,
        chunk_size: usize,
        cache_capacity: usize,
    ) -> Self {
        let mut buffers = Vec::with_capacity(chunks.len() + 1);
        buffers.push(Arc::new(ChunkBuffer::new()));

        let mut tree = RbTree::new();
        let mut last = SENTINEL;
        for chunk in chunks {
            if chunk.is_empty() {
                continue;
            }
            let piece = Piece::new(
                buffers.len(),
                BufferCursor::new(0, 0),
                chunk.end_cursor(),
                chunk.line_feed_count(),
                chunk.len(),
            );
            buffers.push(Arc::new(chunk));
            last = tree.insert_right(last, piece);
        }

        let mut piece_tree = PieceTree {
            buffers,
            tree,
            cache: SearchCache::new(cache_capacity),
            last_change_buffer_pos: BufferCursor::new(0, 0),
            last_visited_line: None,
            length: 0,
            line_feeds: 0,
            eol,
            eol_normalized,
            chunk_size: chunk_size.max(1),
        };
        piece_tree.compute_buffer_metadata();
        piece_tree
    }

    //-----------------------------------------------------------------------
    // Informational methods.

    /// Total length of the document in UTF-16 code units.
    ///
    /// Runs in O(1) time.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Total number of line breaks in the document, counting CRLF once.
    ///
    /// Runs in O(1) time.
    #[inline]
    pub fn line_feed_count(&self) -> usize {
        self.line_feeds
    }

    /// Number of lines in the document.  Always at least 1.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_feeds + 1
    }

    /// The dominant line break style of the document.
    #[inline]
    pub fn eol(&self) -> EndOfLine {
        self.eol
    }

    /// Whether every line break in the document is known to be
    /// [`eol()`](PieceTree::eol).
    #[inline]
    pub fn is_eol_normalized(&self) -> bool {
        self.eol_normalized
    }

    /// The ceiling on the size of frozen chunk buffers created by large
    /// inserts.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    //-----------------------------------------------------------------------
    // Whole-text access.

    /// Returns the full text of the document.
    ///
    /// Runs in O(N) time.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.length);
        for chunk in self.chunks() {
            text.push_str(chunk);
        }
        text
    }

    /// Creates an iterator over the text of the pieces, in document order.
    ///
    /// Runs in O(log N) time.
    #[inline]
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(self)
    }

    /// Captures the current document into an immutable [`Snapshot`].
    ///
    /// Later edits to the tree never affect the snapshot.  `bom` is
    /// prepended when the snapshot is read.
    ///
    /// The snapshot shares the add buffer.  The first edit after it is
    /// taken moves that buffer into a frozen slot and starts a new one,
    /// which costs O(N) time in the number of pieces but never copies
    /// text.
    ///
    /// Runs in O(N) time in the number of pieces.
    pub fn create_snapshot(&self, bom: &str) -> Snapshot {
        Snapshot::new(
            self.buffers.clone(),
            self.pieces().copied().collect(),
            bom.to_string(),
        )
    }

    /// Rewrites every line break in the document to `eol`.
    ///
    /// The content is regrouped into fresh chunk buffers and the tree is
    /// rebuilt, so existing piece and buffer indices are invalidated.
    ///
    /// Runs in O(N) time.
    pub fn normalize_eol(&mut self, eol: EndOfLine) {
        let buffers = normalize_chunks(self.chunks(), eol, self.chunk_size);
        tracing::debug!(
            ?eol,
            chunks = buffers.len(),
            "normalized line breaks of piece tree"
        );
        *self = Self::from_buffers(buffers, eol, true, self.chunk_size, self.cache.capacity());
    }

    //-----------------------------------------------------------------------
    // Diagnostics.

    /// Number of pieces in the document.
    #[inline]
    pub fn piece_count(&self) -> usize {
        self.tree.len()
    }

    /// Iterates over the pieces in document order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.tree.iter().map(move |id| self.tree.piece(id))
    }

    /// Iterates over the tree nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeSummary> + '_ {
        self.tree.iter().map(move |id| {
            let node = self.tree.node(id);
            NodeSummary {
                piece: node.piece,
                color: node.color,
                size_left: node.size_left,
                line_feeds_left: node.lf_left,
            }
        })
    }

    /// Number of chunk buffers, including the add buffer.
    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// The chunk buffer at `index`.  Index 0 is the add buffer.
    #[inline]
    pub fn buffer(&self, index: usize) -> Option<&ChunkBuffer> {
        self.buffers.get(index).map(|b| &**b)
    }

    /// All chunk buffers, including the add buffer at index 0.
    #[inline]
    pub fn buffers(&self) -> &[Arc<ChunkBuffer>] {
        &self.buffers
    }

    /// Checks every structural invariant of the tree.
    ///
    /// This covers the red-black and aggregate invariants of the tree
    /// itself, the consistency of each piece with its buffer, the absence
    /// of CRLF pairs split across pieces, the cached totals, and the
    /// search cache.  Returns `Err(IntegrityViolation)` describing the
    /// first problem found.
    ///
    /// Runs in O(N) time.
    pub fn check_integrity(&self) -> Result<()> {
        self.integrity().map_err(Error::IntegrityViolation)
    }

    /// Like [`check_integrity()`](PieceTree::check_integrity), but panics
    /// on a violation.
    #[track_caller]
    pub fn assert_integrity(&self) {
        if let Err(e) = self.check_integrity() {
            panic!("{}", e);
        }
    }

    fn integrity(&self) -> std::result::Result<(), String> {
        for (i, buffer) in self.buffers.iter().enumerate() {
            buffer
                .check_line_starts()
                .map_err(|e| format!("buffer {}: {}", i, e))?;
        }
        self.tree.check_invariants()?;

        let mut prev_text: Option<&str> = None;
        let mut total_len = 0;
        let mut total_lf = 0;
        for piece in self.pieces() {
            let buffer = self
                .buffers
                .get(piece.buffer_index)
                .ok_or_else(|| format!("piece refers to missing buffer {}", piece.buffer_index))?;
            if piece.length == 0 {
                return Err("empty piece left in the tree".into());
            }
            let start = buffer
                .offset_of(piece.start)
                .map_err(|_| format!("piece start {:?} is outside its buffer", piece.start))?;
            let end = buffer
                .offset_of(piece.end)
                .map_err(|_| format!("piece end {:?} is outside its buffer", piece.end))?;
            if end < start || end - start != piece.length {
                return Err(format!(
                    "piece length {} does not match its cursors {:?}..{:?}",
                    piece.length, piece.start, piece.end
                ));
            }
            let text = buffer
                .slice(piece.start, piece.end)
                .map_err(|_| "piece cursors are not slicable".to_string())?;
            let breaks = lines_crlf::count_breaks(text);
            if breaks != piece.line_feed_count {
                return Err(format!(
                    "piece caches {} line feeds, its text has {}",
                    piece.line_feed_count, breaks
                ));
            }
            if let Some(prev) = prev_text {
                if !seam_is_break(prev, text) {
                    return Err("CRLF pair split across two pieces".into());
                }
            }
            prev_text = Some(text);
            total_len += piece.length;
            total_lf += piece.line_feed_count;
        }

        if total_len != self.length || total_lf != self.line_feeds {
            return Err(format!(
                "cached totals ({}, {}) differ from the pieces ({}, {})",
                self.length, self.line_feeds, total_len, total_lf
            ));
        }

        for entry in self.cache.entries() {
            if !self.tree.is_live(entry.node) || self.tree.offset_of(entry.node) != entry.start_offset
            {
                return Err("stale search cache entry".into());
            }
        }

        Ok(())
    }

    //-----------------------------------------------------------------------
    // Internal utilities.

    #[inline(always)]
    fn buffer_of(&self, piece: &Piece) -> &ChunkBuffer {
        &self.buffers[piece.buffer_index]
    }

    /// The text of a piece.
    #[inline]
    pub(crate) fn piece_text(&self, piece: &Piece) -> &str {
        self.buffer_of(piece)
            .text_between_cursors(piece.start, piece.end)
    }

    pub(crate) fn tree(&self) -> &RbTree {
        &self.tree
    }

    /// Cursor `remainder` code units into the piece of `node`.
    fn position_in_buffer(&self, node: NodeId, remainder: usize) -> BufferCursor {
        let piece = self.tree.piece(node);
        let buffer = self.buffer_of(piece);
        let offset = buffer.offset_of_unchecked(piece.start) + remainder;
        buffer.cursor_in_lines(offset, piece.start.line, piece.end.line)
    }

    /// Builds a piece over `[start, end)` of a buffer, computing its
    /// length and line feeds.
    fn make_piece(&self, buffer_index: usize, start: BufferCursor, end: BufferCursor) -> Piece {
        let buffer = &self.buffers[buffer_index];
        Piece::new(
            buffer_index,
            start,
            end,
            buffer.line_feeds_between(start, end),
            buffer.offset_of_unchecked(end) - buffer.offset_of_unchecked(start),
        )
    }

    /// Finds the node containing `offset` without touching the cache.
    ///
    /// An offset on the seam between two pieces may resolve to either
    /// of them.  Returns `None` only for an empty tree or an offset past
    /// the end.
    pub(crate) fn find_node(&self, mut offset: usize) -> Option<NodeHit> {
        let mut x = self.tree.root();
        let mut node_start = 0;
        while !x.is_sentinel() {
            let node = self.tree.node(x);
            if node.size_left > offset {
                x = node.left;
            } else if node.size_left + node.piece.length >= offset {
                node_start += node.size_left;
                return Some(NodeHit {
                    node: x,
                    remainder: offset - node.size_left,
                    node_start,
                });
            } else {
                offset -= node.size_left + node.piece.length;
                node_start += node.size_left + node.piece.length;
                x = node.right;
            }
        }
        None
    }

    /// Like [`find_node()`](PieceTree::find_node), but consults and
    /// updates the search cache.
    pub(crate) fn node_at(&mut self, offset: usize) -> Option<NodeHit> {
        if let Some(entry) = self.cache.get_by_offset(&self.tree, offset) {
            return Some(NodeHit {
                node: entry.node,
                remainder: offset - entry.start_offset,
                node_start: entry.start_offset,
            });
        }
        let hit = self.find_node(offset)?;
        self.cache.remember(CacheEntry {
            node: hit.node,
            start_offset: hit.node_start,
            start_line: None,
        });
        Some(hit)
    }

    /// Returns `Err(NonCharBoundary)` if `offset` splits a surrogate pair.
    pub(crate) fn check_char_boundary(&self, offset: usize) -> Result<()> {
        if offset == 0 || offset >= self.length {
            return Ok(());
        }
        if let Some(hit) = self.find_node(offset) {
            let piece = self.tree.piece(hit.node);
            if hit.remainder > 0 && hit.remainder < piece.length {
                let buffer = self.buffer_of(piece);
                let buffer_offset = buffer.offset_of_unchecked(piece.start) + hit.remainder;
                if !buffer.is_char_boundary(buffer_offset) {
                    return Err(Error::NonCharBoundary);
                }
            }
        }
        Ok(())
    }

    /// Refreshes the cached document totals from the tree.
    fn compute_buffer_metadata(&mut self) {
        let root = self.tree.root();
        self.length = self.tree.subtree_len(root);
        self.line_feeds = self.tree.subtree_line_feeds(root);
    }

    /// Whether a CRLF pair can possibly be split by an edit.
    #[inline]
    fn should_check_crlf(&self) -> bool {
        !(self.eol_normalized && self.eol == EndOfLine::LF)
    }
}

//==============================================================
// Comparison and conversion impls.

impl Default for PieceTree {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PieceTree {
    #[inline]
    fn from(text: &str) -> Self {
        PieceTree::from_str(text)
    }
}

impl From<String> for PieceTree {
    #[inline]
    fn from(text: String) -> Self {
        PieceTree::from_str(&text)
    }
}

impl std::fmt::Display for PieceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl PartialEq<PieceTree> for PieceTree {
    fn eq(&self, other: &PieceTree) -> bool {
        self.length == other.length
            && self
                .chunks()
                .flat_map(str::bytes)
                .eq(other.chunks().flat_map(str::bytes))
    }
}

impl Eq for PieceTree {}

impl PartialEq<str> for PieceTree {
    fn eq(&self, other: &str) -> bool {
        let mut rest = other.as_bytes();
        for chunk in self.chunks() {
            let chunk = chunk.as_bytes();
            if rest.len() < chunk.len() || &rest[..chunk.len()] != chunk {
                return false;
            }
            rest = &rest[chunk.len()..];
        }
        rest.is_empty()
    }
}

impl<'a> PartialEq<&'a str> for PieceTree {
    #[inline]
    fn eq(&self, other: &&'a str) -> bool {
        *self == **other
    }
}

impl PartialEq<String> for PieceTree {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        *self == *other.as_str()
    }
}

impl PartialEq<PieceTree> for str {
    #[inline]
    fn eq(&self, other: &PieceTree) -> bool {
        *other == *self
    }
}

impl<'a> PartialEq<PieceTree> for &'a str {
    #[inline]
    fn eq(&self, other: &PieceTree) -> bool {
        *other == **self
    }
}

//==============================================================
