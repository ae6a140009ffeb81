use std::sync::Arc;

use str_indices::utf16;

use super::{NodeHit, PieceTree};
use crate::chunk_buffer::{BufferCursor, ChunkBuffer};
use crate::crlf::SplitText;
use crate::eol::{has_foreign_line_break, EndOfLine};
use crate::tree::{NodeId, Piece, SENTINEL};
use crate::{ends_with_cr, starts_with_lf, Error, Result};

impl PieceTree {
    //-----------------------------------------------------------------------
    // Edit methods

    /// Inserts `text` at UTF-16 offset `offset`.
    ///
    /// Runs in O(M + log N) time, where N is the number of pieces and M
    /// is the length of `text`.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `offset > len()`.
    /// - `NonCharBoundary` if `offset` splits a surrogate pair.
    ///
    /// # Example
    ///
    /// ```
    /// # use piecetree::PieceTree;
    /// let mut tree = PieceTree::from_str("ac");
    /// tree.insert(1, "b").unwrap();
    /// assert_eq!(tree, "abc");
    /// ```
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        if offset > self.length {
            return Err(Error::OutOfRange);
        }
        self.check_char_boundary(offset)?;
        if text.is_empty() {
            return Ok(());
        }

        if self.eol_normalized
            && (has_foreign_line_break(text, self.eol) || self.is_inside_crlf(offset))
        {
            self.eol_normalized = false;
        }
        self.last_visited_line = None;
        self.unshare_add_buffer();

        if self.tree.is_empty() {
            let pieces = self.create_new_pieces(text);
            let mut last = SENTINEL;
            for piece in pieces {
                last = self.tree.insert_right(last, piece);
            }
        } else {
            let hit = self.node_at(offset).ok_or(Error::OutOfRange)?;
            self.insert_at(hit, text);
        }

        self.finish_edit(offset);
        Ok(())
    }

    /// Removes `len` code units starting at UTF-16 offset `offset`.
    ///
    /// Runs in O(K log N) time, where K is the number of pieces touched.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `offset + len > len()`.
    /// - `NonCharBoundary` if either end of the range splits a surrogate
    ///   pair.
    pub fn delete(&mut self, offset: usize, len: usize) -> Result<()> {
        let end = offset.checked_add(len).ok_or(Error::OutOfRange)?;
        if end > self.length {
            return Err(Error::OutOfRange);
        }
        self.check_char_boundary(offset)?;
        self.check_char_boundary(end)?;
        if len == 0 {
            return Ok(());
        }
        self.last_visited_line = None;

        let start_hit = self.node_at(offset).ok_or(Error::OutOfRange)?;
        let end_hit = self.find_node(end).ok_or(Error::OutOfRange)?;

        if start_hit.node == end_hit.node {
            self.delete_within_node(start_hit, end_hit, len);
        } else {
            self.delete_across_nodes(start_hit, end_hit);
        }

        self.finish_edit(offset);
        if self.eol_normalized && self.eol == EndOfLine::CRLF && self.has_lone_break_at(offset) {
            self.eol_normalized = false;
        }
        Ok(())
    }

    /// Replaces `len` code units starting at `offset` with `text`.
    ///
    /// Equivalent to a [`delete()`](PieceTree::delete) followed by an
    /// [`insert()`](PieceTree::insert), except that the whole range is
    /// validated before anything is changed.
    pub fn replace(&mut self, offset: usize, len: usize, text: &str) -> Result<()> {
        let end = offset.checked_add(len).ok_or(Error::OutOfRange)?;
        if end > self.length {
            return Err(Error::OutOfRange);
        }
        self.check_char_boundary(offset)?;
        self.check_char_boundary(end)?;

        self.delete(offset, len)?;
        self.insert(offset, text)
    }

    //-----------------------------------------------------------------------
    // Insertion internals.

    fn insert_at(&mut self, hit: NodeHit, text: &str) {
        let NodeHit {
            node, remainder, ..
        } = hit;
        let piece = *self.tree.piece(node);

        let append_candidate = if remainder == piece.length {
            node
        } else if remainder == 0 {
            self.tree.prev(node)
        } else {
            SENTINEL
        };
        if !append_candidate.is_sentinel() && self.can_append_to(append_candidate, text) {
            self.append_to_node(append_candidate, text);
            let next = self.tree.next(append_candidate);
            self.repair(append_candidate, next);
            return;
        }

        if remainder == 0 {
            let prev = self.tree.prev(node);
            let pieces = self.create_new_pieces(text);
            let (first, last) = self.link_left_of(node, pieces);
            self.repair(prev, first);
            self.repair(last, node);
        } else if remainder == piece.length {
            let next = self.tree.next(node);
            let pieces = self.create_new_pieces(text);
            let (first, last) = self.link_right_of(node, pieces);
            self.repair(node, first);
            self.repair(last, next);
        } else {
            // Split the piece around the insertion point.
            let split = self.position_in_buffer(node, remainder);
            let right_piece = self.make_piece(piece.buffer_index, split, piece.end);
            self.delete_node_tail(node, split);

            let pieces = self.create_new_pieces(text);
            let (first, last) = self.link_right_of(node, pieces);
            let right = self.tree.insert_right(last, right_piece);
            self.repair(node, first);
            self.repair(last, right);
        }
    }

    /// Links `pieces` in order immediately before `anchor`, returning the
    /// first and last new nodes.
    fn link_left_of(&mut self, anchor: NodeId, pieces: Vec<Piece>) -> (NodeId, NodeId) {
        let mut pieces = pieces.into_iter();
        let first = match pieces.next() {
            Some(piece) => self.tree.insert_left(anchor, piece),
            None => return (SENTINEL, SENTINEL),
        };
        let mut last = first;
        for piece in pieces {
            last = self.tree.insert_right(last, piece);
        }
        (first, last)
    }

    /// Links `pieces` in order immediately after `anchor`, returning the
    /// first and last new nodes.
    fn link_right_of(&mut self, anchor: NodeId, pieces: Vec<Piece>) -> (NodeId, NodeId) {
        let mut first = SENTINEL;
        let mut last = anchor;
        for piece in pieces {
            last = self.tree.insert_right(last, piece);
            if first.is_sentinel() {
                first = last;
            }
        }
        (first, last)
    }

    /// Whether `text` can be typed straight onto the end of `node`'s
    /// piece: the piece must end exactly where the add buffer ends.
    fn can_append_to(&self, node: NodeId, text: &str) -> bool {
        let piece = self.tree.piece(node);
        piece.buffer_index == 0
            && piece.end == self.last_change_buffer_pos
            && utf16::count(text) < self.chunk_size
    }

    /// Moves an add buffer that a snapshot or clone still shares into a
    /// frozen slot, and starts a fresh one, so that the next write does
    /// not copy it.
    ///
    /// Runs in O(N) time in the number of pieces.
    fn unshare_add_buffer(&mut self) {
        if Arc::get_mut(&mut self.buffers[0]).is_some() {
            return;
        }

        let frozen = std::mem::take(&mut self.buffers[0]);
        let index = self.buffers.len();
        tracing::trace!(len = frozen.len(), index, "retiring shared add buffer");
        self.buffers.push(frozen);

        let retired: Vec<NodeId> = self
            .tree
            .iter()
            .filter(|&id| self.tree.piece(id).buffer_index == 0)
            .collect();
        for id in retired {
            let mut piece = *self.tree.piece(id);
            piece.buffer_index = index;
            self.tree.replace_piece(id, piece);
        }
        self.last_change_buffer_pos = BufferCursor::new(0, 0);
    }

    fn append_to_node(&mut self, node: NodeId, text: &str) {
        let start = self.tree.piece(node).start;
        let add = Arc::make_mut(&mut self.buffers[0]);
        add.append(text);
        let end = add.end_cursor();
        self.last_change_buffer_pos = end;

        let piece = self.make_piece(0, start, end);
        self.tree.replace_piece(node, piece);
    }

    /// Stores `text` and returns the pieces covering it.
    ///
    /// Text longer than the chunk size becomes a run of new frozen
    /// buffers.  Anything shorter is appended to the add buffer.
    fn create_new_pieces(&mut self, text: &str) -> Vec<Piece> {
        if utf16::count(text) > self.chunk_size {
            let mut pieces = Vec::new();
            for segment in SplitText::new(text, self.chunk_size) {
                let buffer = ChunkBuffer::from_text(segment);
                pieces.push(Piece::new(
                    self.buffers.len(),
                    BufferCursor::new(0, 0),
                    buffer.end_cursor(),
                    buffer.line_feed_count(),
                    buffer.len(),
                ));
                self.buffers.push(Arc::new(buffer));
            }
            tracing::trace!(
                buffers = pieces.len(),
                chunk_size = self.chunk_size,
                "stored large insert in frozen buffers"
            );
            return pieces;
        }

        let add = Arc::make_mut(&mut self.buffers[0]);
        if ends_with_cr(add.as_str()) && starts_with_lf(text) {
            // Keep the add buffer's line index from fusing the previous
            // piece's '\r' with this '\n'.
            tracing::trace!("writing add buffer placeholder");
            add.append("_");
        }
        let start = add.end_cursor();
        add.append(text);
        let end = add.end_cursor();
        self.last_change_buffer_pos = end;

        vec![self.make_piece(0, start, end)]
    }

    //-----------------------------------------------------------------------
    // Deletion internals.

    fn delete_within_node(&mut self, start_hit: NodeHit, end_hit: NodeHit, len: usize) {
        let node = start_hit.node;
        let piece = *self.tree.piece(node);

        if start_hit.remainder == 0 {
            if len == piece.length {
                let prev = self.tree.prev(node);
                let next = self.tree.next(node);
                self.remove_node(node);
                self.repair(prev, next);
                return;
            }
            let head_end = self.position_in_buffer(node, end_hit.remainder);
            self.delete_node_head(node, head_end);
            let prev = self.tree.prev(node);
            self.repair(prev, node);
            return;
        }

        if end_hit.remainder == piece.length {
            let tail_start = self.position_in_buffer(node, start_hit.remainder);
            self.delete_node_tail(node, tail_start);
            let next = self.tree.next(node);
            self.repair(node, next);
            return;
        }

        // Interior range: keep the head in place and re-add the tail as a
        // new node.
        let tail_start = self.position_in_buffer(node, start_hit.remainder);
        let tail_end = self.position_in_buffer(node, end_hit.remainder);
        let right_piece = self.make_piece(piece.buffer_index, tail_end, piece.end);
        self.delete_node_tail(node, tail_start);
        let right = self.tree.insert_right(node, right_piece);
        self.repair(node, right);
    }

    fn delete_across_nodes(&mut self, start_hit: NodeHit, end_hit: NodeHit) {
        let start_node = start_hit.node;
        let end_node = end_hit.node;
        let mut doomed = Vec::new();

        let tail_start = self.position_in_buffer(start_node, start_hit.remainder);
        self.delete_node_tail(start_node, tail_start);
        if self.tree.piece(start_node).length == 0 {
            doomed.push(start_node);
        }

        let head_end = self.position_in_buffer(end_node, end_hit.remainder);
        self.delete_node_head(end_node, head_end);
        if self.tree.piece(end_node).length == 0 {
            doomed.push(end_node);
        }

        let mut node = self.tree.next(start_node);
        while !node.is_sentinel() && node != end_node {
            doomed.push(node);
            node = self.tree.next(node);
        }

        let prev = if self.tree.piece(start_node).length == 0 {
            self.tree.prev(start_node)
        } else {
            start_node
        };
        for node in doomed {
            self.remove_node(node);
        }

        let next = if prev.is_sentinel() {
            self.tree.first()
        } else {
            self.tree.next(prev)
        };
        self.repair(prev, next);
    }

    /// Cuts the piece of `node` so that it starts at `pos`.
    fn delete_node_head(&mut self, node: NodeId, pos: BufferCursor) {
        let piece = *self.tree.piece(node);
        let new_piece = self.make_piece(piece.buffer_index, pos, piece.end);
        self.tree.replace_piece(node, new_piece);
    }

    /// Cuts the piece of `node` so that it ends at `pos`.
    fn delete_node_tail(&mut self, node: NodeId, pos: BufferCursor) {
        let piece = *self.tree.piece(node);
        let new_piece = self.make_piece(piece.buffer_index, piece.start, pos);
        self.tree.replace_piece(node, new_piece);
    }

    fn remove_node(&mut self, node: NodeId) {
        self.cache.forget_node(node);
        self.tree.remove(node);
    }

    //-----------------------------------------------------------------------
    // CRLF repair.

    /// Repairs the seam between two adjacent nodes if it splits a CRLF.
    fn repair(&mut self, left: NodeId, right: NodeId) {
        if left.is_sentinel() || right.is_sentinel() || !self.should_check_crlf() {
            return;
        }
        let l = self.tree.piece(left);
        let r = self.tree.piece(right);
        if l.length == 0 || r.length == 0 {
            return;
        }
        if self.buffers[l.buffer_index].ends_with_cr_at(l.end)
            && self.buffers[r.buffer_index].starts_with_lf_at(r.start)
        {
            self.fix_crlf(left, right);
        }
    }

    /// Moves a CRLF that is split across `prev` and `next` into a new
    /// piece of its own between them.
    ///
    /// `prev` must end with `\r` and `next` must start with `\n`.  Either
    /// node is removed if it ends up empty.
    pub(crate) fn fix_crlf(&mut self, prev: NodeId, next: NodeId) {
        tracing::trace!("repairing CRLF split across pieces");

        let p = *self.tree.piece(prev);
        let new_end = if p.end.column == 0 {
            let line_starts = self.buffers[p.buffer_index].line_starts();
            let line = p.end.line - 1;
            BufferCursor::new(line, line_starts[p.end.line] - line_starts[line] - 1)
        } else {
            BufferCursor::new(p.end.line, p.end.column - 1)
        };
        let new_prev = self.make_piece(p.buffer_index, p.start, new_end);
        self.tree.replace_piece(prev, new_prev);

        let n = *self.tree.piece(next);
        let new_start = BufferCursor::new(n.start.line + 1, 0);
        let new_next = self.make_piece(n.buffer_index, new_start, n.end);
        self.tree.replace_piece(next, new_next);

        let pieces = self.create_new_pieces("\r\n");
        self.link_right_of(prev, pieces);

        if new_prev.length == 0 {
            self.remove_node(prev);
        }
        if new_next.length == 0 {
            self.remove_node(next);
        }
    }

    //-----------------------------------------------------------------------
    // Bookkeeping.

    /// Whether `offset` sits between the `\r` and `\n` of a CRLF.
    fn is_inside_crlf(&self, offset: usize) -> bool {
        offset > 0
            && self.char_code_at(offset - 1) == Some(b'\r' as u16)
            && self.char_code_at(offset) == Some(b'\n' as u16)
    }

    /// Whether a `\r` or `\n` adjoining `offset` is no longer part of a
    /// CRLF.
    fn has_lone_break_at(&self, offset: usize) -> bool {
        let before = offset.checked_sub(1).and_then(|o| self.char_code_at(o));
        let after = self.char_code_at(offset);
        let cr = Some(b'\r' as u16);
        let lf = Some(b'\n' as u16);
        (before == cr && after != lf) || (after == lf && before != cr)
    }

    fn finish_edit(&mut self, offset: usize) {
        if self.tree.is_empty() {
            self.cache.clear();
        } else {
            self.cache.invalidate_from_offset(&self.tree, offset);
            self.cache.validate(&self.tree);
        }
        self.compute_buffer_metadata();
    }
}

//==============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lf_count(text: &str) -> usize {
        str_indices::lines_crlf::count_breaks(text)
    }

    fn small_tree(text: &str, chunk_size: usize) -> PieceTree {
        PieceTree::from_buffers(
            SplitText::new(text, chunk_size)
                .map(ChunkBuffer::from_text)
                .collect(),
            EndOfLine::LF,
            false,
            chunk_size,
            1,
        )
    }

    #[test]
    fn insert_01() {
        let mut tree = PieceTree::new();
        tree.insert(0, "Hello world").unwrap();
        tree.insert(5, ",").unwrap();
        tree.insert(12, "!").unwrap();
        tree.insert(0, ">> ").unwrap();
        assert_eq!(tree, ">> Hello, world!");
        tree.assert_integrity();
    }

    #[test]
    fn insert_02() {
        let mut tree = PieceTree::from_str("abc");
        assert_eq!(Err(Error::OutOfRange), tree.insert(4, "x"));
        assert_eq!(Ok(()), tree.insert(3, ""));
        assert_eq!(tree, "abc");
    }

    #[test]
    fn insert_surrogate_boundary() {
        let mut tree = PieceTree::from_str("a𝄞b");
        assert_eq!(Err(Error::NonCharBoundary), tree.insert(2, "x"));
        tree.insert(3, "x").unwrap();
        assert_eq!(tree, "a𝄞xb");
        tree.assert_integrity();
    }

    #[test]
    fn insert_splits_piece() {
        let mut tree = PieceTree::from_str("one\ntwo\nthree");
        tree.insert(6, "\n").unwrap();
        assert_eq!(tree, "one\ntw\no\nthree");
        assert_eq!(3, tree.line_feed_count());
        assert_eq!(3, tree.piece_count());
        tree.assert_integrity();
    }

    #[test]
    fn append_reuses_add_buffer() {
        let mut tree = PieceTree::new();
        for (i, c) in "hello".chars().enumerate() {
            tree.insert(i, &c.to_string()).unwrap();
        }
        assert_eq!(tree, "hello");
        assert_eq!(1, tree.piece_count());
        assert_eq!(1, tree.buffer_count());
        assert_eq!(5, tree.buffer(0).unwrap().len());
        tree.assert_integrity();
    }

    #[test]
    fn typing_after_snapshot_starts_fresh_add_buffer() {
        let mut tree = PieceTree::new();
        tree.insert(0, "hello").unwrap();
        let snapshot = tree.create_snapshot("");

        tree.insert(5, "!").unwrap();
        tree.insert(6, "?").unwrap();
        assert_eq!(tree, "hello!?");
        assert_eq!("hello", snapshot.read());
        assert_eq!(2, tree.buffer_count());
        assert_eq!("!?", tree.buffer(0).unwrap().as_str());
        assert_eq!("hello", tree.buffer(1).unwrap().as_str());
        assert_eq!(2, tree.piece_count());

        // Once nothing else shares it, the add buffer is written in place.
        drop(snapshot);
        tree.insert(7, "!").unwrap();
        assert_eq!(tree, "hello!?!");
        assert_eq!(2, tree.buffer_count());
        assert_eq!("!?!", tree.buffer(0).unwrap().as_str());
        tree.assert_integrity();
    }

    #[test]
    fn append_at_start_of_next_piece() {
        let mut tree = PieceTree::from_str("ac");
        tree.insert(1, "b").unwrap();
        // The cursor is now at the start of "c", right after "b".
        tree.insert(2, "b").unwrap();
        assert_eq!(tree, "abbc");
        assert_eq!(3, tree.piece_count());
        tree.assert_integrity();
    }

    #[test]
    fn append_merges_crlf() {
        let mut tree = PieceTree::new();
        tree.insert(0, "a\r").unwrap();
        tree.insert(2, "\nb").unwrap();
        assert_eq!(tree, "a\r\nb");
        assert_eq!(1, tree.line_feed_count());
        assert_eq!(1, tree.piece_count());
        tree.assert_integrity();
    }

    #[test]
    fn interleaved_line_break() {
        let mut tree = PieceTree::from_str("\r\nxx");
        tree.insert(1, "\n").unwrap();
        assert_eq!(tree, "\r\n\nxx");
        assert_eq!(2, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn insert_lf_after_cr() {
        let mut tree = PieceTree::from_str("a\rb");
        tree.insert(2, "\nc").unwrap();
        assert_eq!(tree, "a\r\ncb");
        assert_eq!(1, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn insert_cr_before_lf() {
        let mut tree = PieceTree::from_str("a\nb");
        tree.insert(1, "x\r").unwrap();
        assert_eq!(tree, "ax\r\nb");
        assert_eq!(1, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn placeholder_keeps_pieces_apart() {
        let mut tree = PieceTree::from_str("xy");
        tree.insert(1, "\r").unwrap();
        // Not an append: the new text goes to the front of the tree.
        tree.insert(0, "\n").unwrap();
        assert_eq!(tree, "\nx\ry");
        assert_eq!(2, tree.line_feed_count());
        assert_eq!("\r_\n", tree.buffer(0).unwrap().as_str());
        tree.assert_integrity();
    }

    #[test]
    fn large_insert_is_chunked() {
        let mut tree = small_tree("", 8);
        let text = "0123456789\r\nabcdefghij\r\n";
        tree.insert(0, text).unwrap();
        assert!(tree.piece_count() >= 3);
        assert!(tree.buffer_count() >= 4);
        assert_eq!(tree, text);
        assert_eq!(2, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn delete_01() {
        let mut tree = PieceTree::from_str("Hello, world!");
        tree.delete(5, 7).unwrap();
        assert_eq!(tree, "Hello!");
        tree.delete(0, 6).unwrap();
        assert_eq!(tree, "");
        assert_eq!(0, tree.piece_count());
        tree.assert_integrity();
    }

    #[test]
    fn delete_02() {
        let mut tree = PieceTree::from_str("abc");
        assert_eq!(Err(Error::OutOfRange), tree.delete(2, 2));
        assert_eq!(Err(Error::OutOfRange), tree.delete(usize::MAX, 2));
        assert_eq!(Ok(()), tree.delete(3, 0));
        assert_eq!(tree, "abc");
    }

    #[test]
    fn delete_head_and_tail() {
        let mut tree = PieceTree::from_str("abcdef");
        tree.delete(0, 2).unwrap();
        assert_eq!(tree, "cdef");
        tree.delete(2, 2).unwrap();
        assert_eq!(tree, "cd");
        assert_eq!(1, tree.piece_count());
        tree.assert_integrity();
    }

    #[test]
    fn delete_across_pieces() {
        let mut tree = small_tree("aaaa\nbbbb\ncccc\ndddd", 5);
        assert_eq!(4, tree.piece_count());
        tree.delete(3, 11).unwrap();
        assert_eq!(tree, "aaa\ndddd");
        assert_eq!(1, tree.line_feed_count());
        assert_eq!(3, tree.piece_count());
        tree.assert_integrity();
    }

    #[test]
    fn delete_joins_crlf() {
        let mut tree = PieceTree::from_str("a\rxyz\nb");
        tree.delete(2, 3).unwrap();
        assert_eq!(tree, "a\r\nb");
        assert_eq!(1, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn delete_splits_crlf() {
        let mut tree = PieceTree::from_str("a\r\nb");
        tree.delete(2, 1).unwrap();
        assert_eq!(tree, "a\rb");
        assert_eq!(1, tree.line_feed_count());
        tree.delete(1, 1).unwrap();
        assert_eq!(tree, "ab");
        assert_eq!(0, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn replace_01() {
        let mut tree = PieceTree::from_str("hello world");
        tree.replace(6, 5, "piece tree").unwrap();
        assert_eq!(tree, "hello piece tree");
        assert_eq!(Err(Error::OutOfRange), tree.replace(10, 7, "x"));
        assert_eq!(tree, "hello piece tree");
        tree.assert_integrity();
    }

    #[test]
    fn fix_crlf_01() {
        // Built directly so that the seam is left unrepaired.
        let mut tree = PieceTree::from_buffers(
            vec![ChunkBuffer::from_text("ab\r"), ChunkBuffer::from_text("\ncd")],
            EndOfLine::LF,
            false,
            16,
            1,
        );
        assert!(tree.check_integrity().is_err());
        let first = tree.tree.first();
        let second = tree.tree.next(first);
        tree.fix_crlf(first, second);

        assert_eq!(tree, "ab\r\ncd");
        assert_eq!(3, tree.piece_count());
        let lens: Vec<usize> = tree.pieces().map(|p| p.len()).collect();
        assert_eq!(vec![2, 2, 2], lens);
        tree.compute_buffer_metadata();
        assert_eq!(1, tree.line_feed_count());
        tree.assert_integrity();
    }

    #[test]
    fn fix_crlf_removes_empty_pieces() {
        let mut tree = PieceTree::from_buffers(
            vec![ChunkBuffer::from_text("\r"), ChunkBuffer::from_text("\n")],
            EndOfLine::LF,
            false,
            16,
            1,
        );
        let first = tree.tree.first();
        let second = tree.tree.next(first);
        tree.fix_crlf(first, second);
        tree.compute_buffer_metadata();

        assert_eq!(tree, "\r\n");
        assert_eq!(1, tree.piece_count());
        assert_eq!(0, tree.pieces().next().unwrap().buffer_index());
        tree.assert_integrity();
    }

    #[test]
    fn eol_normalized_tracking() {
        let mut tree = PieceTree::from_str("a\r\nb");
        tree.normalize_eol(EndOfLine::CRLF);
        assert!(tree.is_eol_normalized());
        tree.insert(4, "\r\nc").unwrap();
        assert!(tree.is_eol_normalized());
        tree.delete(1, 2).unwrap();
        assert!(tree.is_eol_normalized());
        // Between the '\r' and '\n' of "ab\r\nc".
        tree.insert(3, "x").unwrap();
        assert_eq!(tree, "ab\rx\nc");
        assert!(!tree.is_eol_normalized());

        let mut tree = PieceTree::from_str("a\nb");
        tree.normalize_eol(EndOfLine::LF);
        tree.insert(1, "\r").unwrap();
        assert!(!tree.is_eol_normalized());
    }

    #[test]
    fn random_edits_small_chunks() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let alphabet = ['\r', '\n', 'a', 'b', 'é', '𝄞'];
        let mut tree = small_tree("", 4);
        let mut model = String::new();

        for _ in 0..600 {
            let model_len = utf16::count(&model);
            let offset_at = |rng: &mut fastrand::Rng, model: &str| {
                let char_idx = rng.usize(..=model.chars().count());
                let byte_idx = model
                    .char_indices()
                    .nth(char_idx)
                    .map(|(i, _)| i)
                    .unwrap_or(model.len());
                (byte_idx, utf16::from_byte_idx(model, byte_idx))
            };

            if model_len == 0 || rng.u8(..) < 150 {
                let (byte_idx, offset) = offset_at(&mut rng, &model);
                let text: String = (0..rng.usize(1..8))
                    .map(|_| alphabet[rng.usize(..alphabet.len())])
                    .collect();
                tree.insert(offset, &text).unwrap();
                model.insert_str(byte_idx, &text);
            } else {
                let (a_byte, a) = offset_at(&mut rng, &model);
                let (b_byte, b) = offset_at(&mut rng, &model);
                let (start_byte, start, end_byte, end) = if a <= b {
                    (a_byte, a, b_byte, b)
                } else {
                    (b_byte, b, a_byte, a)
                };
                tree.delete(start, end - start).unwrap();
                model.replace_range(start_byte..end_byte, "");
            }

            assert_eq!(tree, model.as_str());
            assert_eq!(lf_count(&model), tree.line_feed_count());
            tree.assert_integrity();
        }
    }
}
