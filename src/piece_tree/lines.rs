use super::{NodeHit, PieceTree};
use crate::eol::{replace_line_breaks, EndOfLine};
use crate::position::{Position, TextRange};
use crate::search_cache::CacheEntry;
use crate::tree::NodeId;
use crate::{Error, Result};

const CR: u16 = b'\r' as u16;
const LF: u16 = b'\n' as u16;

impl PieceTree {
    //-----------------------------------------------------------------------
    // Offset <-> position conversion.

    /// Returns the offset of the one-based `(line_number, column)`.
    ///
    /// The column may point at any code unit of the line's terminator
    /// except the last, so the position `position_at` reports between the
    /// halves of a CRLF maps back to its offset.
    ///
    /// Runs in O(log N) time.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the line does not exist, or the column is zero or
    /// past the end of the line.
    pub fn offset_at(&self, line_number: usize, column: usize) -> Result<usize> {
        self.check_line(line_number)?;
        let (start, content_end, end) = self.line_bounds(line_number);
        let last_column = if line_number < self.line_count() {
            end - start
        } else {
            content_end - start + 1
        };
        if column == 0 || column > last_column {
            return Err(Error::OutOfRange);
        }
        Ok(start + column - 1)
    }

    /// Returns the one-based position of `offset`.
    ///
    /// Runs in O(log N) time.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `offset > len()`.
    pub fn position_at(&self, offset: usize) -> Result<Position> {
        if offset > self.length {
            return Err(Error::OutOfRange);
        }

        let mut x = self.tree.root();
        let mut rest = offset;
        let mut line_feeds = 0;
        while !x.is_sentinel() {
            let node = self.tree.node(x);
            if node.size_left != 0 && node.size_left >= rest {
                x = node.left;
            } else if node.size_left + node.piece.length >= rest {
                let (index, column) = self.index_of(x, rest - node.size_left);
                line_feeds += node.lf_left + index;
                if index == 0 {
                    // The line starts in an earlier piece.
                    let line_start = self.line_start_offset(line_feeds + 1);
                    return Ok(Position::new(line_feeds + 1, offset - line_start + 1));
                }
                return Ok(Position::new(line_feeds + 1, column + 1));
            } else {
                rest -= node.size_left + node.piece.length;
                line_feeds += node.lf_left + node.piece.line_feed_count;
                x = node.right;
            }
        }

        Ok(Position::new(1, 1))
    }

    //-----------------------------------------------------------------------
    // Line access.

    /// Returns the text of line `line_number`, including its terminator.
    ///
    /// The most recently requested line is remembered until the next
    /// edit.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the line does not exist.
    pub fn line_content(&mut self, line_number: usize) -> Result<String> {
        self.check_line(line_number)?;
        if let Some((line, content)) = &self.last_visited_line {
            if *line == line_number {
                return Ok(content.clone());
            }
        }
        let content = self.line_raw_content(line_number);
        self.last_visited_line = Some((line_number, content.clone()));
        Ok(content)
    }

    /// Returns the text of line `line_number` without its terminator.
    pub fn line_without_eol(&mut self, line_number: usize) -> Result<String> {
        let mut content = self.line_content(line_number)?;
        if content.ends_with('\n') {
            content.pop();
        }
        if content.ends_with('\r') {
            content.pop();
        }
        Ok(content)
    }

    /// Length of line `line_number` in UTF-16 code units, not counting its
    /// terminator.
    pub fn line_length(&self, line_number: usize) -> Result<usize> {
        self.check_line(line_number)?;
        let (start, content_end, _) = self.line_bounds(line_number);
        Ok(content_end - start)
    }

    /// Returns every line of the document without terminators.
    ///
    /// Runs in O(N) time.
    pub fn lines(&self) -> Vec<String> {
        let text = self.text();
        let bytes = text.as_bytes();
        let mut lines = Vec::with_capacity(self.line_count());
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let break_len = match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
                b'\r' | b'\n' => 1,
                _ => {
                    i += 1;
                    continue;
                }
            };
            lines.push(text[start..i].to_string());
            i += break_len;
            start = i;
        }
        lines.push(text[start..].to_string());
        lines
    }

    /// Returns the UTF-16 code unit at `offset`, or `None` if `offset` is
    /// at or past the end of the document.
    pub fn char_code_at(&self, offset: usize) -> Option<u16> {
        let hit = self.node_containing(offset)?;
        let piece = self.tree.piece(hit.node);
        let buffer = &self.buffers[piece.buffer_index];
        buffer.char_code_at(buffer.offset_of_unchecked(piece.start) + hit.remainder)
    }

    /// Returns the UTF-16 code unit at zero-based `index` of line
    /// `line_number`.
    pub fn line_char_code(&self, line_number: usize, index: usize) -> Result<u16> {
        let offset = self.offset_at(line_number, index + 1)?;
        self.char_code_at(offset).ok_or(Error::OutOfRange)
    }

    //-----------------------------------------------------------------------
    // Range access.

    /// Returns the `len` code units starting at `offset`.
    ///
    /// Runs in O(log N + M) time, where M is the length of the range.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `offset + len > len()`.
    /// - `NonCharBoundary` if either end splits a surrogate pair.
    pub fn text_range(&self, offset: usize, len: usize) -> Result<String> {
        let end = offset.checked_add(len).ok_or(Error::OutOfRange)?;
        if end > self.length {
            return Err(Error::OutOfRange);
        }
        self.check_char_boundary(offset)?;
        self.check_char_boundary(end)?;

        let mut text = String::new();
        let hit = match self.node_containing(offset) {
            Some(hit) if len > 0 => hit,
            _ => return Ok(text),
        };
        let mut x = hit.node;
        let mut skip = hit.remainder;
        let mut remaining = len;
        while remaining > 0 && !x.is_sentinel() {
            let piece = self.tree.piece(x);
            let buffer = &self.buffers[piece.buffer_index];
            let start = buffer.offset_of_unchecked(piece.start) + skip;
            let take = (piece.length - skip).min(remaining);
            text.push_str(buffer.text_between(start, start + take));
            remaining -= take;
            skip = 0;
            x = self.tree.next(x);
        }
        Ok(text)
    }

    /// Returns the text between two positions, with line breaks rewritten
    /// to `eol` if given.
    pub fn value_in_range(&self, range: TextRange, eol: Option<EndOfLine>) -> Result<String> {
        let start = self.offset_at(range.start.line_number, range.start.column)?;
        let end = self.offset_at(range.end.line_number, range.end.column)?;
        if end < start {
            return Err(Error::OutOfRange);
        }
        let text = self.text_range(start, end - start)?;
        Ok(match eol {
            Some(eol) => replace_line_breaks(&text, eol),
            None => text,
        })
    }

    /// Returns the rest of the piece that `offset` falls in, starting at
    /// `offset`.  At the end of a piece this is the whole next piece.
    pub fn nearest_chunk(&self, offset: usize) -> Result<&str> {
        if offset > self.length {
            return Err(Error::OutOfRange);
        }
        self.check_char_boundary(offset)?;
        match self.node_containing(offset) {
            Some(hit) => {
                let piece = self.tree.piece(hit.node);
                let buffer = &self.buffers[piece.buffer_index];
                let start = buffer.offset_of_unchecked(piece.start);
                Ok(buffer.text_between(start + hit.remainder, start + piece.length))
            }
            None => Ok(""),
        }
    }

    //-----------------------------------------------------------------------
    // Internal utilities.

    fn check_line(&self, line_number: usize) -> Result<()> {
        if line_number == 0 || line_number > self.line_count() {
            Err(Error::OutOfRange)
        } else {
            Ok(())
        }
    }

    /// Like `find_node()`, but an offset on a seam always resolves to the
    /// piece that starts there.  `None` at or past the end.
    fn node_containing(&self, mut offset: usize) -> Option<NodeHit> {
        let mut x = self.tree.root();
        let mut node_start = 0;
        while !x.is_sentinel() {
            let node = self.tree.node(x);
            if node.size_left > offset {
                x = node.left;
            } else if node.size_left + node.piece.length > offset {
                return Some(NodeHit {
                    node: x,
                    remainder: offset - node.size_left,
                    node_start: node_start + node.size_left,
                });
            } else {
                offset -= node.size_left + node.piece.length;
                node_start += node.size_left + node.piece.length;
                x = node.right;
            }
        }
        None
    }

    /// Length from the start of `node`'s piece to just after its
    /// `index`-th (zero-based) line break, or the whole piece if it has
    /// fewer.  Negative indices give zero.
    fn accumulated_value(&self, node: NodeId, index: isize) -> usize {
        if index < 0 {
            return 0;
        }
        let piece = self.tree.piece(node);
        let line_starts = self.buffers[piece.buffer_index].line_starts();
        let start = line_starts[piece.start.line] + piece.start.column;
        let expected = piece.start.line + index as usize + 1;
        if expected > piece.end.line {
            line_starts[piece.end.line] + piece.end.column - start
        } else {
            line_starts[expected] - start
        }
    }

    /// Line breaks before `remainder` within `node`'s piece, and the
    /// column in the buffer line at that point.
    fn index_of(&self, node: NodeId, remainder: usize) -> (usize, usize) {
        let piece = *self.tree.piece(node);
        let pos = self.position_in_buffer(node, remainder);
        let line_count = pos.line - piece.start.line;
        if remainder == piece.length {
            // A piece can end between a '\r' and the '\n' that follows it
            // in the buffer.
            let real = self.buffers[piece.buffer_index].line_feeds_between(piece.start, pos);
            if real != line_count {
                return (real, 0);
            }
        }
        (line_count, pos.column)
    }

    /// Offset of the first code unit of line `line_number`.
    fn line_start_offset(&self, mut line_number: usize) -> usize {
        let mut x = self.tree.root();
        let mut left_len = 0;
        while !x.is_sentinel() {
            let node = self.tree.node(x);
            if !node.left.is_sentinel() && node.lf_left + 1 >= line_number {
                x = node.left;
            } else if node.lf_left + node.piece.line_feed_count + 1 >= line_number {
                let index = line_number as isize - node.lf_left as isize - 2;
                return left_len + node.size_left + self.accumulated_value(x, index);
            } else {
                line_number -= node.lf_left + node.piece.line_feed_count;
                left_len += node.size_left + node.piece.length;
                x = node.right;
            }
        }
        left_len
    }

    /// `(start, content_end, end)` of a valid line, where `content_end`
    /// excludes the terminator.
    fn line_bounds(&self, line_number: usize) -> (usize, usize, usize) {
        let start = self.line_start_offset(line_number);
        if line_number == self.line_count() {
            return (start, self.length, self.length);
        }
        let end = self.line_start_offset(line_number + 1);
        let mut content_end = end;
        match self.char_code_at(end - 1) {
            Some(LF) => {
                content_end -= 1;
                if content_end > start && self.char_code_at(content_end - 1) == Some(CR) {
                    content_end -= 1;
                }
            }
            Some(CR) => content_end -= 1,
            _ => {}
        }
        (start, content_end, end)
    }

    /// Collects the raw text of a valid line, remembering the node it
    /// starts in.
    fn line_raw_content(&mut self, line_number: usize) -> String {
        let mut text = String::new();
        let mut x;

        if let Some(CacheEntry {
            node,
            start_line: Some(start_line),
            ..
        }) = self.cache.get_by_line(&self.tree, line_number)
        {
            x = node;
            let piece = *self.tree.piece(x);
            let buffer = &self.buffers[piece.buffer_index];
            let start = buffer.offset_of_unchecked(piece.start);
            let prev = self.accumulated_value(x, line_number as isize - start_line as isize - 1);
            if start_line + piece.line_feed_count == line_number {
                text.push_str(buffer.text_between(start + prev, start + piece.length));
            } else {
                let next = self.accumulated_value(x, (line_number - start_line) as isize);
                return buffer.text_between(start + prev, start + next).to_string();
            }
        } else {
            let mut line = line_number;
            let mut node_start = 0;
            x = self.tree.root();
            loop {
                if x.is_sentinel() {
                    return text;
                }
                let (left, right, size_left, lf_left, piece) = {
                    let node = self.tree.node(x);
                    (node.left, node.right, node.size_left, node.lf_left, node.piece)
                };
                let buffer = &self.buffers[piece.buffer_index];
                let start = buffer.offset_of_unchecked(piece.start);

                if !left.is_sentinel() && lf_left + 1 >= line {
                    x = left;
                } else if lf_left + piece.line_feed_count + 1 > line {
                    let prev = self.accumulated_value(x, line as isize - lf_left as isize - 2);
                    let next = self.accumulated_value(x, line as isize - lf_left as isize - 1);
                    let content = buffer.text_between(start + prev, start + next).to_string();
                    self.cache.remember(CacheEntry {
                        node: x,
                        start_offset: node_start + size_left,
                        start_line: Some(line_number - (line - 1 - lf_left)),
                    });
                    return content;
                } else if lf_left + piece.line_feed_count + 1 == line {
                    let prev = self.accumulated_value(x, line as isize - lf_left as isize - 2);
                    text.push_str(buffer.text_between(start + prev, start + piece.length));
                    break;
                } else {
                    line -= lf_left + piece.line_feed_count;
                    node_start += size_left + piece.length;
                    x = right;
                }
            }
        }

        // The line continues into the following pieces.
        x = self.tree.next(x);
        while !x.is_sentinel() {
            let piece = self.tree.piece(x);
            if piece.line_feed_count > 0 {
                let buffer = &self.buffers[piece.buffer_index];
                let start = buffer.offset_of_unchecked(piece.start);
                let end = start + self.accumulated_value(x, 0);
                text.push_str(buffer.text_between(start, end));
                return text;
            }
            text.push_str(self.piece_text(piece));
            x = self.tree.next(x);
        }
        text
    }
}

//==============================================================
