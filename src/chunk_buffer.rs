use str_indices::utf16;

use crate::{ends_with_cr, starts_with_lf, Error, Result};

/// A zero-based `(line, column)` address inside a single [`ChunkBuffer`].
///
/// The column is counted in UTF-16 code units from the start of the
/// buffer line.  A cursor sitting exactly on a line start is always
/// expressed as `(line, 0)`, never as the end of the previous line.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferCursor {
    pub line: usize,
    pub column: usize,
}

impl BufferCursor {
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<(usize, usize)> for BufferCursor {
    fn from((line, column): (usize, usize)) -> Self {
        Self { line, column }
    }
}

/// A block of text plus a materialized index of its line starts.
///
/// Frozen chunk buffers are never modified after construction.  The add
/// buffer of a [`PieceTree`](crate::PieceTree) is the single exception:
/// it only ever grows at its end, see [`ChunkBuffer::append()`].
///
/// Line starts are recorded after every CR, LF and CRLF, with a CRLF pair
/// producing a single line start.  They are kept both in UTF-16 code
/// units (the public offset space) and in bytes, so that converting a
/// cursor to a byte index only ever scans within one line.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    text: String,
    line_starts: Vec<usize>,
    line_byte_starts: Vec<usize>,
    len_utf16: usize,
    cr: usize,
    lf: usize,
    crlf: usize,
    is_ascii: bool,
}

impl ChunkBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            text: String::new(),
            line_starts: vec![0],
            line_byte_starts: vec![0],
            len_utf16: 0,
            cr: 0,
            lf: 0,
            crlf: 0,
            is_ascii: true,
        }
    }

    /// Creates a buffer from `text`, computing its line-start index.
    ///
    /// Runs in O(N) time.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let scan = LineScan::new(&text);
        Self {
            is_ascii: text.is_ascii(),
            text,
            line_starts: scan.starts,
            line_byte_starts: scan.byte_starts,
            len_utf16: scan.len_utf16,
            cr: scan.cr,
            lf: scan.lf,
            crlf: scan.crlf,
        }
    }

    /// Appends `text` to the end of the buffer.
    ///
    /// Only the line starts of the appended text are computed.  If the
    /// buffer ends with `\r` and `text` starts with `\n`, the two merge
    /// into a single CRLF line break and the line start that followed the
    /// `\r` is dropped.
    ///
    /// Runs in O(M) time, where M is the length of `text`.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let scan = LineScan::new(text);
        let base_utf16 = self.len_utf16;
        let base_bytes = self.text.len();

        let mut lf = scan.lf;
        if ends_with_cr(&self.text) && starts_with_lf(text) {
            self.line_starts.pop();
            self.line_byte_starts.pop();
            self.cr -= 1;
            self.crlf += 1;
            lf -= 1;
        }

        self.line_starts
            .extend(scan.starts[1..].iter().map(|s| s + base_utf16));
        self.line_byte_starts
            .extend(scan.byte_starts[1..].iter().map(|s| s + base_bytes));
        self.text.push_str(text);
        self.len_utf16 += scan.len_utf16;
        self.cr += scan.cr;
        self.lf += lf;
        self.crlf += scan.crlf;
        self.is_ascii &= text.is_ascii();
    }

    //---------------------------------------------------------
    // Queries.

    /// The buffer's text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the buffer in UTF-16 code units.
    #[inline]
    pub fn len(&self) -> usize {
        self.len_utf16
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len_utf16 == 0
    }

    /// Number of line breaks in the buffer, counting CRLF once.
    #[inline]
    pub fn line_feed_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// The line-start offsets, in UTF-16 code units.  The first entry is
    /// always zero.
    #[inline]
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Counts of lone CR, lone LF and CRLF line breaks in the buffer.
    #[inline]
    pub fn terminator_counts(&self) -> (usize, usize, usize) {
        (self.cr, self.lf, self.crlf)
    }

    /// The cursor just past the last code unit of the buffer.
    pub fn end_cursor(&self) -> BufferCursor {
        let line = self.line_starts.len() - 1;
        BufferCursor::new(line, self.len_utf16 - self.line_starts[line])
    }

    /// Converts a cursor to an absolute offset in UTF-16 code units.
    ///
    /// Returns `Err(OutOfRange)` if the line does not exist or the column
    /// runs past the end of that line.
    pub fn offset_of(&self, cursor: BufferCursor) -> Result<usize> {
        if cursor.line >= self.line_starts.len() {
            return Err(Error::OutOfRange);
        }
        let start = self.line_starts[cursor.line];
        let end = self
            .line_starts
            .get(cursor.line + 1)
            .copied()
            .unwrap_or(self.len_utf16);
        if cursor.column > end - start {
            return Err(Error::OutOfRange);
        }
        Ok(start + cursor.column)
    }

    /// Converts an absolute offset to a cursor.
    ///
    /// Runs in O(log L) time, where L is the number of lines.
    pub fn cursor_at(&self, offset: usize) -> Result<BufferCursor> {
        if offset > self.len_utf16 {
            return Err(Error::OutOfRange);
        }
        Ok(self.cursor_in_lines(offset, 0, self.line_starts.len() - 1))
    }

    /// Returns the text between two cursors.
    ///
    /// Returns an empty string if the cursors are equal, and
    /// `Err(OutOfRange)` if either cursor is invalid or `end < start`.
    pub fn slice(&self, start: BufferCursor, end: BufferCursor) -> Result<&str> {
        let start_offset = self.offset_of(start)?;
        let end_offset = self.offset_of(end)?;
        if end_offset < start_offset {
            return Err(Error::OutOfRange);
        }
        Ok(&self.text[self.byte_of_cursor(start)..self.byte_of_cursor(end)])
    }

    /// Returns the UTF-16 code unit at `offset`, or `None` if `offset` is
    /// at or past the end of the buffer.
    pub fn char_code_at(&self, offset: usize) -> Option<u16> {
        if offset >= self.len_utf16 {
            return None;
        }
        let line = self.line_of(offset);
        let line_text = &self.text[self.line_byte_starts[line]..];
        let column = offset - self.line_starts[line];
        if self.is_ascii {
            return Some(line_text.as_bytes()[column] as u16);
        }

        let byte_idx = utf16::to_byte_idx(line_text, column);
        let inner = column - utf16::from_byte_idx(line_text, byte_idx);
        let c = line_text[byte_idx..].chars().next()?;
        let mut units = [0u16; 2];
        c.encode_utf16(&mut units).get(inner).copied()
    }

    /// Returns whether `offset` falls between two whole chars, i.e. not
    /// between the two code units of a surrogate pair.
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        if offset == 0 || offset >= self.len_utf16 || self.is_ascii {
            return offset <= self.len_utf16;
        }
        let line = self.line_of(offset);
        let line_text = &self.text[self.line_byte_starts[line]..];
        let column = offset - self.line_starts[line];
        utf16::from_byte_idx(line_text, utf16::to_byte_idx(line_text, column)) == column
    }

    //---------------------------------------------------------
    // Crate-internal helpers.  These assume valid cursors.

    #[inline]
    pub(crate) fn offset_of_unchecked(&self, cursor: BufferCursor) -> usize {
        self.line_starts[cursor.line] + cursor.column
    }

    /// Binary searches for `offset` among the lines `low..=high`.
    pub(crate) fn cursor_in_lines(
        &self,
        offset: usize,
        mut low: usize,
        mut high: usize,
    ) -> BufferCursor {
        let mut mid = low;
        let mut mid_start = self.line_starts[low];
        while low <= high {
            mid = low + (high - low) / 2;
            mid_start = self.line_starts[mid];
            if mid == high {
                break;
            }
            let mid_stop = self.line_starts[mid + 1];
            if offset < mid_start {
                if mid == 0 {
                    break;
                }
                high = mid - 1;
            } else if offset >= mid_stop {
                low = mid + 1;
            } else {
                break;
            }
        }
        BufferCursor::new(mid, offset - mid_start)
    }

    /// Byte index of a valid cursor.
    pub(crate) fn byte_of_cursor(&self, cursor: BufferCursor) -> usize {
        let line_byte = self.line_byte_starts[cursor.line];
        if self.is_ascii {
            return line_byte + cursor.column;
        }
        line_byte + utf16::to_byte_idx(&self.text[line_byte..], cursor.column)
    }

    /// The text between two valid absolute offsets.
    pub(crate) fn text_between(&self, start: usize, end: usize) -> &str {
        let start_byte = self.byte_of_cursor(self.cursor_in_lines(
            start,
            0,
            self.line_starts.len() - 1,
        ));
        let end_byte = self.byte_of_cursor(self.cursor_in_lines(
            end,
            0,
            self.line_starts.len() - 1,
        ));
        &self.text[start_byte..end_byte]
    }

    /// The text between two valid cursors.
    #[inline]
    pub(crate) fn text_between_cursors(&self, start: BufferCursor, end: BufferCursor) -> &str {
        &self.text[self.byte_of_cursor(start)..self.byte_of_cursor(end)]
    }

    /// Number of line breaks in `[start, end)`, counting CRLF once.
    ///
    /// A range that ends between the `\r` and `\n` of a CRLF pair counts
    /// that `\r` as a break of its own, since the line-start index only
    /// records the position after the `\n`.
    pub(crate) fn line_feeds_between(&self, start: BufferCursor, end: BufferCursor) -> usize {
        let breaks = end.line - start.line;
        if end.column == 0 || end.line == self.line_starts.len() - 1 {
            return breaks;
        }
        let next_line_start = self.line_starts[end.line + 1];
        let end_offset = self.line_starts[end.line] + end.column;
        if next_line_start > end_offset + 1 {
            return breaks;
        }
        if self.ends_with_cr_at(end) {
            breaks + 1
        } else {
            breaks
        }
    }

    /// Whether the code unit just before `cursor` is `\r`.
    pub(crate) fn ends_with_cr_at(&self, cursor: BufferCursor) -> bool {
        let byte_idx = self.byte_of_cursor(cursor);
        byte_idx > 0 && self.text.as_bytes()[byte_idx - 1] == b'\r'
    }

    /// Whether the code unit at `cursor` is `\n`.
    pub(crate) fn starts_with_lf_at(&self, cursor: BufferCursor) -> bool {
        let byte_idx = self.byte_of_cursor(cursor);
        self.text.as_bytes().get(byte_idx) == Some(&b'\n')
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&s| s <= offset) - 1
    }

    pub(crate) fn check_line_starts(&self) -> std::result::Result<(), String> {
        let rescan = LineScan::new(&self.text);
        if rescan.starts != self.line_starts || rescan.byte_starts != self.line_byte_starts {
            return Err("buffer line starts do not match its text".into());
        }
        if rescan.len_utf16 != self.len_utf16 {
            return Err("buffer length does not match its text".into());
        }
        Ok(())
    }
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

//=============================================================

/// The result of scanning a string for line breaks.
struct LineScan {
    starts: Vec<usize>,
    byte_starts: Vec<usize>,
    len_utf16: usize,
    cr: usize,
    lf: usize,
    crlf: usize,
}

impl LineScan {
    fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut scan = LineScan {
            starts: vec![0],
            byte_starts: vec![0],
            len_utf16: 0,
            cr: 0,
            lf: 0,
            crlf: 0,
        };

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        scan.crlf += 1;
                        scan.len_utf16 += 2;
                        i += 2;
                    } else {
                        scan.cr += 1;
                        scan.len_utf16 += 1;
                        i += 1;
                    }
                    scan.starts.push(scan.len_utf16);
                    scan.byte_starts.push(i);
                }
                b'\n' => {
                    scan.lf += 1;
                    scan.len_utf16 += 1;
                    i += 1;
                    scan.starts.push(scan.len_utf16);
                    scan.byte_starts.push(i);
                }
                byte => {
                    scan.len_utf16 += utf16_width(byte);
                    i += 1;
                }
            }
        }

        scan
    }
}

/// Number of UTF-16 code units contributed by a utf8 byte: lead bytes of
/// four-byte sequences make a surrogate pair, continuation bytes add
/// nothing.
#[inline(always)]
fn utf16_width(byte: u8) -> usize {
    if (byte & 0xC0) == 0x80 {
        0
    } else if byte >= 0xF0 {
        2
    } else {
        1
    }
}

//=============================================================
