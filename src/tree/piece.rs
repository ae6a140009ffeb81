use crate::chunk_buffer::BufferCursor;

/// A reference to a sub-range of one chunk buffer.
///
/// `length` and `line_feed_count` are cached: `length` is the distance
/// between `start` and `end` in UTF-16 code units, and `line_feed_count`
/// the number of line breaks in `[start, end)` with CRLF counted once.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Piece {
    pub(crate) buffer_index: usize,
    pub(crate) start: BufferCursor,
    pub(crate) end: BufferCursor,
    pub(crate) line_feed_count: usize,
    pub(crate) length: usize,
}

impl Piece {
    #[inline]
    pub(crate) fn new(
        buffer_index: usize,
        start: BufferCursor,
        end: BufferCursor,
        line_feed_count: usize,
        length: usize,
    ) -> Self {
        Piece {
            buffer_index,
            start,
            end,
            line_feed_count,
            length,
        }
    }

    /// Index of the chunk buffer this piece refers to.  Index 0 is the
    /// add buffer.
    #[inline]
    pub fn buffer_index(&self) -> usize {
        self.buffer_index
    }

    #[inline]
    pub fn start(&self) -> BufferCursor {
        self.start
    }

    #[inline]
    pub fn end(&self) -> BufferCursor {
        self.end
    }

    #[inline]
    pub fn line_feed_count(&self) -> usize {
        self.line_feed_count
    }

    /// Length in UTF-16 code units.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}
