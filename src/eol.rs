use str_indices::utf16;

use crate::chunk_buffer::ChunkBuffer;
use crate::crlf::{seam_is_break, SplitText};

/// Default ceiling, in UTF-16 code units, on the size of the frozen chunk
/// buffers created by the builder and by large inserts.
pub const DEFAULT_CHUNK_SIZE: usize = 65535;

/// A line terminator style.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum EndOfLine {
    /// `\n`
    #[default]
    LF,
    /// `\r\n`
    CRLF,
}

impl EndOfLine {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            EndOfLine::LF => "\n",
            EndOfLine::CRLF => "\r\n",
        }
    }

    /// Length of the terminator in UTF-16 code units.
    #[inline]
    pub fn len_utf16(self) -> usize {
        match self {
            EndOfLine::LF => 1,
            EndOfLine::CRLF => 2,
        }
    }
}

/// Returns whether `text` contains a line break other than `eol`.
pub(crate) fn has_foreign_line_break(text: &str, eol: EndOfLine) -> bool {
    let bytes = text.as_bytes();
    match eol {
        EndOfLine::LF => bytes.contains(&b'\r'),
        EndOfLine::CRLF => bytes.iter().enumerate().any(|(i, &b)| {
            (b == b'\r' && bytes.get(i + 1) != Some(&b'\n'))
                || (b == b'\n' && (i == 0 || bytes[i - 1] != b'\r'))
        }),
    }
}

/// Rewrites every CR, LF and CRLF in `text` to `eol`.
pub(crate) fn replace_line_breaks(text: &str, eol: EndOfLine) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let bytes = text.as_bytes();
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        let break_len = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
            b'\r' | b'\n' => 1,
            _ => 0,
        };
        if break_len == 0 {
            i += 1;
            continue;
        }
        out.push_str(&text[last..i]);
        out.push_str(eol.as_str());
        i += break_len;
        last = i;
    }
    out.push_str(&text[last..]);
    out
}

/// Regroups `chunks` into normalized chunk buffers.
///
/// Text is accumulated until it holds at least `chunk_size - chunk_size / 3`
/// code units, then flushed with its line breaks rewritten to `eol`.  A
/// flush never separates a `\r` from a following `\n`, and flushed text
/// that grew past `chunk_size` is split again, so no buffer exceeds it.
pub(crate) fn normalize_chunks<'a, I>(chunks: I, eol: EndOfLine, chunk_size: usize) -> Vec<ChunkBuffer>
where
    I: IntoIterator<Item = &'a str>,
{
    let min = chunk_size - chunk_size / 3;

    let mut buffers = Vec::new();
    let mut pending = String::new();
    let mut pending_len = 0;
    for chunk in chunks {
        if pending_len >= min && seam_is_break(&pending, chunk) {
            flush_normalized(&mut buffers, &pending, eol, chunk_size);
            pending.clear();
            pending_len = 0;
        }
        pending.push_str(chunk);
        pending_len += utf16::count(chunk);
    }
    if pending_len > 0 {
        flush_normalized(&mut buffers, &pending, eol, chunk_size);
    }

    buffers
}

fn flush_normalized(buffers: &mut Vec<ChunkBuffer>, text: &str, eol: EndOfLine, chunk_size: usize) {
    let normalized = replace_line_breaks(text, eol);
    buffers.extend(SplitText::new(&normalized, chunk_size).map(ChunkBuffer::from_text));
}

//=============================================================
