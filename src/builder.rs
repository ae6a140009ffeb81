use std::sync::Arc;

use crate::chunk_buffer::ChunkBuffer;
use crate::crlf::SplitText;
use crate::eol::{normalize_chunks, EndOfLine, DEFAULT_CHUNK_SIZE};
use crate::metadata;
use crate::piece_tree::PieceTree;

const BOM: char = '\u{FEFF}';

/// An incremental `PieceTree` builder.
///
/// `PieceTreeBuilder` builds a piece tree from a sequence of text chunks,
/// such as the blocks read from a file, in time linear to the amount of
/// text fed to it.  Along the way it:
///
/// - Strips a leading byte order mark and reports it separately.
/// - Counts CR, LF and CRLF line breaks, including CRLF pairs that are
///   split across two chunks.
/// - Splits the text into chunk buffers of bounded size, never between
///   the two halves of a CRLF.
///
/// # Example
/// ```
/// # use piecetree::{BuildOptions, EndOfLine, PieceTreeBuilder};
/// #
/// let mut builder = PieceTreeBuilder::new();
///
/// builder.accept_chunk("\u{FEFF}Hello\r");
/// builder.accept_chunk("\nworld!");
///
/// let result = builder.finish().create(&BuildOptions::default());
///
/// assert_eq!(result.bom, "\u{FEFF}");
/// assert_eq!(result.tree, "Hello\r\nworld!");
/// assert_eq!(result.tree.line_feed_count(), 1);
/// assert_eq!(result.tree.eol(), EndOfLine::CRLF);
/// ```
#[derive(Debug, Clone)]
pub struct PieceTreeBuilder {
    chunks: Vec<ChunkBuffer>,
    bom: String,
    has_content: bool,
    pending_cr: bool,
    counts: EolCounts,
    contains_rtl: bool,
    contains_unusual_line_terminators: bool,
    is_basic_ascii: bool,
    chunk_size: usize,
}

impl PieceTreeBuilder {
    /// Creates a new builder, ready for input.
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates a new builder whose chunk buffers, and those of the trees it
    /// creates, hold at most about `chunk_size` UTF-16 code units.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        PieceTreeBuilder {
            chunks: Vec::new(),
            bom: String::new(),
            has_content: false,
            pending_cr: false,
            counts: EolCounts::default(),
            contains_rtl: false,
            contains_unusual_line_terminators: false,
            is_basic_ascii: true,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Appends `chunk` to the end of the in-progress text.
    ///
    /// Chunks can be as large or small as desired.  A `\r` at the end of
    /// a chunk is held back until the next chunk shows whether it starts
    /// a CRLF.
    pub fn accept_chunk(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }

        let mut chunk = chunk;
        if !self.has_content {
            self.has_content = true;
            if let Some(rest) = chunk.strip_prefix(BOM) {
                self.bom.push(BOM);
                chunk = rest;
            }
        }

        let mut text = String::with_capacity(chunk.len() + 1);
        if self.pending_cr {
            text.push('\r');
        }
        text.push_str(chunk);
        self.pending_cr = text.ends_with('\r');
        if self.pending_cr {
            text.pop();
        }

        if !text.is_empty() {
            self.push_text(&text);
        }
    }

    /// Finishes accepting input and returns the factory that creates the
    /// tree.
    pub fn finish(mut self) -> TextBufferFactory {
        if self.pending_cr {
            self.pending_cr = false;
            self.counts.cr += 1;
            match self.chunks.last_mut() {
                Some(last) => last.append("\r"),
                None => self.chunks.push(ChunkBuffer::from_text("\r")),
            }
        }

        TextBufferFactory {
            chunks: self.chunks,
            bom: self.bom,
            counts: self.counts,
            contains_rtl: self.contains_rtl,
            contains_unusual_line_terminators: self.contains_unusual_line_terminators,
            is_basic_ascii: self.is_basic_ascii,
            chunk_size: self.chunk_size,
        }
    }

    //-----------------------------------------------------------------

    fn push_text(&mut self, text: &str) {
        if !self.contains_rtl {
            self.contains_rtl = metadata::contains_rtl(text);
        }
        if !self.contains_unusual_line_terminators {
            self.contains_unusual_line_terminators =
                metadata::contains_unusual_line_terminators(text);
        }
        if self.is_basic_ascii {
            self.is_basic_ascii = metadata::is_basic_ascii(text);
        }

        for segment in SplitText::new(text, self.chunk_size) {
            let buffer = ChunkBuffer::from_text(segment);
            let (cr, lf, crlf) = buffer.terminator_counts();
            self.counts.cr += cr;
            self.counts.lf += lf;
            self.counts.crlf += crlf;
            self.chunks.push(buffer);
        }
    }
}

impl Default for PieceTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=============================================================

/// Counts of each kind of line break in a text.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EolCounts {
    /// Lone `\r`.
    pub cr: usize,
    /// Lone `\n`.
    pub lf: usize,
    /// `\r\n` pairs.
    pub crlf: usize,
}

impl EolCounts {
    pub(crate) fn from_buffers(buffers: &[ChunkBuffer]) -> Self {
        let mut counts = EolCounts::default();
        for buffer in buffers {
            let (cr, lf, crlf) = buffer.terminator_counts();
            counts.cr += cr;
            counts.lf += lf;
            counts.crlf += crlf;
        }
        counts
    }

    /// Total number of line breaks.
    #[inline]
    pub fn total(&self) -> usize {
        self.cr + self.lf + self.crlf
    }

    /// The line break style most of the text uses, or `default` if it has
    /// none at all.
    ///
    /// Breaks containing a `\r` vote for CRLF, and it wins only with a
    /// strict majority.
    pub fn dominant(&self, default: EndOfLine) -> EndOfLine {
        let total = self.total();
        if total == 0 {
            default
        } else if (self.cr + self.crlf) * 2 > total {
            EndOfLine::CRLF
        } else {
            EndOfLine::LF
        }
    }

    /// Whether any line break differs from `eol`.
    pub fn is_mixed_with(&self, eol: EndOfLine) -> bool {
        match eol {
            EndOfLine::LF => self.cr > 0 || self.crlf > 0,
            EndOfLine::CRLF => self.cr > 0 || self.lf > 0,
        }
    }
}

//=============================================================

/// Options for [`TextBufferFactory::create()`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Rewrite every line break to the dominant style.
    pub normalize_eol: bool,
    /// The line break style of a text that has no line breaks.
    pub default_eol: EndOfLine,
    /// Number of nodes the tree's search cache remembers.
    pub search_cache_capacity: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            normalize_eol: true,
            default_eol: EndOfLine::LF,
            search_cache_capacity: 1,
        }
    }
}

/// The output of [`TextBufferFactory::create()`].
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub tree: PieceTree,
    /// The tree's chunk buffers, add buffer first.
    pub buffers: Vec<Arc<ChunkBuffer>>,
    /// The byte order mark stripped from the input, or empty.
    pub bom: String,
    /// Line break counts of the input, before any normalization.
    pub eol_counts: EolCounts,
    pub might_contain_rtl: bool,
    pub might_contain_unusual_line_terminators: bool,
    pub might_contain_non_basic_ascii: bool,
}

/// The scanned input of a [`PieceTreeBuilder`], ready to become a tree.
#[derive(Debug, Clone)]
pub struct TextBufferFactory {
    chunks: Vec<ChunkBuffer>,
    bom: String,
    counts: EolCounts,
    contains_rtl: bool,
    contains_unusual_line_terminators: bool,
    is_basic_ascii: bool,
    chunk_size: usize,
}

impl TextBufferFactory {
    /// The line break style a tree created with `default` would use.
    #[inline]
    pub fn eol(&self, default: EndOfLine) -> EndOfLine {
        self.counts.dominant(default)
    }

    #[inline]
    pub fn bom(&self) -> &str {
        &self.bom
    }

    #[inline]
    pub fn eol_counts(&self) -> EolCounts {
        self.counts
    }

    /// Up to `limit` UTF-16 code units of the first line, without its
    /// terminator.
    pub fn first_line_text(&self, limit: usize) -> String {
        let mut text = String::new();
        let mut len = 0;
        for c in self.chunks.iter().flat_map(|c| c.as_str().chars()) {
            if c == '\r' || c == '\n' || len + c.len_utf16() > limit {
                break;
            }
            len += c.len_utf16();
            text.push(c);
        }
        text
    }

    /// Up to `limit` UTF-16 code units from the end of the last line.
    pub fn last_line_text(&self, limit: usize) -> String {
        let mut rev = Vec::new();
        let mut len = 0;
        for c in self.chunks.iter().rev().flat_map(|c| c.as_str().chars().rev()) {
            if c == '\r' || c == '\n' || len + c.len_utf16() > limit {
                break;
            }
            len += c.len_utf16();
            rev.push(c);
        }
        rev.into_iter().rev().collect()
    }

    /// Creates the piece tree, one piece per chunk buffer.
    pub fn create(self, options: &BuildOptions) -> BuildResult {
        let eol = self.counts.dominant(options.default_eol);
        let normalize = options.normalize_eol && self.counts.is_mixed_with(eol);
        let chunks = if normalize {
            normalize_chunks(self.chunks.iter().map(|c| c.as_str()), eol, self.chunk_size)
        } else {
            self.chunks
        };

        tracing::debug!(
            chunks = chunks.len(),
            ?eol,
            normalized = normalize,
            bom = !self.bom.is_empty(),
            "created piece tree"
        );

        let tree = PieceTree::from_buffers(
            chunks,
            eol,
            options.normalize_eol,
            self.chunk_size,
            options.search_cache_capacity,
        );
        BuildResult {
            buffers: tree.buffers().to_vec(),
            tree,
            bom: self.bom,
            eol_counts: self.counts,
            might_contain_rtl: self.contains_rtl,
            might_contain_unusual_line_terminators: self.contains_unusual_line_terminators,
            might_contain_non_basic_ascii: !self.is_basic_ascii,
        }
    }
}

//=============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn build(chunks: &[&str], options: &BuildOptions) -> BuildResult {
        let mut builder = PieceTreeBuilder::new();
        for chunk in chunks {
            builder.accept_chunk(chunk);
        }
        builder.finish().create(options)
    }

    fn no_normalize() -> BuildOptions {
        BuildOptions {
            normalize_eol: false,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn crlf_across_chunks() {
        let result = build(&["Hello\r", "\nWorld"], &BuildOptions::default());
        assert_eq!(result.tree, "Hello\r\nWorld");
        assert_eq!(1, result.tree.line_feed_count());
        assert_eq!(EolCounts { cr: 0, lf: 0, crlf: 1 }, result.eol_counts);
        result.tree.assert_integrity();
    }

    #[test]
    fn trailing_cr() {
        let result = build(&["a\nb\r"], &no_normalize());
        assert_eq!(result.tree, "a\nb\r");
        assert_eq!(EolCounts { cr: 1, lf: 1, crlf: 0 }, result.eol_counts);
        assert_eq!(1, result.tree.piece_count());

        let result = build(&["\r"], &no_normalize());
        assert_eq!(result.tree, "\r");
        assert_eq!(1, result.tree.line_feed_count());
    }

    #[test]
    fn cr_chunks() {
        let result = build(&["\r", "\r", "\n", "x"], &no_normalize());
        assert_eq!(result.tree, "\r\r\nx");
        assert_eq!(EolCounts { cr: 1, lf: 0, crlf: 1 }, result.eol_counts);
        assert_eq!(2, result.tree.line_feed_count());
        result.tree.assert_integrity();
    }

    #[test]
    fn bom_01() {
        let result = build(&["", "\u{FEFF}abc", "\u{FEFF}"], &BuildOptions::default());
        assert_eq!("\u{FEFF}", result.bom);
        assert_eq!(result.tree, "abc\u{FEFF}");

        let result = build(&["abc"], &BuildOptions::default());
        assert_eq!("", result.bom);
    }

    #[test]
    fn dominant_eol() {
        let counts = EolCounts { cr: 0, lf: 2, crlf: 1 };
        assert_eq!(EndOfLine::LF, counts.dominant(EndOfLine::CRLF));
        let counts = EolCounts { cr: 1, lf: 1, crlf: 1 };
        assert_eq!(EndOfLine::CRLF, counts.dominant(EndOfLine::LF));
        let counts = EolCounts { cr: 0, lf: 1, crlf: 1 };
        assert_eq!(EndOfLine::LF, counts.dominant(EndOfLine::CRLF));
        assert_eq!(EndOfLine::CRLF, EolCounts::default().dominant(EndOfLine::CRLF));
    }

    #[test]
    fn normalize_mixed() {
        let result = build(&["a\r\nb\r\n", "c\nd\re"], &BuildOptions::default());
        assert_eq!(EndOfLine::CRLF, result.tree.eol());
        assert_eq!(result.tree, "a\r\nb\r\nc\r\nd\r\ne");
        assert!(result.tree.is_eol_normalized());
        assert_eq!(EolCounts { cr: 1, lf: 1, crlf: 2 }, result.eol_counts);
        result.tree.assert_integrity();

        let result = build(&["a\r\nb\r\n", "c\nd\re"], &no_normalize());
        assert_eq!(result.tree, "a\r\nb\r\nc\nd\re");
        assert!(!result.tree.is_eol_normalized());
    }

    #[test]
    fn default_eol() {
        let options = BuildOptions {
            default_eol: EndOfLine::CRLF,
            ..BuildOptions::default()
        };
        let result = build(&["no breaks"], &options);
        assert_eq!(EndOfLine::CRLF, result.tree.eol());
    }

    #[test]
    fn small_chunks() {
        let mut builder = PieceTreeBuilder::with_chunk_size(4);
        builder.accept_chunk("abcdefgh\r\nijkl");
        let result = builder.finish().create(&no_normalize());
        assert!(result.tree.piece_count() >= 4);
        assert_eq!(result.tree.piece_count() + 1, result.buffers.len());
        assert_eq!(result.tree, "abcdefgh\r\nijkl");
        assert_eq!(4, result.tree.chunk_size());
        result.tree.assert_integrity();
    }

    #[test]
    fn hints() {
        let result = build(&["plain text\n"], &BuildOptions::default());
        assert!(!result.might_contain_rtl);
        assert!(!result.might_contain_unusual_line_terminators);
        assert!(!result.might_contain_non_basic_ascii);

        let result = build(&["plain", " שלום\u{2028}"], &BuildOptions::default());
        assert!(result.might_contain_rtl);
        assert!(result.might_contain_unusual_line_terminators);
        assert!(result.might_contain_non_basic_ascii);
    }

    #[test]
    fn line_previews() {
        let mut builder = PieceTreeBuilder::new();
        builder.accept_chunk("first line\r");
        builder.accept_chunk("\nmiddle\n");
        builder.accept_chunk("the last line");
        let factory = builder.finish();
        assert_eq!("first line", factory.first_line_text(100));
        assert_eq!("first", factory.first_line_text(5));
        assert_eq!("the last line", factory.last_line_text(100));
        assert_eq!("line", factory.last_line_text(4));
        assert_eq!("", factory.last_line_text(0));
    }
}
