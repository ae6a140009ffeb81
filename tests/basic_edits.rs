extern crate piecetree;

use piecetree::{BuildOptions, PieceTree, PieceTreeBuilder, DEFAULT_CHUNK_SIZE};

fn build(chunks: &[&str], chunk_size: usize) -> PieceTree {
    let mut builder = PieceTreeBuilder::with_chunk_size(chunk_size);
    for chunk in chunks {
        builder.accept_chunk(chunk);
    }
    builder.finish().create(&BuildOptions::default()).tree
}

#[test]
fn replace_hello_world() {
    let mut tree = PieceTree::from_str("hello world");
    tree.replace(6, 5, "piece tree").unwrap();

    assert_eq!(tree, "hello piece tree");
    assert_eq!(16, tree.len());
    tree.assert_integrity();
}

#[test]
fn crlf_across_builder_chunks() {
    let mut tree = build(&["Hello\r", "\nWorld"], DEFAULT_CHUNK_SIZE);

    assert_eq!(tree, "Hello\r\nWorld");
    assert_eq!(1, tree.line_feed_count());
    assert_eq!("Hello\r\n", tree.line_content(1).unwrap());
    assert_eq!("World", tree.line_content(2).unwrap());
    tree.assert_integrity();
}

#[test]
fn interleaved_line_break() {
    let mut tree = build(&["\r\nxx"], DEFAULT_CHUNK_SIZE);
    tree.insert(1, "\n").unwrap();

    assert_eq!(tree, "\r\n\nxx");
    assert_eq!(2, tree.line_feed_count());
    assert_eq!("\r\n", tree.line_content(1).unwrap());
    assert_eq!("\n", tree.line_content(2).unwrap());
    assert_eq!("xx", tree.line_content(3).unwrap());
    tree.assert_integrity();
}

#[test]
fn tail_typing_uses_add_buffer() {
    let mut tree = PieceTree::new();
    let buffer_count = tree.buffer_count();
    let add_len = tree.buffer(0).unwrap().len();

    for c in "abcdefghij".chars() {
        let len = tree.len();
        tree.insert(len, c.encode_utf8(&mut [0; 4])).unwrap();
    }

    assert_eq!(tree, "abcdefghij");
    assert_eq!(buffer_count, tree.buffer_count());
    assert!(tree.buffer(0).unwrap().len() >= add_len + 10);
    assert_eq!(1, tree.piece_count());
    tree.assert_integrity();
}

#[test]
fn tail_typing_after_load() {
    let mut tree = build(&["line one\nline two\n"], DEFAULT_CHUNK_SIZE);
    let buffer_count = tree.buffer_count();

    for c in "typed\r\n".chars() {
        let len = tree.len();
        tree.insert(len, c.encode_utf8(&mut [0; 4])).unwrap();
    }

    assert_eq!(tree, "line one\nline two\ntyped\r\n");
    assert_eq!(buffer_count, tree.buffer_count());
    assert_eq!(2, tree.piece_count());
    assert_eq!(3, tree.line_feed_count());
    tree.assert_integrity();
}

#[test]
fn large_insert_is_chunked() {
    let mut tree = build(&[], 64);
    let pieces_before = tree.piece_count();
    let text: String = (0..40).map(|i| format!("line {}\r\n", i)).collect();
    tree.insert(0, &text).unwrap();

    assert!(tree.piece_count() >= pieces_before + 2);
    assert_eq!(tree, text.as_str());
    assert_eq!(40, tree.line_feed_count());
    tree.assert_integrity();
}

#[test]
fn large_insert_default_chunk_size() {
    let mut tree = PieceTree::new();
    let text = "0123456789\n".repeat(DEFAULT_CHUNK_SIZE / 10);
    tree.insert(0, &text).unwrap();

    assert!(tree.piece_count() >= 2);
    assert_eq!(tree, text.as_str());
    assert_eq!(DEFAULT_CHUNK_SIZE / 10, tree.line_feed_count());
    tree.assert_integrity();
}

#[test]
fn edit_session() {
    let mut tree = build(&["fn main() {\n", "    println!(\"hi\");\n", "}\n"], 16);

    tree.insert(12, "    let x = 1;\n").unwrap();
    tree.replace(40, 4, "x").unwrap();
    tree.delete(0, 3).unwrap();
    tree.insert(0, "pub fn ").unwrap();

    assert_eq!(tree, "pub fn main() {\n    let x = 1;\n    println!(x);\n}\n");
    assert_eq!(4, tree.line_feed_count());
    assert_eq!("    let x = 1;", tree.line_without_eol(2).unwrap());
    tree.assert_integrity();
}
