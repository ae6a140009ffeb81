#![no_main]

use libfuzzer_sys::{
    arbitrary::{self, Arbitrary},
    fuzz_target,
};
use piecetree::{PieceTree, SearchQuery};
use str_indices::utf16;

const SMALL_TEXT: &str = "Hello there!\r\nHow're you doing?\nIt's a fine day,\risn't it?\r\n";

#[derive(Arbitrary, Copy, Clone, Debug)]
enum Op<'a> {
    Insert(usize, &'a str),
    Delete(usize, usize),
    Replace(usize, usize, &'a str),
    LineContent(usize),
    PositionAt(usize),
    Search(&'a str),
    Snapshot,
}

#[derive(Arbitrary, Copy, Clone, Debug)]
enum StartingText<'a> {
    Small,
    Custom(&'a str),
}

fuzz_target!(|data: (StartingText, Vec<Op>)| {
    let mut tree = PieceTree::from_str(match data.0 {
        StartingText::Small => SMALL_TEXT,
        StartingText::Custom(s) => s,
    });

    for op in data.1 {
        match op {
            Op::Insert(offset, s) => {
                let _ = tree.insert(offset, s);
            }
            Op::Delete(offset, len) => {
                let _ = tree.delete(offset, len);
            }
            Op::Replace(offset, len, s) => {
                let _ = tree.replace(offset, len, s);
            }
            Op::LineContent(line) => {
                let _ = tree.line_content(line);
            }
            Op::PositionAt(offset) => {
                if let Ok(position) = tree.position_at(offset) {
                    let _ = tree.offset_at(position.line_number, position.column);
                }
            }
            Op::Search(pattern) => {
                if let Ok(query) = SearchQuery::literal(pattern) {
                    let _ = tree.find_matches(None, &query, true, 16);
                }
            }
            Op::Snapshot => {
                let text = tree.text();
                assert_eq!(text, tree.create_snapshot("").read());
            }
        }
    }

    let text = tree.text();
    assert_eq!(utf16::count(&text), tree.len());
    tree.assert_integrity();
});
