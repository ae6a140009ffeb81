#![no_main]

use libfuzzer_sys::{
    arbitrary::{self, Arbitrary},
    fuzz_target,
};
use piecetree::{BuildOptions, PieceTreeBuilder};

const SMALL_TEXT: &str = "Hello there!\r\nHow're you doing?\nIt's a fine day,\risn't it?\r\n";

#[derive(Arbitrary, Copy, Clone, Debug)]
enum Op<'a> {
    Insert(usize, &'a str),
    InsertChar(usize, char),
    Delete(usize, usize),
}

#[derive(Arbitrary, Copy, Clone, Debug)]
enum StartingText<'a> {
    Small,
    Custom(&'a str),
}

fuzz_target!(|data: (StartingText, Vec<&str>, u8, Vec<Op>)| {
    let mut builder = PieceTreeBuilder::with_chunk_size(data.2 as usize % 16 + 1);
    builder.accept_chunk(match data.0 {
        StartingText::Small => SMALL_TEXT,
        StartingText::Custom(s) => s,
    });
    for chunk in data.1 {
        builder.accept_chunk(chunk);
    }
    let mut tree = builder.finish().create(&BuildOptions::default()).tree;
    tree.assert_integrity();

    for op in data.3 {
        match op {
            Op::Insert(offset, s) => {
                let _ = tree.insert(offset, s);
            }
            Op::InsertChar(offset, c) => {
                let _ = tree.insert(offset, c.encode_utf8(&mut [0; 4]));
            }
            Op::Delete(offset, len) => {
                let _ = tree.delete(offset, len);
            }
        }
    }

    tree.assert_integrity();
});
