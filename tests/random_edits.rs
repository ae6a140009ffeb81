//! Long runs of random edits checked against a plain `String` after every
//! single operation.

extern crate fastrand;
extern crate piecetree;

use str_indices::utf16;

use piecetree::{BuildOptions, PieceTree, PieceTreeBuilder, Position};

const ALPHABET: &[&str] = &["\r", "\n", "\r\n", "\r", "\n", "a", "bc", "é", "こ", " "];

struct Model {
    text: String,
}

impl Model {
    fn byte_idx(&self, offset: usize) -> usize {
        utf16::to_byte_idx(&self.text, offset)
    }

    fn len(&self) -> usize {
        utf16::count(&self.text)
    }

    fn insert(&mut self, offset: usize, text: &str) {
        let idx = self.byte_idx(offset);
        self.text.insert_str(idx, text);
    }

    fn delete(&mut self, offset: usize, len: usize) {
        let start = self.byte_idx(offset);
        let end = self.byte_idx(offset + len);
        self.text.replace_range(start..end, "");
    }

    fn line_feeds(&self) -> usize {
        self.text.replace("\r\n", "\n").matches(['\r', '\n']).count()
    }

    fn position(&self, offset: usize) -> Position {
        let idx = self.byte_idx(offset);
        // Between the halves of a CRLF is still on the line the pair ends.
        if idx > 0 && self.text[..idx].ends_with('\r') && self.text[idx..].starts_with('\n') {
            let pos = self.position(offset - 1);
            return Position::new(pos.line_number, pos.column + 1);
        }
        let before = &self.text[..idx];
        let line = before.replace("\r\n", "\n").matches(['\r', '\n']).count();
        let line_start = before.rfind(['\r', '\n']).map_or(0, |i| i + 1);
        Position::new(line + 1, utf16::count(&before[line_start..]) + 1)
    }
}

fn random_text(rng: &mut fastrand::Rng) -> String {
    (0..rng.usize(1..6))
        .map(|_| ALPHABET[rng.usize(..ALPHABET.len())])
        .collect()
}

fn run(tree: &mut PieceTree, model: &mut Model, rng: &mut fastrand::Rng, ops: usize) {
    for _ in 0..ops {
        let len = model.len();
        let offset = rng.usize(..=len);
        match rng.u8(..4) {
            0 | 1 => {
                let text = random_text(rng);
                tree.insert(offset, &text).unwrap();
                model.insert(offset, &text);
            }
            2 => {
                let del_len = rng.usize(..=(len - offset).min(8));
                tree.delete(offset, del_len).unwrap();
                model.delete(offset, del_len);
            }
            _ => {
                let del_len = rng.usize(..=(len - offset).min(4));
                let text = random_text(rng);
                tree.replace(offset, del_len, &text).unwrap();
                model.delete(offset, del_len);
                model.insert(offset, &text);
            }
        }

        assert_eq!(tree, model.text.as_str());
        assert_eq!(model.len(), tree.len());
        assert_eq!(model.line_feeds(), tree.line_feed_count());

        // The edit offset is where a CRLF is most likely to have been
        // joined or split.
        let probe = offset.min(model.len());
        let position = tree.position_at(probe).unwrap();
        assert_eq!(model.position(probe), position);
        assert_eq!(Ok(probe), tree.offset_at(position.line_number, position.column));

        tree.assert_integrity();
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn random_edits_from_empty() {
    let mut rng = fastrand::Rng::with_seed(0xed17);
    let mut tree = PieceTree::new();
    let mut model = Model {
        text: String::new(),
    };

    run(&mut tree, &mut model, &mut rng, 2000);
}

#[test]
#[cfg_attr(miri, ignore)]
fn random_edits_small_chunks() {
    let mut rng = fastrand::Rng::with_seed(0xc4a1);
    let initial = "first\r\nsecond\nthird\rfourth\r\n\r\n".repeat(8);

    let mut builder = PieceTreeBuilder::with_chunk_size(8);
    for chunk in initial.as_bytes().chunks(5) {
        builder.accept_chunk(std::str::from_utf8(chunk).unwrap());
    }
    let options = BuildOptions {
        normalize_eol: false,
        ..BuildOptions::default()
    };
    let mut tree = builder.finish().create(&options).tree;
    let mut model = Model { text: initial };
    assert_eq!(tree, model.text.as_str());

    run(&mut tree, &mut model, &mut rng, 1500);
}

#[test]
#[cfg_attr(miri, ignore)]
fn random_edits_with_snapshots() {
    let mut rng = fastrand::Rng::with_seed(0x5a95);
    let mut tree = PieceTree::from_str("snap\r\nshot");
    let mut model = Model {
        text: "snap\r\nshot".to_string(),
    };

    let mut snapshots = Vec::new();
    for _ in 0..20 {
        run(&mut tree, &mut model, &mut rng, 50);
        snapshots.push((tree.create_snapshot(""), model.text.clone()));
    }
    for (snapshot, text) in &snapshots {
        assert_eq!(text, &snapshot.read());
    }
}
