extern crate criterion;
extern crate fastrand;
extern crate piecetree;

use criterion::{criterion_group, criterion_main, Criterion};
use piecetree::{PieceTree, SearchQuery};

fn make_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Line {} of the text, with some こんにちは in it.\r\n", i))
        .collect()
}

fn edited_tree() -> PieceTree {
    let mut tree = PieceTree::from_str(&make_text(20_000));
    let mut rng = fastrand::Rng::with_seed(5);
    for _ in 0..2000 {
        let len = tree.len();
        tree.insert(rng.usize(..=len), "ab\n").unwrap();
    }
    tree
}

//----

fn position_at(c: &mut Criterion) {
    let tree = edited_tree();
    let len = tree.len();
    let mut rng = fastrand::Rng::with_seed(1);
    c.bench_function("position_at", |bench| {
        bench.iter(|| tree.position_at(rng.usize(..=len)).unwrap())
    });
}

fn offset_at(c: &mut Criterion) {
    let tree = edited_tree();
    let lines = tree.line_count();
    let mut rng = fastrand::Rng::with_seed(1);
    c.bench_function("offset_at", |bench| {
        bench.iter(|| tree.offset_at(rng.usize(1..=lines), 1).unwrap())
    });
}

//----

fn line_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_content");

    group.bench_function("random", |bench| {
        let mut tree = edited_tree();
        let lines = tree.line_count();
        let mut rng = fastrand::Rng::with_seed(2);
        bench.iter(|| tree.line_content(rng.usize(1..=lines)).unwrap())
    });

    // Walking the lines in order is what the search cache is for.
    group.bench_function("sequential", |bench| {
        let mut tree = edited_tree();
        let lines = tree.line_count();
        let mut line = 0;
        bench.iter(|| {
            line = line % lines + 1;
            tree.line_content(line).unwrap()
        })
    });
}

fn text_range(c: &mut Criterion) {
    let tree = edited_tree();
    let len = tree.len();
    let mut rng = fastrand::Rng::with_seed(4);
    c.bench_function("text_range", |bench| {
        bench.iter(|| {
            let start = rng.usize(..=len);
            let end = (start + 200).min(len);
            tree.text_range(start, end - start)
        })
    });
}

fn chunks(c: &mut Criterion) {
    let tree = edited_tree();
    c.bench_function("chunks", |bench| {
        bench.iter(|| tree.chunks().map(str::len).sum::<usize>())
    });
}

//----

fn find_matches(c: &mut Criterion) {
    let mut tree = edited_tree();
    let literal = SearchQuery::literal("こんにちは").unwrap();
    let regex = SearchQuery::new(r"Line (\d+)", true, true, false).unwrap();

    let mut group = c.benchmark_group("find_matches");
    group.sample_size(20);
    group.bench_function("literal", |bench| {
        bench.iter(|| tree.find_matches(None, &literal, false, usize::MAX).unwrap())
    });
    group.bench_function("regex_captures", |bench| {
        bench.iter(|| tree.find_matches(None, &regex, true, usize::MAX).unwrap())
    });
}

//----

criterion_group!(
    benches,
    position_at,
    offset_at,
    line_content,
    text_range,
    chunks,
    find_matches
);
criterion_main!(benches);
