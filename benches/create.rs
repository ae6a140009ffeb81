extern crate criterion;
extern crate piecetree;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use piecetree::{BuildOptions, PieceTree, PieceTreeBuilder};

fn make_text(lines: usize, eol: &str) -> String {
    (0..lines)
        .map(|i| format!("Line {} of the text, with some こんにちは in it.{}", i, eol))
        .collect()
}

//----

fn from_str(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_str");

    for (name, lines) in [("small", 20), ("medium", 2000), ("large", 50_000)] {
        let text = make_text(lines, "\n");
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(name, |bench| {
            bench.iter(|| PieceTree::from_str(&text));
        });
    }
}

fn builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");
    let text = make_text(50_000, "\r\n");
    group.throughput(Throughput::Bytes(text.len() as u64));

    // 64 KiB blocks, as when reading a file.
    group.bench_function("blocks", |bench| {
        bench.iter(|| {
            let mut builder = PieceTreeBuilder::new();
            let mut rest = text.as_str();
            while !rest.is_empty() {
                let mut split = rest.len().min(1 << 16);
                while !rest.is_char_boundary(split) {
                    split -= 1;
                }
                builder.accept_chunk(&rest[..split]);
                rest = &rest[split..];
            }
            builder.finish().create(&BuildOptions::default())
        });
    });

    let mixed = make_text(25_000, "\r\n") + &make_text(25_000, "\n");
    group.bench_function("normalize", |bench| {
        bench.iter(|| {
            let mut builder = PieceTreeBuilder::new();
            builder.accept_chunk(&mixed);
            builder.finish().create(&BuildOptions::default())
        });
    });
}

//----

fn snapshot(c: &mut Criterion) {
    let mut tree = PieceTree::from_str(&make_text(50_000, "\n"));
    let mut rng = fastrand::Rng::with_seed(1);
    for _ in 0..1000 {
        let len = tree.len();
        tree.insert(rng.usize(..=len), "edit").unwrap();
    }

    c.bench_function("create_snapshot", |bench| {
        bench.iter(|| tree.create_snapshot(""));
    });
    c.bench_function("snapshot_read", |bench| {
        let snapshot = tree.create_snapshot("");
        bench.iter(|| snapshot.read());
    });
}

//----

criterion_group!(benches, from_str, builder, snapshot);
criterion_main!(benches);
