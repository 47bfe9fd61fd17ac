use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use mailnorm::config::ParsingConfig;
use mailnorm::parser::mbox::{self, InputMode};

fn load_fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_split_mbox(c: &mut Criterion) {
    let data = load_fixture("simple.mbox");

    c.bench_function("split_simple_mbox", |b| {
        b.iter(|| mbox::split(&data, InputMode::Mbox).count())
    });
}

fn bench_normalize(c: &mut Criterion) {
    let data = load_fixture("simple.mbox");
    let options = ParsingConfig::default();

    c.bench_function("normalize_simple_mbox", |b| {
        b.iter(|| mailnorm::normalize_stream(&data, &options).count())
    });
}

criterion_group!(benches, bench_split_mbox, bench_normalize);
criterion_main!(benches);
