use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use less_engine::{compile, parse, render_with_options, CompileOptions};

const FIXTURES: &[(&str, &str)] = &[
    ("baseline", include_str!("../fixtures/benchmark.less")),
    ("imports", include_str!("../fixtures/import.less")),
    ("mixins", include_str!("../fixtures/mixins.less")),
    ("arithmetic", include_str!("../fixtures/arithmetic.less")),
];

fn options(minify: bool) -> CompileOptions {
    CompileOptions {
        minify,
        ..CompileOptions::default()
    }
}

fn compile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("less_compile");
    for &(name, source) in FIXTURES {
        group.throughput(Throughput::Bytes(source.len() as u64));
        for minify in [false, true] {
            let id = BenchmarkId::new(name, if minify { "min" } else { "pretty" });
            group.bench_with_input(id, &minify, |b, &minify| {
                b.iter(|| compile(source, options(minify)).unwrap());
            });
        }
    }
    group.finish();
}

/// 解析与渲染分开计时，便于区分前端与求值的开销。
fn stage_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("less_stages");
    for &(name, source) in FIXTURES {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", name), source, |b, source| {
            b.iter(|| parse(source).unwrap());
        });

        let tree = parse(source).unwrap();
        let pretty = options(false);
        group.bench_with_input(BenchmarkId::new("render", name), &tree, |b, tree| {
            b.iter(|| render_with_options(tree, &pretty).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, compile_benchmarks, stage_benchmarks);
criterion_main!(benches);
