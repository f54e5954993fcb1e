//! Performance benchmarks for the header pipeline.
//!
//! - Stages: lexing, preprocessing, parsing and assembly of one header
//! - Headers: each file in `test_headers/`
//! - Size: generated headers from 10 to 1000 classes
//! - Parsing modes: strict vs lenient

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cxxdecl::{ParseOptions, parse_header};
use cxxdecl_parser::{IncludeConfig, Lexer, MacroTable, Parser, Preprocessor};
use std::fmt::Write;
use std::hint::black_box;

const SHAPES: &str = include_str!("../test_headers/shapes.h");
const WIDGETS: &str = include_str!("../test_headers/widgets.h");
const DOC_COMMENTS: &str = include_str!("../test_headers/doc_comments.h");

/// A header declaring `classes` documented classes with a few members each.
fn generated_header(classes: usize) -> String {
    let mut source = String::from("#define API\nnamespace generated {\n");
    for i in 0..classes {
        let _ = write!(
            source,
            "/// Class number {i}.\nclass API Item{i} : public Base {{\npublic:\n  \
             explicit Item{i}(int id, const char *name = nullptr);\n  \
             virtual double Weight(int scale) const;\n  \
             void SetHandler(void (*handler)(Item{i} *, int));\n  \
             enum State {{ Idle, Busy = 4, Done }};\n  \
             int Values[8]; ///< Samples\n}};\n"
        );
    }
    source.push_str("}\n");
    source
}

/// Benchmark each stage of the pipeline on one header
fn stage_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/stages");
    group.throughput(Throughput::Bytes(SHAPES.len() as u64));

    group.bench_function("lex", |b| {
        b.iter(|| {
            let arena = Bump::new();
            black_box(Lexer::new(black_box(SHAPES), &arena).count())
        });
    });

    group.bench_function("preprocess", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut macros = MacroTable::new();
            let stream = Preprocessor::new(&mut macros, &arena, IncludeConfig::default())
                .run(black_box(SHAPES))
                .unwrap();
            black_box(stream.tokens.len())
        });
    });

    group.bench_function("parse", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut macros = MacroTable::new();
            let stream = Preprocessor::new(&mut macros, &arena, IncludeConfig::default())
                .run(black_box(SHAPES))
                .unwrap();
            let unit = Parser::new(stream.tokens, &arena).parse_translation_unit().unwrap();
            black_box(unit.items().len())
        });
    });

    group.bench_function("full", |b| {
        b.iter(|| {
            let parsed = parse_header(black_box(SHAPES), &ParseOptions::new()).unwrap();
            black_box(parsed.stats.classes)
        });
    });

    group.finish();
}

/// Benchmark the whole pipeline on each test header
fn header_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/headers");
    let options = ParseOptions::new();

    for (name, source) in [("shapes", SHAPES), ("widgets", WIDGETS), ("doc_comments", DOC_COMMENTS)] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let parsed = parse_header(black_box(source), &options).unwrap();
                black_box(parsed.file.contents.members.items.len())
            });
        });
    }

    group.finish();
}

/// Benchmark parsing performance across header sizes
fn size_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/sizes");
    let options = ParseOptions::new();

    for classes in [10, 100, 1000] {
        let source = generated_header(classes);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("classes", classes), &source, |b, source| {
            b.iter(|| {
                let parsed = parse_header(black_box(source), &options).unwrap();
                black_box(parsed.stats.functions)
            });
        });
    }

    group.finish();
}

/// Benchmark strict against lenient parsing
fn mode_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/modes");
    let source = generated_header(100);
    group.throughput(Throughput::Bytes(source.len() as u64));

    let strict = ParseOptions::new();
    group.bench_function("strict", |b| {
        b.iter(|| black_box(parse_header(black_box(&source), &strict).unwrap().stats.classes));
    });

    let lenient = ParseOptions::new().recover(true);
    group.bench_function("lenient", |b| {
        b.iter(|| black_box(parse_header(black_box(&source), &lenient).unwrap().stats.classes));
    });

    group.finish();
}

criterion_group!(
    benches,
    stage_benchmarks,
    header_benchmarks,
    size_benchmarks,
    mode_benchmarks
);

criterion_main!(benches);
