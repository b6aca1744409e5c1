//! Query throughput benchmarks
//!
//! Measures the three stages of running a query separately:
//! - Parsing query text into an AST
//! - Compiling the AST into a program
//! - Applying a compiled program to documents of 10, 100, 1000 and 10000 records
//!
//! Run benchmarks: `cargo bench --bench query_throughput`
//!
//! Compare specific stages:
//! ```
//! cargo bench --bench query_throughput -- "parse"
//! cargo bench --bench query_throughput -- "apply"
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jsonquery::{Compiler, JsonQuery, parse};
use serde_json::{Value, json};
use std::hint::black_box;

/// Queries of increasing complexity, each run over `generate_document` output.
fn queries() -> [(&'static str, &'static str); 4] {
    [
        ("get", ".records"),
        ("filter_sort_pick", ".records | filter(.city == \"Oslo\") | sort(.age) | pick(.name, .age)"),
        ("group_aggregate", ".records | groupBy(.city) | mapValues(map(.age) | average())"),
        ("selector_regex", ".records | filter(\"age >= 30 AND city <> 'Oslo'\") | filter(match(.name, \"^Person [0-9]*7$\"))"),
    ]
}

/// Generate a document with `count` records
fn generate_document(count: usize) -> Value {
    let cities = ["Oslo", "Bergen", "Trondheim", "Tromsø"];
    let records: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("Person {}", i),
                "age": 18 + (i * 7) % 60,
                "city": cities[i % cities.len()]
            })
        })
        .collect();
    json!({ "records": records })
}

/// Benchmark parsing each query from text
fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (name, text) in queries() {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| parse(black_box(text)).expect("Failed to parse query"));
        });
    }

    group.finish();
}

/// Benchmark compiling already parsed queries
fn benchmark_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let compiler = Compiler::new();

    for (name, text) in queries() {
        let node = parse(text).expect("Failed to parse query");
        group.bench_with_input(BenchmarkId::from_parameter(name), &node, |b, node| {
            b.iter(|| compiler.compile(black_box(node)).expect("Failed to compile query"));
        });
    }

    group.finish();
}

/// Benchmark applying compiled queries with varying record counts
fn benchmark_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for (name, text) in queries() {
        let query = JsonQuery::parse(text).expect("Failed to build query");
        for count in [10, 100, 1000, 10000] {
            let document = generate_document(count);
            group.throughput(Throughput::Elements(count as u64));
            group.bench_with_input(BenchmarkId::new(name, count), &document, |b, document| {
                b.iter(|| query.apply(black_box(document)).expect("Failed to apply query"));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_compile, benchmark_apply);
criterion_main!(benches);
