//! Benchmarks for field patching and store rollback.
//!
//! Run with: `cargo bench --package bindery-core --bench field_patch`

use std::hint::black_box;
use std::sync::Arc;

use bindery_core::path::{self, FieldPath};
use bindery_core::state::{PartialBindingParam, UiState};
use bindery_core::store::{FieldUpdate, MemoryStore, UpdateOptions};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};

// ============================================================================
// Test Data Generation
// ============================================================================

/// A model with `width` sections of ten fields each.
fn wide_model(width: usize) -> Value {
    let mut root = Map::new();
    for section in 0..width {
        let fields: Map<String, Value> = (0..10)
            .map(|field| (format!("f{field}"), json!(field)))
            .collect();
        root.insert(format!("s{section}"), Value::Object(fields));
    }
    Value::Object(root)
}

fn bound(width: usize) -> (Arc<MemoryStore>, Arc<UiState>) {
    let store = Arc::new(MemoryStore::new("doc", wide_model(width)));
    let state = UiState::builder("Bench")
        .bind(PartialBindingParam::new(store.clone()))
        .build();
    (store, state)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_path_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("path");
    let doc = wide_model(100);

    group.bench_function("parse", |b| {
        b.iter(|| FieldPath::parse(black_box("s42.items[3].tags.0")))
    });

    let target = FieldPath::parse("s42.f7").unwrap();
    group.bench_function("get", |b| b.iter(|| path::get(black_box(&doc), &target)));

    group.bench_function("set", |b| {
        let mut doc = doc.clone();
        b.iter(|| path::set(&mut doc, &target, black_box(json!(1))))
    });

    group.finish();
}

fn bench_field_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_update");

    for width in [10, 100, 1000] {
        let (_store, state) = bound(width);
        let value = json!("edited");
        group.bench_with_input(BenchmarkId::new("write", width), &width, |b, _| {
            b.iter(|| {
                state.on_store_field_update(FieldUpdate {
                    store_key: "doc",
                    path: "s5.f3",
                    value: black_box(&value),
                    validation: None,
                    options: UpdateOptions::default(),
                })
            })
        });

        let validation = json!({"required": true});
        group.bench_with_input(BenchmarkId::new("validation", width), &width, |b, _| {
            b.iter(|| {
                state.on_store_field_update(FieldUpdate {
                    store_key: "doc",
                    path: "s5.f3",
                    value: &Value::Null,
                    validation: Some(black_box(&validation)),
                    options: UpdateOptions::default(),
                })
            })
        });
    }

    group.finish();
}

fn bench_rollback(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollback");

    for width in [10, 100, 1000] {
        let (_store, state) = bound(width);
        group.bench_with_input(BenchmarkId::new("store", width), &width, |b, _| {
            b.iter(|| state.cancel_stores_changes(["doc"], true, false))
        });
        group.bench_with_input(BenchmarkId::new("path", width), &width, |b, _| {
            b.iter(|| state.cancel_changes_by_path(black_box("s5.f3"), "doc", false))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_path_access, bench_field_update, bench_rollback);
criterion_main!(benches);
