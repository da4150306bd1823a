//! Sheet loader benchmarks.
//!
//! Covers the paths a presentation layer hits on every frame or keystroke:
//! - `list_sections` over a large listing
//! - `get_or_load` on an already loaded sheet (status guard fast path)
//! - full load of a sheet through materialization
//! - snapshot and restore of a large registry

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sheet_core::{FetchGateway, Result, SheetData, SheetGroupData, SheetId};
use sheet_loader::sheet::SheetLoader;
use sheet_workbook::WorkbookMaterializer;
use std::hint::black_box;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Serves the same workbook for every id.
struct StaticGateway {
    raw: String,
}

#[async_trait]
impl FetchGateway for StaticGateway {
    async fn fetch(&self, _id: SheetId) -> Result<SheetData> {
        Ok(SheetData {
            raw: self.raw.clone(),
            revisions: Vec::new(),
        })
    }
}

/// Workbook with `cells` numeric cells on one sheet.
fn generate_workbook(cells: usize) -> String {
    let cells: serde_json::Map<String, serde_json::Value> = (0..cells)
        .map(|i| (format!("A{}", i + 1), serde_json::json!({ "content": i.to_string() })))
        .collect();
    serde_json::json!({
        "version": 1,
        "sheets": [{ "id": "s1", "name": "Data", "cells": cells }]
    })
    .to_string()
}

fn create_loader(sheets: u64, groups: u64) -> SheetLoader {
    let gateway = Arc::new(StaticGateway {
        raw: generate_workbook(100),
    });
    let loader = SheetLoader::new(gateway, Arc::new(WorkbookMaterializer::new()));

    for id in 0..sheets {
        loader.register_sheet(SheetId::new(id), format!("Sheet {id}"));
    }
    let per_group = sheets / groups;
    let listing = (0..groups)
        .map(|g| SheetGroupData {
            id: g,
            name: format!("Group {g}"),
            sheet_ids: (g * per_group..(g + 1) * per_group)
                .map(SheetId::new)
                .collect(),
        })
        .collect();
    loader.set_groups(listing);
    loader
}

fn bench_list_sections(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_sections");

    for sheets in [10u64, 100, 1000] {
        let loader = create_loader(sheets, 10);
        group.bench_with_input(BenchmarkId::from_parameter(sheets), &loader, |b, loader| {
            b.iter(|| black_box(loader.list_sections()));
        });
    }

    group.finish();
}

fn bench_get_or_load_loaded(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let loader = create_loader(100, 10);
    rt.block_on(loader.load_and_wait(SheetId::new(1))).unwrap();

    c.bench_function("get_or_load_loaded", |b| {
        b.iter(|| black_box(loader.get_or_load(black_box(SheetId::new(1)))));
    });
}

fn bench_full_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("full_load");

    for cells in [10usize, 1000] {
        let gateway = Arc::new(StaticGateway {
            raw: generate_workbook(cells),
        });
        group.bench_with_input(BenchmarkId::from_parameter(cells), &gateway, |b, gateway| {
            b.iter(|| {
                rt.block_on(async {
                    let loader = SheetLoader::new(
                        Arc::clone(gateway) as Arc<dyn FetchGateway>,
                        Arc::new(WorkbookMaterializer::new()),
                    );
                    loader.register_sheet(SheetId::new(1), "Bench");
                    black_box(loader.load_and_wait(SheetId::new(1)).await)
                })
            });
        });
    }

    group.finish();
}

fn bench_snapshot_restore(c: &mut Criterion) {
    let loader = create_loader(1000, 10);
    let snapshot = loader.snapshot();

    c.bench_function("snapshot_1000", |b| {
        b.iter(|| black_box(loader.snapshot()));
    });

    c.bench_function("restore_1000", |b| {
        b.iter(|| loader.restore(black_box(snapshot.clone())));
    });
}

criterion_group!(
    benches,
    bench_list_sections,
    bench_get_or_load_loaded,
    bench_full_load,
    bench_snapshot_restore
);
criterion_main!(benches);
