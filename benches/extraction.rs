//! Benchmarks for chart extraction and resolution.
//!
//! Run with: cargo bench
//!
//! Packages are generated in memory with the test fixtures, so no files are
//! needed. Results are saved to `target/criterion/` with HTML reports.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::cast_possible_truncation
)]

#[path = "../tests/fixtures/mod.rs"]
mod fixtures;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fixtures::{bar_chart, classic_chart, ser_ref, SheetBuilder, XlsxBuilder};
use xlchart::{
    extract_charts, ChartSession, ExtractOptions, Package, PlotHandle, RecordingSurface,
    WorkbookModel,
};

/// `sheets` sheets, each with `rows` data rows and two charts over them.
fn generate(sheets: usize, rows: usize) -> Vec<u8> {
    let mut builder = XlsxBuilder::new();
    for s in 0..sheets {
        let name = format!("Sheet{}", s + 1);
        let values: Vec<f64> = (0..rows).map(|r| (r * (s + 1)) as f64).collect();
        let labels: Vec<String> = (0..rows).map(|r| format!("Item {r}")).collect();
        let last = rows + 1;
        let series = [ser_ref(
            &format!("{name}!$B$1"),
            &format!("{name}!$A$2:$A${last}"),
            &format!("{name}!$B$2:$B${last}"),
        )];
        builder = builder.sheet(
            SheetBuilder::new(&name)
                .cell("B1", "Value")
                .column("A2", &labels)
                .column("B2", &values)
                .chart(bar_chart(Some("Bars"), &series))
                .chart(classic_chart("lineChart", Some("Lines"), &series).at(10, 0)),
        );
    }
    builder.build()
}

fn bench_open(c: &mut Criterion) {
    let data = generate(8, 200);
    let mut group = c.benchmark_group("open");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("package_open", |b| {
        b.iter(|| Package::open(black_box(data.clone())).expect("open"))
    });
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_charts");
    for sheets in [1, 8, 32] {
        let package = Package::open(generate(sheets, 50)).expect("open");
        group.bench_with_input(BenchmarkId::from_parameter(sheets), &package, |b, package| {
            b.iter(|| extract_charts(black_box(package)))
        });
    }
    group.finish();
}

fn bench_cached_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_model");
    for rows in [100, 1_000, 10_000] {
        let package = Package::open(generate(1, rows)).expect("open");
        let manifest = extract_charts(&package).manifest;
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| WorkbookModel::from_package(black_box(&package), &manifest))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut session: ChartSession<PlotHandle> =
        ChartSession::load(generate(1, 1_000), ExtractOptions::default());
    let model = session.cached_model();
    let mut surface = RecordingSurface::default();

    c.bench_function("render_sheet_1000_rows", |b| {
        b.iter(|| session.render(black_box(&model), &mut surface))
    });
}

criterion_group!(benches, bench_open, bench_extract, bench_cached_model, bench_render);
criterion_main!(benches);
