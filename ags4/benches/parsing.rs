//! Benchmarks pour le parsing AGS

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ags4::{extract, parse_all, parse_group, GroupSpecs};

/// Fichier synthétique : `boreholes` sondages de 10 couches
fn synthetic(boreholes: usize) -> String {
    let mut content = String::from(
        "\"GROUP\",\"LOCA\"\n\"HEADING\",\"LOCA_ID\",\"LOCA_NATE\",\"LOCA_NATN\",\"LOCA_GL\"\n\"TYPE\",\"ID\",\"2DP\",\"2DP\",\"2DP\"\n",
    );
    for i in 0..boreholes {
        content.push_str(&format!(
            "\"DATA\",\"BH{}\",\"{:.2}\",\"{:.2}\",\"12.00\"\n",
            i,
            530000.0 + i as f64,
            180000.0 + i as f64
        ));
    }
    content.push_str(
        "\"GROUP\",\"GEOL\"\n\"HEADING\",\"LOCA_ID\",\"GEOL_TOP\",\"GEOL_BASE\",\"GEOL_DESC\",\"GEOL_LEG\"\n\"TYPE\",\"ID\",\"2DP\",\"2DP\",\"X\",\"PA\"\n",
    );
    for i in 0..boreholes {
        for layer in 0..10 {
            content.push_str(&format!(
                "\"DATA\",\"BH{}\",\"{:.2}\",\"{:.2}\",\"Stiff grey CLAY, fissured\",\"CLAY\"\n",
                i,
                layer as f64,
                layer as f64 + 1.0
            ));
        }
    }
    content
}

fn bench_parse_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_single");
    for size in [100usize, 1_000] {
        let content = synthetic(size);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("all_groups", size), &content, |b, c| {
            b.iter(|| black_box(parse_all("bench.ags", black_box(c))))
        });
        group.bench_with_input(BenchmarkId::new("loca_only", size), &content, |b, c| {
            b.iter(|| black_box(parse_group("bench.ags", black_box(c), "LOCA")))
        });
    }
    group.finish();
}

fn bench_extract_parallel(c: &mut Criterion) {
    use rayon::prelude::*;

    let files: Vec<String> = (0..8).map(|_| synthetic(500)).collect();
    let total: u64 = files.iter().map(|f| f.len() as u64).sum();
    let specs = GroupSpecs::default();

    let mut group = c.benchmark_group("extract_batch");
    group.throughput(Throughput::Bytes(total));
    group.sample_size(10);

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let rows: usize = files
                .iter()
                .map(|f| extract("bench.ags", f, &specs).geol.map_or(0, |g| g.len()))
                .sum();
            black_box(rows)
        })
    });

    group.bench_function("parallel", |b| {
        b.iter(|| {
            let rows: usize = files
                .par_iter()
                .map(|f| extract("bench.ags", f, &specs).geol.map_or(0, |g| g.len()))
                .sum();
            black_box(rows)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse_single, bench_extract_parallel);
criterion_main!(benches);
