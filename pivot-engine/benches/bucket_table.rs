use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pivot_engine::{
    BucketTable, DimensionDef, FieldSelector, HashLookup, LinearScan, LookupStrategy, MetricDef,
    TableDefinition,
};

fn definition() -> TableDefinition {
    TableDefinition::new(
        vec![
            DimensionDef::new(vec![FieldSelector::Index(0)]),
            DimensionDef::new(vec![FieldSelector::Index(1)]),
        ],
        vec![
            MetricDef::new(FieldSelector::Index(2), "sum"),
            MetricDef::new(FieldSelector::Index(2), "stdev"),
        ],
    )
}

/// `groups` distinct (row, column) keys cycled over `rows` records.
fn records(rows: usize, groups: usize) -> Vec<Vec<String>> {
    let side = (groups as f64).sqrt().ceil() as usize;
    (0..rows)
        .map(|i| {
            let g = i % groups;
            vec![
                format!("r{}", g / side),
                format!("c{}", g % side),
                ((i % 100) as f64 * 0.5).to_string(),
            ]
        })
        .collect()
}

fn ingest<L: LookupStrategy>(records: &[Vec<String>]) -> usize {
    let mut table = BucketTable::<L>::with_strategy(&definition(), None).unwrap();
    for record in records {
        table.consume_row(record.as_slice()).unwrap();
    }
    table.len()
}

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_table_ingest");
    let rows = 20_000;
    group.throughput(Throughput::Elements(rows as u64));

    for groups in [16usize, 256, 1024] {
        let data = records(rows, groups);
        group.bench_with_input(BenchmarkId::new("hash", groups), &data, |b, data| {
            b.iter(|| black_box(ingest::<HashLookup>(data)))
        });
        group.bench_with_input(BenchmarkId::new("linear_scan", groups), &data, |b, data| {
            b.iter(|| black_box(ingest::<LinearScan>(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingestion);
criterion_main!(benches);
