use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use strata::common::test_utils::TempDir;
use strata::{DataType, Database, Row, Value};

fn populated_db(rows: i32) -> (TempDir, Database) {
    let dir = TempDir::new().expect("temp dir");
    let mut db = Database::open(dir.path().join("db")).expect("open");

    let table = db.create_table("events").expect("create");
    table.add_column("id", DataType::Int32).expect("id");
    table.add_column("value", DataType::Float64).expect("value");
    table.add_column("category", DataType::Int32).expect("category");

    let batch: Vec<Row> = (0..rows)
        .map(|i| {
            let mut row = Row::new();
            row.insert("id".to_string(), Value::Int32(i));
            row.insert("value".to_string(), Value::Float64(f64::from(i) * 1.5));
            row.insert("category".to_string(), Value::Int32(i % 10));
            row
        })
        .collect();
    db.get_table("events")
        .expect("table")
        .bulk_insert(&batch)
        .expect("bulk insert");

    (dir, db)
}

fn benchmark_append(c: &mut Criterion) {
    c.bench_function("append_1000_int32", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().expect("temp dir");
                let mut db = Database::open(dir.path().join("db")).expect("open");
                let table = db.create_table("t").expect("create");
                table.add_column("n", DataType::Int32).expect("n");
                (dir, db)
            },
            |(dir, mut db)| {
                let table = db.get_table("t").expect("table");
                for i in 0..1000 {
                    let mut row = Row::new();
                    row.insert("n".to_string(), Value::Int32(i));
                    table.insert_row(&row).expect("insert");
                }
                (dir, db)
            },
            BatchSize::PerIteration,
        );
    });
}

fn benchmark_indexed_lookup(c: &mut Criterion) {
    let (_dir, mut db) = populated_db(100_000);

    c.bench_function("indexed_select_category", |b| {
        b.iter(|| {
            let table = db.get_table("events").expect("table");
            let hits = table
                .indexed_select("category", black_box(&Value::Int32(5)), &["id"])
                .expect("select");
            black_box(hits.len())
        });
    });
}

fn benchmark_range_lookup(c: &mut Criterion) {
    let (_dir, mut db) = populated_db(100_000);

    c.bench_function("range_select_value", |b| {
        b.iter(|| {
            let table = db.get_table("events").expect("table");
            let hits = table
                .range_select(
                    "value",
                    black_box(&Value::Float64(10_000.0)),
                    black_box(&Value::Float64(20_000.0)),
                    &["id"],
                )
                .expect("select");
            black_box(hits.len())
        });
    });
}

fn benchmark_full_scan_sum(c: &mut Criterion) {
    let (_dir, mut db) = populated_db(100_000);

    c.bench_function("sum_full_scan", |b| {
        b.iter(|| {
            let table = db.get_table("events").expect("table");
            let total = table.column("value").expect("column").sum().expect("sum");
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    benchmark_append,
    benchmark_indexed_lookup,
    benchmark_range_lookup,
    benchmark_full_scan_sum
);
criterion_main!(benches);
