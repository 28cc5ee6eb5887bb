//! Tests for the typed column store over the public API

use std::cell::RefCell;
use std::rc::Rc;
use strata::column::{open_column, Column};
use strata::common::test_utils::{init_test_logging, TempDir};
use strata::storage::{BufferPool, DiskManager};
use strata::types::{DataType, Value};

fn test_pool(dir: &TempDir) -> Rc<RefCell<BufferPool>> {
    let disk = DiskManager::new(dir.path()).expect("disk manager");
    Rc::new(RefCell::new(BufferPool::new(disk)))
}

/// Build a column of 10,000 Int32 values `i -> i` and check the point,
/// equality, range, and aggregate paths against closed forms.
#[test]
fn test_ten_thousand_int32_column() {
    init_test_logging();
    let dir = TempDir::new().expect("temp dir");
    let pool = test_pool(&dir);

    let mut column: Column<i32> =
        Column::open("bench/ints".to_string(), Rc::clone(&pool), 0).expect("open");

    for i in 0..10_000 {
        let record = column.append_cell(i).expect("append");
        assert_eq!(record, i as u64);
    }
    assert_eq!(column.len(), 10_000);

    assert_eq!(column.get_cell(0).expect("get"), 0);
    assert_eq!(column.get_cell(9_999).expect("get"), 9_999);

    assert_eq!(column.find_cells(&4242).expect("find"), vec![4242]);

    let mut ranged = column.find_cells_in_range(&10, &20).expect("range");
    ranged.sort_unstable();
    assert_eq!(ranged, (10..=20).collect::<Vec<u64>>());

    // sum of 0..=9999 = 10000 * 9999 / 2
    assert_eq!(column.sum_cells().expect("sum"), 49_995_000.0);
    assert_eq!(column.avg_cells().expect("avg"), 4_999.5);
}

#[test]
fn test_every_append_is_readable() {
    let dir = TempDir::new().expect("temp dir");
    let pool = test_pool(&dir);

    let mut column: Column<f32> =
        Column::open("t/floats".to_string(), Rc::clone(&pool), 0).expect("open");

    let values: Vec<f32> = (0..3000).map(|i| i as f32 * 0.5).collect();
    for v in &values {
        column.append_cell(*v).expect("append");
    }

    assert_eq!(column.len() as usize, values.len());
    for (i, v) in values.iter().enumerate() {
        assert_eq!(column.get_cell(i as u64).expect("get"), *v, "record {i}");
    }
}

#[test]
fn test_string_column_round_trips_and_indexes() {
    let dir = TempDir::new().expect("temp dir");
    let pool = test_pool(&dir);

    let mut column: Column<String> =
        Column::open("t/names".to_string(), Rc::clone(&pool), 0).expect("open");

    let names = ["John Smith", "Jane Doe", "Bob Wilson", "Jane Doe"];
    for name in names {
        column.append_cell(name.to_string()).expect("append");
    }

    assert_eq!(column.get_cell(2).expect("get"), "Bob Wilson");

    let mut found = column.find_cells(&"Jane Doe".to_string()).expect("find");
    found.sort_unstable();
    assert_eq!(found, vec![1, 3]);

    // 16 string cells per 4096-byte page; spill onto later pages.
    for i in 0..100 {
        column.append_cell(format!("extra-{i:03}")).expect("append");
    }
    assert_eq!(column.get_cell(103).expect("get"), "extra-099");
}

#[test]
fn test_bool_column_equality() {
    let dir = TempDir::new().expect("temp dir");
    let pool = test_pool(&dir);

    let mut column: Column<bool> =
        Column::open("t/flags".to_string(), Rc::clone(&pool), 0).expect("open");

    for i in 0..50u64 {
        column.append_cell(i % 3 == 0).expect("append");
    }

    let set = column.find_cells(&true).expect("find");
    assert_eq!(set.len(), 17);
    for record in set {
        assert!(column.get_cell(record).expect("get"));
    }

    // Bool aggregates coerce to zero.
    assert_eq!(column.sum_cells().expect("sum"), 0.0);
}

#[test]
fn test_index_agrees_with_scan() {
    let dir = TempDir::new().expect("temp dir");
    let pool = test_pool(&dir);

    let mut column: Column<i64> =
        Column::open("t/mod7".to_string(), Rc::clone(&pool), 0).expect("open");

    for i in 0..500i64 {
        column.append_cell(i % 7).expect("append");
    }

    // find_range(a, b) equals {i : a <= get(i) <= b} as sets.
    let mut indexed = column.find_cells_in_range(&2, &4).expect("range");
    indexed.sort_unstable();

    let mut scanned = Vec::new();
    for record in 0..column.len() {
        let v = column.get_cell(record).expect("get");
        if (2..=4).contains(&v) {
            scanned.push(record);
        }
    }

    assert_eq!(indexed, scanned);
}

#[test]
fn test_type_erased_column_handles() {
    let dir = TempDir::new().expect("temp dir");
    let pool = test_pool(&dir);

    let mut column = open_column(
        "t/any".to_string(),
        DataType::Float64,
        0,
        Rc::clone(&pool),
    )
    .expect("open");

    column.append(Value::Float64(2.5)).expect("append");
    column.append(Value::Float64(3.5)).expect("append");

    assert_eq!(column.data_type(), DataType::Float64);
    assert_eq!(column.size(), 2);
    assert_eq!(column.sum().expect("sum"), 6.0);
    assert_eq!(column.avg().expect("avg"), 3.0);
    assert_eq!(column.get(1).expect("get"), Value::Float64(3.5));

    assert!(column.append(Value::Bool(true)).is_err());
    assert!(column.find(&Value::Int32(2)).is_err());
}

#[test]
fn test_column_data_round_trips_through_disk() {
    let dir = TempDir::new().expect("temp dir");

    {
        let pool = test_pool(&dir);
        let mut column: Column<i32> =
            Column::open("t/persist".to_string(), Rc::clone(&pool), 0).expect("open");
        for i in 0..5_000 {
            column.append_cell(i * 3).expect("append");
        }
        pool.borrow_mut().sync().expect("sync");
    }

    let pool = test_pool(&dir);
    let column: Column<i32> =
        Column::open("t/persist".to_string(), Rc::clone(&pool), 0).expect("reopen");

    assert_eq!(column.len(), 5_000);
    for i in (0..5_000u64).step_by(613) {
        assert_eq!(column.get_cell(i).expect("get"), i as i32 * 3);
    }
    assert_eq!(column.find_cells(&(4_999 * 3)).expect("find"), vec![4_999]);
}
