//! This bench test simulates adding licenses to an inventory that already
//! holds a large number of rows, and classifying the result.

#![allow(missing_docs)]

use chrono::{Days, NaiveDate};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use licman::{
    Store, Table,
    domain::{LICENSE_FIELDS, NewLicense},
};
use tempfile::TempDir;

fn license(i: u64) -> NewLicense {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    NewLicense {
        software_name: format!("Product {i}"),
        category: "Productivity".to_string(),
        license_key: format!("KEY-{i:06}"),
        assigned_department: "Finance".to_string(),
        assigned_device: None,
        start_date: start,
        expiry_date: start + Days::new(1 + i % 730),
    }
}

/// Writes `count` licenses directly, bypassing identifier allocation.
fn preseed_store(count: u64) -> TempDir {
    let tmp_dir = TempDir::new().unwrap();
    let store = Store::open(tmp_dir.path().to_path_buf()).unwrap();
    let records: Vec<_> = (1..=count)
        .map(|i| license(i).into_record(&format!("L{i:03}")))
        .collect();
    store
        .save(Table::Licenses, LICENSE_FIELDS, &records)
        .unwrap();
    tmp_dir
}

fn append_many(c: &mut Criterion) {
    c.bench_function("append to 1000 licenses", |b| {
        b.iter_batched(
            || preseed_store(1000),
            |tmp_dir| {
                let store = Store::open(tmp_dir.path().to_path_buf()).unwrap();
                for i in 0..10 {
                    store.add_license(license(i)).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn classify_many(c: &mut Criterion) {
    let tmp_dir = preseed_store(5000);
    let store = Store::open(tmp_dir.path().to_path_buf()).unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    c.bench_function("classify 5000 licenses", |b| {
        b.iter(|| store.classify_licenses(today));
    });
}

criterion_group!(benches, append_many, classify_many);
criterion_main!(benches);
