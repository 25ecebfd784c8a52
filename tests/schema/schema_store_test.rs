//! Snapshot behavior of the schema store.

use std::sync::Arc;
use std::thread;

use autojoin::error::QueryError;
use autojoin::planner::JoinResolver;
use autojoin::schema::{RawMetadata, RawTable, SchemaError, SchemaGraph, SchemaStore};

fn store() -> SchemaStore {
    let graph = SchemaGraph::build(&RawMetadata {
        tables: vec![
            RawTable::new("customers")
                .column("id", "integer")
                .column("name", "text"),
            RawTable::new("orders")
                .column("id", "integer")
                .column("customer_id", "integer")
                .foreign_key("customer_id", "customers", "id"),
        ],
    })
    .unwrap();
    SchemaStore::new(graph)
}

fn derived() -> RawTable {
    RawTable::new("u_ann_spend")
        .column("customer_id", "integer")
        .column("sum_total", "float")
        .foreign_key("customer_id", "customers", "id")
}

#[test]
fn test_extend_leaves_held_snapshot_untouched() {
    let store = store();
    let before = store.snapshot();

    let version = store.extend(derived()).unwrap();
    assert_eq!(version, 2);
    assert_eq!(store.version(), 2);

    let after = store.snapshot();
    assert!(after.contains("u_ann_spend"));
    assert!(!before.contains("u_ann_spend"));

    let err = JoinResolver::new(&before)
        .resolve(&["orders", "u_ann_spend"])
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::UnknownTable(ref name)) if name == "u_ann_spend"
    ));

    let plan = JoinResolver::new(&after)
        .resolve(&["orders", "u_ann_spend"])
        .unwrap();
    assert_eq!(plan.tables(), ["orders", "customers", "u_ann_spend"]);
}

#[test]
fn test_failed_extend_keeps_current_snapshot() {
    let store = store();
    let bad = RawTable::new("u_bad")
        .column("id", "integer")
        .foreign_key("id", "missing", "id");

    assert!(matches!(
        store.extend(bad),
        Err(SchemaError::UnknownTable(ref name)) if name == "missing"
    ));
    assert_eq!(store.version(), 1);
    assert!(!store.snapshot().contains("u_bad"));
}

#[test]
fn test_replace_bumps_version() {
    let store = store();
    let graph = SchemaGraph::build(&RawMetadata {
        tables: vec![RawTable::new("only").column("id", "integer")],
    })
    .unwrap();

    assert_eq!(store.replace(graph), 2);
    assert_eq!(store.snapshot().tables(), ["only"]);
}

#[test]
fn test_concurrent_readers_and_writer() {
    let store = Arc::new(store());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..100 {
                    let graph = store.snapshot();
                    // A snapshot is internally consistent whichever version it is.
                    let plan = JoinResolver::new(&graph)
                        .resolve(&["customers", "orders"])
                        .unwrap();
                    assert_eq!(plan.steps().len(), 1);
                }
            })
        })
        .collect();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..10 {
                let table = RawTable::new(format!("u_t{}", i))
                    .column("customer_id", "integer")
                    .foreign_key("customer_id", "customers", "id");
                store.extend(table).unwrap();
            }
        })
    };

    for reader in readers {
        reader.join().unwrap();
    }
    writer.join().unwrap();

    assert_eq!(store.version(), 11);
    assert_eq!(store.snapshot().tables().len(), 12);
}
