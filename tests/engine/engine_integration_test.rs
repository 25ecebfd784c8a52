//! End-to-end runs against in-memory SQLite.

use autojoin::builder::{Aggregate, ColumnSpec, QueryRequest, SortDirection, UpdateRequest};
use autojoin::config::Settings;
use autojoin::engine::Engine;
use autojoin::error::{ErrorKind, QueryError};
use autojoin::executor::SqliteExecutor;
use autojoin::introspect::{SchemaSource, SqliteSource};
use autojoin::planner::JoinResolver;
use autojoin::schema::{ColumnType, MetadataFilter, SchemaError};
use autojoin::sql::Value;

fn engine_with(settings: Settings) -> Engine<SqliteExecutor> {
    let executor = SqliteExecutor::open_in_memory().unwrap();
    executor
        .connection()
        .execute_batch(
            "
            CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT, city TEXT);
            CREATE TABLE orders (
                id INTEGER PRIMARY KEY,
                customer_id INTEGER REFERENCES customers(id),
                total REAL
            );
            CREATE TABLE audit_log (id INTEGER PRIMARY KEY, message TEXT);
            INSERT INTO customers VALUES (1, 'Ada', 'Oslo'), (2, 'Bob', 'Rome'), (3, 'Cy', 'Oslo');
            INSERT INTO orders VALUES (10, 1, 20.0), (11, 1, 5.5), (12, 2, 100.0);
            ",
        )
        .unwrap();

    let raw = SqliteSource::new(executor.connection()).introspect().unwrap();
    Engine::from_metadata(raw, executor, settings).unwrap()
}

fn engine() -> Engine<SqliteExecutor> {
    engine_with(Settings::default())
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[test]
fn test_run_grouped_query() {
    let engine = engine();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name").alias("customer").group_by(),
        ColumnSpec::new("orders", "total")
            .alias("spend")
            .aggregate(Aggregate::Sum)
            .sort(SortDirection::Desc),
    ]);

    let result = engine.run_query(request).unwrap();
    assert_eq!(result.columns, ["customer", "spend"]);
    assert_eq!(
        result.rows,
        vec![
            vec![text("Bob"), Value::Float(100.0)],
            vec![text("Ada"), Value::Float(25.5)],
        ]
    );
}

#[test]
fn test_run_filtered_query() {
    let engine = engine();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name").alias("customer"),
        ColumnSpec::new("customers", "city").alias("city").filter("=", "Oslo"),
        ColumnSpec::new("orders", "total").alias("total").filter(">", "10"),
    ]);
    let result = engine.run_query(request).unwrap();
    assert_eq!(
        result.rows,
        vec![vec![text("Ada"), text("Oslo"), Value::Float(20.0)]]
    );
}

#[test]
fn test_default_limit_applies_when_unset() {
    let mut settings = Settings::default();
    settings.query.default_limit = Some(1);
    let engine = engine_with(settings);

    let request = QueryRequest::new(vec![ColumnSpec::new("customers", "id").alias("id")]);
    assert_eq!(engine.run_query(request.clone()).unwrap().rows.len(), 1);

    let explicit = QueryRequest {
        limit: Some(2),
        ..request
    };
    assert_eq!(engine.run_query(explicit).unwrap().rows.len(), 2);
}

#[test]
fn test_run_update() {
    let engine = engine();
    let request = UpdateRequest::new("customers")
        .set("city", "Paris")
        .filter("id", "=", 2);
    assert_eq!(engine.run_update(request).unwrap(), 1);

    let check = QueryRequest::new(vec![
        ColumnSpec::new("customers", "city").alias("city"),
        ColumnSpec::new("customers", "id").alias("id").filter("=", "2"),
    ]);
    let result = engine.run_query(check).unwrap();
    assert_eq!(result.rows, vec![vec![text("Paris"), Value::Int(2)]]);
}

#[test]
fn test_unscoped_update_touches_nothing() {
    let engine = engine();
    let err = engine
        .run_update(UpdateRequest::new("customers").set("city", "Nowhere"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnscopedUpdate);

    let check = QueryRequest::new(vec![ColumnSpec::new("customers", "city")
        .alias("city")
        .filter("=", "Nowhere")]);
    assert!(engine.run_query(check).unwrap().is_empty());
}

#[test]
fn test_blocked_table_is_not_exposed() {
    let mut settings = Settings::default();
    settings.schema.blocked_tables = vec!["audit_log".to_string()];
    let engine = engine_with(settings);

    let request = QueryRequest::new(vec![ColumnSpec::new("audit_log", "message")]);
    let err = engine.run_query(request).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::UnknownTable(ref name)) if name == "audit_log"
    ));
}

fn spend_request() -> QueryRequest {
    QueryRequest::new(vec![
        ColumnSpec::new("orders", "customer_id")
            .group_by()
            .filter("!=", 3),
        ColumnSpec::new("orders", "total").aggregate(Aggregate::Sum),
    ])
}

#[test]
fn test_derived_table_becomes_joinable() {
    let engine = engine();
    let before = engine.store().snapshot();

    let name = engine
        .save_derived_table("ann", "spend", spend_request())
        .unwrap();
    assert_eq!(name, "u_ann_spend");
    assert_eq!(engine.store().version(), 2);

    let after = engine.store().snapshot();
    assert_eq!(
        after.column("u_ann_spend", "customer_id").unwrap().column_type,
        ColumnType::Integer
    );
    assert_eq!(
        after.column("u_ann_spend", "sum_total").unwrap().column_type,
        ColumnType::Float
    );

    // Snapshots taken earlier never see the new table.
    assert!(matches!(
        JoinResolver::new(&before).resolve(&["customers", "u_ann_spend"]),
        Err(QueryError::Schema(SchemaError::UnknownTable(_)))
    ));
    let plan = JoinResolver::new(&after)
        .resolve(&["customers", "u_ann_spend"])
        .unwrap();
    assert_eq!(plan.steps().len(), 1);

    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name")
            .alias("customer")
            .sort(SortDirection::Asc),
        ColumnSpec::new("u_ann_spend", "sum_total").alias("spend"),
    ]);
    let result = engine.run_query(request).unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![text("Ada"), Value::Float(25.5)],
            vec![text("Bob"), Value::Float(100.0)],
        ]
    );
}

#[test]
fn test_derived_tables_hidden_from_fresh_introspection() {
    let engine = engine();
    engine
        .save_derived_table("ann", "spend", spend_request())
        .unwrap();

    let raw = SqliteSource::new(engine.executor().connection())
        .introspect()
        .unwrap();
    assert!(raw.tables.iter().any(|t| t.name == "u_ann_spend"));

    let filtered = MetadataFilter::default().apply(raw.clone());
    assert!(!filtered.tables.iter().any(|t| t.name == "u_ann_spend"));

    let with_derived = MetadataFilter {
        include_derived: true,
        ..MetadataFilter::default()
    }
    .apply(raw);
    assert!(with_derived.tables.iter().any(|t| t.name == "u_ann_spend"));
}

#[test]
fn test_derived_table_name_rules() {
    let engine = engine();

    let err = engine
        .save_derived_table("ann smith", "spend", spend_request())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    engine
        .save_derived_table("ann", "spend", spend_request())
        .unwrap();
    let err = engine
        .save_derived_table("ann", "spend", spend_request())
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidRequest(ref msg) if msg.contains("already exists")));
    assert_eq!(engine.store().version(), 2);
}

#[test]
fn test_derived_table_rejects_duplicate_column_names() {
    let engine = engine();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "id").alias("id"),
        ColumnSpec::new("orders", "id"),
    ]);

    let err = engine
        .save_derived_table("ann", "ids", request)
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidRequest(_)));
    assert!(!engine.store().snapshot().contains("u_ann_ids"));
}

#[test]
fn test_derived_table_rejects_column_names_differing_in_case() {
    let engine = engine();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name").alias("Label"),
        ColumnSpec::new("customers", "city").alias("label"),
    ]);

    let err = engine.save_derived_table("ann", "x", request).unwrap_err();
    assert!(matches!(err, QueryError::InvalidRequest(ref msg) if msg.contains("label")));
    assert!(!engine.store().snapshot().contains("u_ann_x"));
    assert_eq!(engine.store().version(), 1);

    let raw = SqliteSource::new(engine.executor().connection())
        .introspect()
        .unwrap();
    assert!(!raw.tables.iter().any(|t| t.name == "u_ann_x"));
}

#[test]
fn test_drop_derived_table() {
    let engine = engine();
    engine
        .save_derived_table("ann", "spend", spend_request())
        .unwrap();
    engine
        .save_derived_table("bob", "spend", spend_request())
        .unwrap();
    assert_eq!(engine.derived_tables("ann"), vec!["u_ann_spend"]);
    let held = engine.store().snapshot();

    let dropped = engine.drop_derived_table("ann", "spend").unwrap();
    assert_eq!(dropped, "u_ann_spend");
    assert_eq!(engine.store().version(), 4);
    assert!(engine.derived_tables("ann").is_empty());
    assert_eq!(engine.derived_tables("bob"), vec!["u_bob_spend"]);

    // Snapshots taken earlier still see the table
    assert!(held.contains("u_ann_spend"));
    assert!(!engine.store().snapshot().contains("u_ann_spend"));

    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name"),
        ColumnSpec::new("u_ann_spend", "sum_total"),
    ]);
    let err = engine.run_query(request).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::UnknownTable(ref name)) if name == "u_ann_spend"
    ));

    let raw = SqliteSource::new(engine.executor().connection())
        .introspect()
        .unwrap();
    assert!(!raw.tables.iter().any(|t| t.name == "u_ann_spend"));
    assert!(raw.tables.iter().any(|t| t.name == "u_bob_spend"));

    // The name is free again
    engine
        .save_derived_table("ann", "spend", spend_request())
        .unwrap();
    assert_eq!(engine.derived_tables("ann"), vec!["u_ann_spend"]);
}

#[test]
fn test_drop_derived_table_rejects_unknown_and_invalid_names() {
    let engine = engine();

    let err = engine.drop_derived_table("ann", "spend").unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::UnknownTable(ref name)) if name == "u_ann_spend"
    ));

    let err = engine.drop_derived_table("ann", "x; DROP TABLE orders").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    assert_eq!(engine.store().version(), 1);
    assert!(engine.store().snapshot().contains("orders"));
}
