//! UPDATE assembly from write requests.

use autojoin::builder::{build_update, Stage, UpdatePipeline, UpdateRequest};
use autojoin::error::{ErrorKind, ErrorReport, QueryError};
use autojoin::schema::{RawMetadata, RawTable, SchemaError, SchemaGraph};
use autojoin::sql::{Dialect, Value};
use insta::assert_snapshot;
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

fn graph() -> SchemaGraph {
    SchemaGraph::build(&RawMetadata {
        tables: vec![
            RawTable::new("customers")
                .column("id", "INTEGER")
                .column("name", "TEXT")
                .column("credit", "REAL")
                .column("active", "BOOLEAN"),
            RawTable::new("orders")
                .column("id", "INTEGER")
                .column("customer_id", "INTEGER")
                .foreign_key("customer_id", "customers", "id"),
        ],
    })
    .unwrap()
}

#[test]
fn test_scoped_update() {
    let request = UpdateRequest::new("customers")
        .set("name", "Ada")
        .set("credit", "12.5")
        .filter("id", "=", 3);

    let statement = build_update(&graph(), Dialect::Postgres, request).unwrap();
    assert_snapshot!(statement.sql, @r#"UPDATE "customers" SET "name" = $1, "credit" = $2 WHERE "id" = $3"#);
    assert_eq!(
        statement.params,
        vec![
            Value::Text("Ada".into()),
            Value::Float(12.5),
            Value::Int(3)
        ]
    );
    assert!(Parser::parse_sql(&PostgreSqlDialect {}, &statement.sql).is_ok());
}

#[test]
fn test_multiple_constraints_are_anded() {
    let request = UpdateRequest::new("customers")
        .set("active", false)
        .filter("credit", "<", 0)
        .filter("name", "PREFIX", "test");

    let statement = build_update(&graph(), Dialect::MySql, request).unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE `customers` SET `active` = ? WHERE `credit` < ? AND `name` LIKE ?"
    );
    assert_eq!(
        statement.params,
        vec![
            Value::Text("false".into()),
            Value::Float(0.0),
            Value::Text("test%".into())
        ]
    );
    assert!(Parser::parse_sql(&MySqlDialect {}, &statement.sql).is_ok());
}

#[test]
fn test_update_without_constraints_is_refused() {
    let request = UpdateRequest::new("customers").set("name", "everyone");

    let err = build_update(&graph(), Dialect::Sqlite, request).unwrap_err();
    assert!(matches!(err, QueryError::UnscopedUpdate { ref table } if table == "customers"));

    let report = ErrorReport::from(&err);
    assert_eq!(report.kind, ErrorKind::UnscopedUpdate);
    assert_eq!(
        serde_json::to_string(&report).unwrap(),
        r#"{"kind":"UnscopedUpdate","message":"Refusing to UPDATE 'customers' without constraints"}"#
    );
}

#[test]
fn test_unscoped_reported_before_missing_assignments() {
    let err = build_update(&graph(), Dialect::Sqlite, UpdateRequest::new("customers")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnscopedUpdate);

    let err = build_update(
        &graph(),
        Dialect::Sqlite,
        UpdateRequest::new("customers").filter("id", "=", 1),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[test]
fn test_constraint_on_other_table_rejected() {
    let mut request = UpdateRequest::new("customers")
        .set("name", "x")
        .filter("id", "=", 1);
    request.constraints[0].table = Some("orders".into());

    let err = build_update(&graph(), Dialect::Sqlite, request).unwrap_err();
    assert!(matches!(err, QueryError::InvalidRequest(_)));
}

#[test]
fn test_unknown_column() {
    let request = UpdateRequest::new("customers")
        .set("nickname", "x")
        .filter("id", "=", 1);

    let err = build_update(&graph(), Dialect::Sqlite, request).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Schema(SchemaError::UnknownColumn { ref column, .. }) if column == "nickname"
    ));
}

#[test]
fn test_update_request_from_json() {
    let request: UpdateRequest = serde_json::from_str(
        r#"{
            "table": "orders",
            "assignments": [{"column": "customer_id", "value": 9}],
            "constraints": [{"table": "orders", "column": "id", "operator": ">=", "value": "100"}]
        }"#,
    )
    .unwrap();

    let statement = build_update(&graph(), Dialect::Sqlite, request).unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE \"orders\" SET \"customer_id\" = ? WHERE \"id\" >= ?"
    );
    assert_eq!(statement.params, vec![Value::Int(9), Value::Int(100)]);
}

#[test]
fn test_update_pipeline_stages() {
    let graph = graph();
    let request = UpdateRequest::new("customers")
        .set("name", "x")
        .filter("id", "=", 1);

    let pipeline = UpdatePipeline::new(&graph, Dialect::Sqlite, request);
    assert_eq!(pipeline.stage(), Stage::Empty);
    let pipeline = pipeline.advance().unwrap();
    assert_eq!(pipeline.stage(), Stage::TablesResolved);

    let statement = pipeline.finish().unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE \"customers\" SET \"name\" = ? WHERE \"id\" = ?"
    );
}

#[test]
fn test_failed_pipeline_produces_no_statement() {
    let graph = graph();
    let request = UpdateRequest::new("customers").set("name", "x");

    let pipeline = UpdatePipeline::new(&graph, Dialect::Sqlite, request);
    assert!(matches!(
        pipeline.finish(),
        Err(QueryError::UnscopedUpdate { .. })
    ));
}
