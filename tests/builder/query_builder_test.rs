//! SELECT assembly from column requests.

use autojoin::builder::{
    build_select, Aggregate, ColumnSpec, QueryRequest, SelectPipeline, SortDirection, Stage,
};
use autojoin::error::{ErrorKind, QueryError};
use autojoin::schema::{RawMetadata, RawTable, SchemaGraph};
use autojoin::sql::{Dialect, Value};
use insta::assert_snapshot;
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

fn shop_graph() -> SchemaGraph {
    SchemaGraph::build(&RawMetadata {
        tables: vec![
            RawTable::new("customers")
                .column("id", "INTEGER")
                .column("name", "VARCHAR(80)")
                .column("city", "TEXT"),
            RawTable::new("orders")
                .column("id", "INTEGER")
                .column("customer_id", "INTEGER")
                .column("total", "DECIMAL(10,2)")
                .column("placed_at", "TIMESTAMP")
                .foreign_key("customer_id", "customers", "id"),
            RawTable::new("order_items")
                .column("id", "INTEGER")
                .column("order_id", "INTEGER")
                .column("sku", "TEXT")
                .column("quantity", "INTEGER")
                .foreign_key("order_id", "orders", "id"),
        ],
    })
    .unwrap()
}

fn assert_parses(sql: &str, dialect: Dialect) {
    let result = match dialect {
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
        Dialect::MySql => Parser::parse_sql(&MySqlDialect {}, sql),
        Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql),
    };
    if let Err(e) = result {
        panic!("SQL failed to parse for {:?}: {}\n{}", dialect, e, sql);
    }
}

#[test]
fn test_grouped_aggregate_layout() {
    let graph = shop_graph();
    let request = QueryRequest {
        limit: Some(10),
        ..QueryRequest::new(vec![
            ColumnSpec::new("customers", "name").alias("customer").group_by(),
            ColumnSpec::new("orders", "total")
                .alias("spend")
                .aggregate(Aggregate::Sum)
                .sort(SortDirection::Desc),
        ])
    };

    let statement = build_select(&graph, Dialect::Sqlite, request).unwrap();
    assert_snapshot!(statement.sql, @r#"
SELECT
  "customers"."name" AS "customer",
  SUM("orders"."total") AS "spend"
FROM "customers"
INNER JOIN "orders" ON "customers"."id" = "orders"."customer_id"
GROUP BY "customers"."name"
ORDER BY SUM("orders"."total") DESC
LIMIT 10
"#);
    assert!(statement.params.is_empty());
    assert_parses(&statement.sql, Dialect::Sqlite);
}

#[test]
fn test_two_hop_join_with_filters_postgres() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "city").filter("=", "Oslo"),
        ColumnSpec::new("order_items", "sku").sort(SortDirection::Asc),
        ColumnSpec::new("order_items", "quantity").filter(">=", "2"),
    ]);

    let statement = build_select(&graph, Dialect::Postgres, request).unwrap();
    assert_snapshot!(statement.sql, @r#"
SELECT
  "customers"."city",
  "order_items"."sku",
  "order_items"."quantity"
FROM "customers"
INNER JOIN "orders" ON "customers"."id" = "orders"."customer_id"
INNER JOIN "order_items" ON "orders"."id" = "order_items"."order_id"
WHERE "customers"."city" = $1 AND "order_items"."quantity" >= $2
ORDER BY "order_items"."sku" ASC
"#);
    assert_eq!(
        statement.params,
        vec![Value::Text("Oslo".into()), Value::Int(2)]
    );
    assert_parses(&statement.sql, Dialect::Postgres);
}

#[test]
fn test_pagination_per_dialect() {
    let graph = shop_graph();
    let paged = |limit: Option<u64>, offset: Option<u64>| QueryRequest {
        limit,
        offset,
        ..QueryRequest::new(vec![ColumnSpec::new("customers", "name")])
    };

    for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite] {
        let sql = build_select(&graph, dialect, paged(Some(5), Some(10)))
            .unwrap()
            .sql;
        assert!(sql.ends_with("\nLIMIT 5 OFFSET 10"), "{:?}: {}", dialect, sql);
        assert_parses(&sql, dialect);
    }

    let offset_only = |dialect| {
        build_select(&graph, dialect, paged(None, Some(10)))
            .unwrap()
            .sql
    };
    assert!(offset_only(Dialect::Postgres).ends_with("\nOFFSET 10"));
    assert!(offset_only(Dialect::MySql).ends_with("\nLIMIT 18446744073709551615 OFFSET 10"));
    assert!(offset_only(Dialect::Sqlite).ends_with("\nLIMIT -1 OFFSET 10"));
}

#[test]
fn test_mysql_quoting() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("orders", "id"),
        ColumnSpec::new("customers", "name").filter("!=", "x"),
    ]);

    let sql = build_select(&graph, Dialect::MySql, request).unwrap().sql;
    assert_snapshot!(sql, @r"
SELECT
  `orders`.`id`,
  `customers`.`name`
FROM `orders`
INNER JOIN `customers` ON `orders`.`customer_id` = `customers`.`id`
WHERE `customers`.`name` <> ?
");
    assert_parses(&sql, Dialect::MySql);
}

#[test]
fn test_prefix_binds_like_pattern() {
    let graph = shop_graph();
    let request =
        QueryRequest::new(vec![ColumnSpec::new("customers", "name").filter("PREFIX", "abc")]);

    let statement = build_select(&graph, Dialect::Sqlite, request).unwrap();
    assert!(statement
        .sql
        .ends_with("WHERE \"customers\".\"name\" LIKE ?"));
    assert_eq!(statement.params, vec![Value::Text("abc%".into())]);
}

#[test]
fn test_suffix_and_substring_patterns() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name").filter("suffix", "son"),
        ColumnSpec::new("customers", "city").filter("SUBSTRING", "lo"),
    ]);

    let statement = build_select(&graph, Dialect::Sqlite, request).unwrap();
    assert_eq!(
        statement.params,
        vec![Value::Text("%son".into()), Value::Text("%lo%".into())]
    );
}

#[test]
fn test_integer_equality_binds_int() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![ColumnSpec::new("orders", "id").filter("=", "5")]);

    let statement = build_select(&graph, Dialect::Sqlite, request).unwrap();
    assert_eq!(statement.params, vec![Value::Int(5)]);
}

#[test]
fn test_invalid_constraints_name_column_and_operator() {
    let graph = shop_graph();

    let bad_operator =
        QueryRequest::new(vec![ColumnSpec::new("orders", "id").filter("BETWEEN", "1")]);
    match build_select(&graph, Dialect::Sqlite, bad_operator) {
        Err(QueryError::InvalidConstraint {
            column, operator, ..
        }) => {
            assert_eq!(column, "id");
            assert_eq!(operator, "BETWEEN");
        }
        other => panic!("expected InvalidConstraint, got {:?}", other),
    }

    let bad_value =
        QueryRequest::new(vec![ColumnSpec::new("orders", "id").filter(">", "many")]);
    let err = build_select(&graph, Dialect::Sqlite, bad_value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConstraint);
}

#[test]
fn test_sum_with_bare_column_rejected() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name"),
        ColumnSpec::new("orders", "total").aggregate(Aggregate::Sum),
    ]);

    assert!(matches!(
        build_select(&graph, Dialect::Sqlite, request),
        Err(QueryError::InvalidAggregation(_))
    ));
}

#[test]
fn test_unreachable_table_in_request() {
    let graph = SchemaGraph::build(&RawMetadata {
        tables: vec![
            RawTable::new("customers").column("id", "INTEGER"),
            RawTable::new("audit").column("id", "INTEGER"),
        ],
    })
    .unwrap();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "id"),
        ColumnSpec::new("audit", "id"),
    ]);

    let err = build_select(&graph, Dialect::Sqlite, request).unwrap_err();
    assert!(matches!(err, QueryError::UnreachableTable { ref table } if table == "audit"));
}

#[test]
fn test_identical_requests_give_identical_sql() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("order_items", "sku").group_by(),
        ColumnSpec::new("customers", "id").aggregate(Aggregate::Count),
        ColumnSpec::new("orders", "placed_at").filter(">", "2024-01-01"),
    ]);

    let first = build_select(&graph, Dialect::Postgres, request.clone()).unwrap();
    let second = build_select(&graph, Dialect::Postgres, request).unwrap();
    assert_eq!(first.sql.as_bytes(), second.sql.as_bytes());
    assert_eq!(first.params, second.params);
}

#[test]
fn test_request_from_json() {
    let graph = shop_graph();
    let request: QueryRequest = serde_json::from_str(
        r#"{
            "columns": [
                {"table": "customers", "column": "city", "group_by": true},
                {"table": "orders", "column": "total", "aggregate": "avg", "alias": "avg_total"},
                {"table": "orders", "column": "total", "constraint": {"operator": ">", "value": 100}}
            ],
            "limit": 3
        }"#,
    )
    .unwrap();

    let statement = build_select(&graph, Dialect::Sqlite, request);
    // The filtered total is bare and ungrouped.
    assert!(matches!(statement, Err(QueryError::InvalidAggregation(_))));
}

#[test]
fn test_pipeline_rejects_advancing_built_statement() {
    let graph = shop_graph();
    let request = QueryRequest::new(vec![
        ColumnSpec::new("customers", "name"),
        ColumnSpec::new("orders", "total"),
    ]);

    let mut pipeline = SelectPipeline::new(&graph, Dialect::Sqlite, request);
    let mut stages = vec![pipeline.stage()];
    while pipeline.stage() != Stage::Built {
        pipeline = pipeline.advance().unwrap();
        stages.push(pipeline.stage());
    }

    assert_eq!(
        stages,
        vec![
            Stage::Empty,
            Stage::TablesResolved,
            Stage::JoinsResolved,
            Stage::ConstraintsFormatted,
            Stage::ClausesAssembled,
            Stage::Built,
        ]
    );
    assert!(pipeline.statement().is_some());
    assert!(matches!(pipeline.advance(), Err(QueryError::AlreadyBuilt)));
}
