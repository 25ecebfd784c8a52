//! DML (Data Manipulation Language) support.
//!
//! This module provides the statements the builders emit besides SELECT:
//! a scoped UPDATE and `CREATE TABLE ... AS <select>` for derived tables.
//!
//! # Examples
//!
//! ```ignore
//! use autojoin::dml::Update;
//! use autojoin::dialect::Dialect;
//! use autojoin::expr::{col, param, ExprExt};
//!
//! let update = Update::table("users")
//!     .set("status", param(1))
//!     .filter(col("id").eq(param(2)));
//! assert_eq!(
//!     update.to_sql(Dialect::Postgres),
//!     "UPDATE \"users\" SET \"status\" = $1 WHERE \"id\" = $2"
//! );
//! ```

use super::dialect::Dialect;
use super::expr::{Expr, ExprExt};
use super::query::Query;
use super::token::{Token, TokenStream};

// ============================================================================
// UPDATE
// ============================================================================

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Update {
    pub schema: Option<String>,
    pub table: String,
    pub set: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
}

impl Update {
    /// Create a new UPDATE statement.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            set: Vec::new(),
            filter: None,
        }
    }

    /// Set the schema.
    pub fn schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.schema = schema.map(Into::into);
        self
    }

    /// Set a column to a value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.set.push((column.into(), value.into()));
        self
    }

    /// Add WHERE clause (ANDed with existing conditions).
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // UPDATE table
        ts.push(Token::Update).space().push(Token::QualifiedIdent {
            schema: self.schema.clone(),
            name: self.table.clone(),
        });

        // SET clause
        ts.space().push(Token::Set).space();
        for (i, (col, expr)) in self.set.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(col.clone()))
                .space()
                .push(Token::Eq)
                .space()
                .append(&expr.to_tokens_for_dialect(dialect));
        }

        // WHERE clause
        if let Some(ref filter) = self.filter {
            ts.space()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens_for_dialect(dialect));
        }

        ts
    }
}

// ============================================================================
// CREATE TABLE ... AS
// ============================================================================

/// `CREATE TABLE name AS <query>`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTableAs {
    pub schema: Option<String>,
    pub table: String,
    pub query: Query,
}

impl CreateTableAs {
    pub fn new(table: impl Into<String>, query: Query) -> Self {
        Self {
            schema: None,
            table: table.into(),
            query,
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Create)
            .space()
            .push(Token::Table)
            .space()
            .push(Token::QualifiedIdent {
                schema: self.schema.clone(),
                name: self.table.clone(),
            })
            .space()
            .push(Token::As)
            .newline();
        ts.append(&self.query.to_tokens_for_dialect(dialect));
        ts
    }
}

/// `DROP TABLE name`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct DropTable {
    pub schema: Option<String>,
    pub table: String,
}

impl DropTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop)
            .space()
            .push(Token::Table)
            .space()
            .push(Token::QualifiedIdent {
                schema: self.schema.clone(),
                name: self.table.clone(),
            });
        ts
    }
}
