//! Type-aware rendering of filter operators into parameterized predicates.

use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::schema::{Column, ColumnType};
use crate::sql::expr::{param, BinaryOperator, Expr, ExprExt};
use crate::sql::Value;

/// The closed set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Prefix,
    Suffix,
    Substring,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Prefix => "PREFIX",
            Operator::Suffix => "SUFFIX",
            Operator::Substring => "SUBSTRING",
        }
    }

    /// Whether the operator renders as LIKE.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Operator::Prefix | Operator::Suffix | Operator::Substring
        )
    }

    fn binary_operator(&self) -> BinaryOperator {
        match self {
            Operator::Eq => BinaryOperator::Eq,
            Operator::Ne => BinaryOperator::Ne,
            Operator::Gt => BinaryOperator::Gt,
            Operator::Lt => BinaryOperator::Lt,
            Operator::Gte => BinaryOperator::Gte,
            Operator::Lte => BinaryOperator::Lte,
            Operator::Prefix | Operator::Suffix | Operator::Substring => BinaryOperator::Like,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "=" => return Ok(Operator::Eq),
            "!=" => return Ok(Operator::Ne),
            ">" => return Ok(Operator::Gt),
            "<" => return Ok(Operator::Lt),
            ">=" => return Ok(Operator::Gte),
            "<=" => return Ok(Operator::Lte),
            _ => {}
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "PREFIX" => Ok(Operator::Prefix),
            "SUFFIX" => Ok(Operator::Suffix),
            "SUBSTRING" => Ok(Operator::Substring),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

/// Formats constraints and assignments, handing out placeholder indices in
/// the order they are requested and collecting the bound values.
///
/// Callers must request constraints in the order their placeholders appear
/// in the final SQL text.
#[derive(Debug, Default)]
pub struct ConstraintFormatter {
    params: Vec<Value>,
}

impl ConstraintFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `target <op> ?` for `column`, binding the coerced value.
    pub fn format(
        &mut self,
        column: &Column,
        target: Expr,
        operator: &str,
        raw: &Value,
    ) -> QueryResult<Expr> {
        let op: Operator = operator.parse().map_err(|_| {
            QueryError::invalid_constraint(&column.name, operator, "unsupported operator")
        })?;
        let value = coerce(column, op, raw)?;
        let placeholder = self.push(value);
        Ok(target.binary(op.binary_operator(), placeholder))
    }

    /// Bind a value for `SET column = ?`, coerced as for `=`.
    pub fn bind(&mut self, column: &Column, raw: &Value) -> QueryResult<Expr> {
        let value = coerce(column, Operator::Eq, raw)?;
        Ok(self.push(value))
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    fn push(&mut self, value: Value) -> Expr {
        self.params.push(value);
        param(self.params.len())
    }
}

/// Coerce a raw request value to the bound value for `column` under `op`.
fn coerce(column: &Column, op: Operator, raw: &Value) -> QueryResult<Value> {
    let text = raw_text(raw)
        .ok_or_else(|| QueryError::invalid_constraint(&column.name, op, "value is null"))?;

    let value = match (op, column.column_type) {
        (Operator::Prefix, _) => Value::Text(format!("{}%", text)),
        (Operator::Suffix, _) => Value::Text(format!("%{}", text)),
        (Operator::Substring, _) => Value::Text(format!("%{}%", text)),
        (_, ColumnType::Integer) => {
            let trimmed = text.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                Value::Int(n)
            } else {
                Value::Float(parse_finite(trimmed).ok_or_else(|| {
                    QueryError::invalid_constraint(
                        &column.name,
                        op,
                        format!("expected an integer, got '{}'", text),
                    )
                })?)
            }
        }
        (_, ColumnType::Float) => Value::Float(parse_finite(text.trim()).ok_or_else(|| {
            QueryError::invalid_constraint(
                &column.name,
                op,
                format!("expected a number, got '{}'", text),
            )
        })?),
        _ => Value::Text(text),
    };
    Ok(value)
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn raw_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::Float(x) => Some(x.to_string()),
        Value::Text(s) => Some(s.clone()),
    }
}
