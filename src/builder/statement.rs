use serde::Serialize;

use crate::sql::Value;

/// A finished statement: SQL text plus its bound parameters, in placeholder
/// order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl std::fmt::Display for BuiltStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}
