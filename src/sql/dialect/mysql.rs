//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Positional `?` parameters
//! - OFFSET requires a LIMIT; the documented idiom is the largest BIGINT UNSIGNED

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// LIMIT used when the caller only asked for an OFFSET.
const UNBOUNDED_LIMIT: &str = "18446744073709551615";

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset, Some(UNBOUNDED_LIMIT))
    }
}
