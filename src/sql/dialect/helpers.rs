//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

// =============================================================================
// Placeholders
// =============================================================================

/// Positional `?` placeholder.
/// Used by: MySQL, SQLite
pub fn placeholder_question() -> String {
    "?".to_string()
}

/// Numbered `$n` placeholder.
/// Used by: Postgres
pub fn placeholder_dollar(index: usize) -> String {
    format!("${}", index)
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit LIMIT ... OFFSET ... (standard SQL).
///
/// `unbounded_limit` is the literal used as LIMIT when only an OFFSET is
/// given, for dialects whose grammar has no OFFSET without LIMIT.
pub fn emit_limit_offset_standard(
    limit: Option<u64>,
    offset: Option<u64>,
    unbounded_limit: Option<&str>,
) -> TokenStream {
    let mut ts = TokenStream::new();

    match (limit, unbounded_limit) {
        (Some(lim), _) => {
            ts.push(Token::Limit).space().push(lim_token(lim));
        }
        (None, Some(unbounded)) if offset.is_some() => {
            ts.push(Token::Limit)
                .space()
                .push(Token::Raw(unbounded.to_string()));
        }
        _ => {}
    }

    if let Some(off) = offset {
        if !ts.is_empty() {
            ts.space();
        }
        ts.push(Token::Offset).space().push(lim_token(off));
    }

    ts
}

/// Pagination counts beyond `i64::MAX` are clamped; no database accepts more.
fn lim_token(n: u64) -> Token {
    Token::LitInt(i64::try_from(n).unwrap_or(i64::MAX))
}
