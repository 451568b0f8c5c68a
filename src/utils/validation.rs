//! Centralized validation and SQL quoting helpers.
//!
//! Everything that is spliced into SQL text goes through one of these:
//! values through [`sql_quote`], column names through [`is_identifier`] and
//! cast targets through [`is_safe_type_name`].

/// Quote a value as a SQL string literal, doubling embedded single quotes.
///
/// # Examples
///
/// ```
/// use pairs_to_parquet::utils::validation::sql_quote;
///
/// assert_eq!(sql_quote("chr1"), "'chr1'");
/// assert_eq!(sql_quote("it's"), "'it''s'");
/// ```
#[must_use]
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote a list of values as a comma-separated SQL list (without parentheses)
#[must_use]
pub fn sql_quote_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| sql_quote(v.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check that a name is a plain identifier: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// # Examples
///
/// ```
/// use pairs_to_parquet::utils::validation::is_identifier;
///
/// assert!(is_identifier("pos1"));
/// assert!(is_identifier("_mapq"));
/// assert!(!is_identifier("1pos"));
/// assert!(!is_identifier("pos1; DROP TABLE t"));
/// ```
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Render a column name for SQL: plain identifiers as is, anything else
/// double-quoted with embedded quotes doubled.
///
/// # Examples
///
/// ```
/// use pairs_to_parquet::utils::validation::sql_identifier;
///
/// assert_eq!(sql_identifier("pos1"), "pos1");
/// assert_eq!(sql_identifier("read-id"), "\"read-id\"");
/// ```
#[must_use]
pub fn sql_identifier(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Check that a type name is safe to splice into `CAST(col AS <type>)`.
///
/// Accepts names such as `INTEGER`, `VARCHAR`, `DECIMAL(10, 2)` and
/// `DOUBLE PRECISION`; rejects quotes, semicolons and comment markers.
#[must_use]
pub fn is_safe_type_name(type_name: &str) -> bool {
    let trimmed = type_name.trim();
    if trimmed.is_empty() || !trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    if trimmed.contains("--") {
        return false;
    }

    let mut depth = 0i32;
    for c in trimmed.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | ',' | '[' | ']') => {}
            _ => return false,
        }
    }
    depth == 0
}
