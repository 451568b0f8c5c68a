//! SQL text builders. Every value spliced in here is quoted with
//! [`sql_quote`].

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::columns::{pair_type_domain, STRANDS};
use crate::core::types::ColumnType;
use crate::utils::validation::{sql_quote, sql_quote_list};

/// `CREATE TYPE` statements for the chromosome, strand and pair-type enums
#[must_use]
pub fn enum_types_sql(chrom_domain: &[String]) -> String {
    [
        (ColumnType::Chrom, sql_quote_list(chrom_domain)),
        (ColumnType::Strand, sql_quote_list(STRANDS)),
        (ColumnType::PairType, sql_quote_list(&pair_type_domain())),
    ]
    .iter()
    .map(|(t, values)| format!("CREATE TYPE {} AS ENUM ({values});", t.sql_name()))
    .collect::<Vec<_>>()
    .join("\n")
}

/// `read_csv` `columns` struct literal: `{'readID': 'STRING', ...}`
#[must_use]
pub fn column_spec_sql(types: &[(String, ColumnType)]) -> String {
    let fields: Vec<String> = types
        .iter()
        .map(|(name, t)| format!("{}: {}", sql_quote(name), sql_quote(t.sql_name())))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Typed scan of a pairs body, skipping `header_lines` header lines
#[must_use]
pub fn read_pairs_sql(path: &Path, header_lines: usize, types: &[(String, ColumnType)]) -> String {
    format!(
        "read_csv({}, delim = '\\t', skip = {header_lines}, columns = {}, header = false, auto_detect = false)",
        path_literal(path),
        column_spec_sql(types)
    )
}

/// Scan of a Parquet file
#[must_use]
pub fn parquet_scan_sql(path: &Path) -> String {
    format!("parquet_scan({})", path_literal(path))
}

/// `KV_METADATA` struct literal for `COPY ... (FORMAT PARQUET, ...)`
#[must_use]
pub fn kv_metadata_sql(kv: &BTreeMap<String, String>) -> String {
    let fields: Vec<String> = kv
        .iter()
        .map(|(key, value)| format!("{}: {}", sql_quote(key), sql_quote(value)))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// `COPY (query) TO 'path' (FORMAT PARQUET, KV_METADATA {...})`
#[must_use]
pub fn copy_to_parquet_sql(query: &str, path: &Path, kv: &BTreeMap<String, String>) -> String {
    format!(
        "COPY ({query}) TO {} (FORMAT PARQUET, KV_METADATA {})",
        path_literal(path),
        kv_metadata_sql(kv)
    )
}

/// Key-value metadata rows of a Parquet file
#[must_use]
pub fn kv_metadata_query(path: &Path) -> String {
    format!(
        "SELECT key, value FROM parquet_kv_metadata({})",
        path_literal(path)
    )
}

fn path_literal(path: &Path) -> String {
    sql_quote(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_types_sql() {
        let sql = enum_types_sql(&["!".to_string(), "chr1".to_string()]);
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines[0], "CREATE TYPE CHROM_TYPE AS ENUM ('!', 'chr1');");
        assert_eq!(lines[1], "CREATE TYPE STRAND_TYPE AS ENUM ('+', '-', '!');");
        assert!(lines[2].starts_with("CREATE TYPE ALIGNMENT_TYPE AS ENUM ('NN', 'NU',"));
        assert!(lines[2].ends_with("'xx');"));
    }

    #[test]
    fn test_column_spec_sql() {
        let types = vec![
            ("readID".to_string(), ColumnType::Text),
            ("chrom1".to_string(), ColumnType::Chrom),
            ("pos1".to_string(), ColumnType::Integer),
        ];
        assert_eq!(
            column_spec_sql(&types),
            "{'readID': 'STRING', 'chrom1': 'CHROM_TYPE', 'pos1': 'INTEGER'}"
        );
    }

    #[test]
    fn test_read_pairs_sql() {
        let types = vec![("readID".to_string(), ColumnType::Text)];
        assert_eq!(
            read_pairs_sql(Path::new("in.pairs.gz"), 5, &types),
            "read_csv('in.pairs.gz', delim = '\\t', skip = 5, columns = {'readID': 'STRING'}, header = false, auto_detect = false)"
        );
    }

    #[test]
    fn test_copy_to_parquet_sql() {
        let mut kv = BTreeMap::new();
        kv.insert("shape".to_string(), "\"upper triangle\"".to_string());
        kv.insert("samheader".to_string(), "[\"@PG\\tID:x's\"]".to_string());

        assert_eq!(
            copy_to_parquet_sql("SELECT * FROM t", Path::new("out.parquet"), &kv),
            "COPY (SELECT * FROM t) TO 'out.parquet' (FORMAT PARQUET, KV_METADATA \
             {'samheader': '[\"@PG\\tID:x''s\"]', 'shape': '\"upper triangle\"'})"
        );
    }

    #[test]
    fn test_kv_metadata_query() {
        assert_eq!(
            kv_metadata_query(Path::new("a.parquet")),
            "SELECT key, value FROM parquet_kv_metadata('a.parquet')"
        );
    }
}
