//! DuckDB plumbing shared by all pipelines.
//!
//! Every pipeline opens its own in-memory connection through [`connect`],
//! declares the enum types with [`declare_types`] when it reads pairs text,
//! and reads Parquet headers back with [`read_kv_metadata`].

pub mod config;
pub mod sql;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use duckdb::Connection;
use tracing::debug;

pub use config::{EngineConfig, ProfilingMode};

/// Open an in-memory connection and apply the configuration.
///
/// # Errors
///
/// Returns the engine error if the connection cannot be opened or a setting
/// is rejected (e.g. a malformed memory limit).
pub fn connect(config: &EngineConfig) -> duckdb::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    let setup = config.setup_sql();
    debug!(threads = config.threads, "Configuring query engine");
    conn.execute_batch(&setup)?;
    Ok(conn)
}

/// Declare `CHROM_TYPE`, `STRAND_TYPE` and `ALIGNMENT_TYPE` on a connection.
///
/// # Errors
///
/// Returns the engine error if a type cannot be created.
pub fn declare_types(conn: &Connection, chrom_domain: &[String]) -> duckdb::Result<()> {
    debug!(chromosomes = chrom_domain.len(), "Declaring enum types");
    conn.execute_batch(&sql::enum_types_sql(chrom_domain))
}

/// Read the raw key-value metadata of a Parquet file.
///
/// Keys and values are returned as text; bytes that are not valid UTF-8 are
/// rendered as `\xHH` escapes, which the metadata decoder reports as a
/// decode error for that key only.
///
/// # Errors
///
/// Returns the engine error if the file cannot be read as Parquet.
pub fn read_kv_metadata(conn: &Connection, path: &Path) -> duckdb::Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare(&sql::kv_metadata_query(path))?;
    let rows = stmt.query_map([], |row| {
        let key: Vec<u8> = row.get(0)?;
        let value: Vec<u8> = row.get(1)?;
        Ok((blob_to_text(&key), blob_to_text(&value)))
    })?;

    let mut kv = BTreeMap::new();
    for row in rows {
        let (key, value) = row?;
        kv.insert(key, value);
    }
    debug!(keys = kv.len(), "Read Parquet key-value metadata");
    Ok(kv)
}

/// UTF-8 text as is; otherwise every non-ASCII byte as `\xHH`.
fn blob_to_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let mut text = String::with_capacity(bytes.len() * 2);
            for &b in bytes {
                if b.is_ascii() {
                    text.push(char::from(b));
                } else {
                    let _ = write!(text, "\\x{b:02x}");
                }
            }
            text
        }
    }
}
