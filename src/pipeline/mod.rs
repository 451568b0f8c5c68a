//! Read → query → write pipelines over the query engine.
//!
//! - [`convert`]: .pairs(.gz) ↔ Parquet in any combination
//! - [`select`]: filter a Parquet file with a select condition
//! - [`sort`]: sort by chromosome pair, positions and pair type
//!
//! Every pipeline validates its paths first, opens one in-memory connection,
//! rebuilds the input header, appends a provenance record and writes the
//! query result with the updated header: as key-value metadata for Parquet
//! output, as header lines for text output.

pub mod convert;
pub mod select;
pub mod sort;

use std::path::{Path, PathBuf};

use duckdb::Connection;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::columns::{chromosome_domain, classify, DtypeTables};
use crate::core::header::{HeaderError, PairsHeader};
use crate::core::metadata::{header_to_metadata, PairsMetadata};
use crate::core::types::FileKind;
use crate::engine::{self, sql, EngineConfig};
use crate::io::compress::{choose_compressor, CompressError, CompressMethod, Compressor, OutputSink, SystemPath};
use crate::io::writer::PairsWriter;
use crate::parsing::pairs::read_header_file;
use crate::select::predicate::PredicateError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid file: {0}. Expected a .pairs.gz/.pairs/.parquet file")]
    InvalidPath(PathBuf),

    #[error("Invalid file: {0}. Expected a .parquet file")]
    NotParquet(PathBuf),

    #[error("No #columns: line in the header of {0}")]
    MissingColumns(PathBuf),

    #[error("Removing columns would remove all columns")]
    EmptyProjection,

    #[error("Invalid type cast of column '{column}' to '{type_name}': {reason}")]
    InvalidCast {
        column: String,
        type_name: String,
        reason: &'static str,
    },

    #[error("Query engine error: {0}")]
    Engine(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Header error: {0}")]
    Header(#[from] HeaderError),

    #[error("Condition error: {0}")]
    Predicate(#[from] PredicateError),

    #[error("Compression error: {0}")]
    Compress(#[from] CompressError),
}

/// Identity recorded in the `@PG` line of every output header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub id: String,
    pub version: String,
    pub command_line: String,
}

impl Provenance {
    /// Provenance for the running process: crate version and its arguments
    #[must_use]
    pub fn from_env(id: &str) -> Self {
        Self {
            id: id.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            command_line: std::env::args().collect::<Vec<_>>().join(" "),
        }
    }

    /// Append a `@PG` record for this program to a header
    pub fn apply(&self, header: &mut PairsHeader) {
        header.append_pg(&self.id, &self.id, &self.version, &self.command_line);
    }
}

/// Settings shared by every pipeline
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub engine: EngineConfig,
    /// Compressor for `.pairs.gz` outputs
    pub compress: CompressMethod,
}

/// Classify a path, failing with `InvalidPath` for unknown suffixes
pub(crate) fn file_kind(path: &Path) -> Result<FileKind, PipelineError> {
    FileKind::from_path(path).ok_or_else(|| PipelineError::InvalidPath(path.to_path_buf()))
}

/// Resolve the compressor for an output before any work is done
pub(crate) fn output_compressor(kind: FileKind, options: &RunOptions) -> Result<Compressor, PipelineError> {
    if kind == FileKind::PairsGz {
        Ok(choose_compressor(options.compress, options.engine.threads, &SystemPath)?)
    } else {
        Ok(Compressor::none())
    }
}

/// An input opened on a connection: its header and a relation to select from
pub(crate) struct Source {
    pub header: PairsHeader,
    pub relation: String,
}

/// Rebuild the header of an input and declare the enum types it needs.
pub(crate) fn open_source(conn: &Connection, path: &Path, kind: FileKind) -> Result<Source, PipelineError> {
    let (header, relation) = match kind {
        FileKind::Pairs | FileKind::PairsGz => {
            let header = read_header_file(path)?;
            let columns = header.column_names();
            if columns.is_empty() {
                return Err(PipelineError::MissingColumns(path.to_path_buf()));
            }
            let types = classify(&columns, &DtypeTables::default());
            debug!(columns = columns.len(), header_lines = header.len(), "Read pairs header");
            let relation = sql::read_pairs_sql(path, header.len(), &types);
            (header, relation)
        }
        FileKind::Parquet => {
            let kv = engine::read_kv_metadata(conn, path)?;
            let header = PairsMetadata::from_kv(&kv).to_header();
            (header, sql::parquet_scan_sql(path))
        }
    };

    engine::declare_types(conn, &chromosome_domain(&header.chromsizes()?))?;
    Ok(Source { header, relation })
}

/// Run a query and write its result with the given header.
///
/// Text output is streamed: batches are fetched from the engine as they are
/// written, so the result is never held in memory. Only errors raised when
/// the query starts are returned; the engine's batch iterator panics on a
/// fetch error later in the stream.
///
/// Returns the number of rows written for text output, `None` for Parquet.
///
/// # Errors
///
/// Engine errors are passed through. A write failure caused by the
/// compressor exiting early is reported as `CompressError::Failed`.
pub fn write_result(
    conn: &Connection,
    query: &str,
    header: &PairsHeader,
    output: &Path,
    kind: FileKind,
    compressor: &Compressor,
) -> Result<Option<u64>, PipelineError> {
    match kind {
        FileKind::Parquet => {
            let kv = header_to_metadata(header)?;
            conn.execute_batch(&sql::copy_to_parquet_sql(query, output, &kv))?;
            info!(output = %output.display(), "Wrote Parquet");
            Ok(None)
        }
        FileKind::Pairs | FileKind::PairsGz => {
            let mut stmt = conn.prepare(query)?;
            let batches = stmt.stream_arrow([])?;

            let mut writer = PairsWriter::new(OutputSink::create(output, compressor)?);
            let written = writer
                .write_header(header)
                .and_then(|()| writer.write_batches(batches));
            let sink = writer.into_inner();
            let rows = match written {
                Ok(rows) => rows,
                Err(e) => return Err(sink.fail(e).into()),
            };
            sink.finish()?;

            info!(output = %output.display(), rows, "Wrote pairs");
            Ok(Some(rows))
        }
    }
}
