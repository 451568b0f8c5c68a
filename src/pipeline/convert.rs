use std::path::PathBuf;

use tracing::info;

use super::{file_kind, open_source, output_compressor, write_result, PipelineError, Provenance, RunOptions};
use crate::core::header::PairsHeader;
use crate::engine;

/// Convert between .pairs(.gz) and Parquet.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub provenance: Provenance,
    pub options: RunOptions,
}

/// Convert one file, in any of the four text/Parquet combinations.
///
/// The output header is the input header plus a provenance record. Rows are
/// passed through unchanged.
///
/// # Errors
///
/// Returns `PipelineError::InvalidPath` before any work if either path has an
/// unsupported suffix; engine, I/O and compressor errors otherwise.
pub fn convert(request: &ConvertRequest) -> Result<Option<u64>, PipelineError> {
    run(request, None, |_| {})
}

/// Shared by `convert` and `sort`: optional ordering plus a header edit.
pub(crate) fn run(
    request: &ConvertRequest,
    order_by: Option<&str>,
    edit_header: impl FnOnce(&mut PairsHeader),
) -> Result<Option<u64>, PipelineError> {
    let input_kind = file_kind(&request.input)?;
    let output_kind = file_kind(&request.output)?;
    let compressor = output_compressor(output_kind, &request.options)?;

    info!(
        input = %request.input.display(),
        output = %request.output.display(),
        "Converting {input_kind} to {output_kind}"
    );

    let conn = engine::connect(&request.options.engine)?;
    let source = open_source(&conn, &request.input, input_kind)?;

    let mut header = source.header;
    request.provenance.apply(&mut header);
    edit_header(&mut header);

    let mut query = format!("SELECT * FROM {}", source.relation);
    if let Some(order_by) = order_by {
        query.push_str(" ORDER BY ");
        query.push_str(order_by);
    }

    write_result(&conn, &query, &header, &request.output, output_kind, &compressor)
}
