//! Row selection on Parquet pairs files.
//!
//! The condition is translated once and the primary result is written with
//! the updated header. The optional rest output holds every other row: the
//! full scan minus the primary result (`EXCEPT ALL`), with the same
//! projection and casts so both outputs share one schema.

use std::path::PathBuf;

use tracing::{info, warn};

use super::{
    file_kind, open_source, output_compressor, write_result, PipelineError, Provenance, RunOptions,
};
use crate::core::columns::required_by;
use crate::core::header::PairsHeader;
use crate::core::types::FileKind;
use crate::engine;
use crate::select::predicate::translate;
use crate::utils::validation::{is_safe_type_name, sql_identifier, sql_quote_list};

#[derive(Debug, Clone)]
pub struct SelectRequest {
    /// Parquet input
    pub input: PathBuf,
    pub output: PathBuf,
    /// Output for the rows not selected
    pub output_rest: Option<PathBuf>,
    pub condition: String,
    pub remove_columns: Vec<String>,
    /// Keep only pairs with both sides on these chromosomes
    pub chrom_subset: Option<Vec<String>>,
    /// `(column, type)` casts applied to the projected columns
    pub type_casts: Vec<(String, String)>,
    pub provenance: Provenance,
    pub options: RunOptions,
}

/// Rows written to each output; `None` for Parquet outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectSummary {
    pub selected: Option<u64>,
    pub rest: Option<u64>,
}

/// Select rows of a Parquet file.
///
/// # Errors
///
/// Fails before opening the engine on bad paths, an untranslatable
/// condition or an unavailable compressor. Fails before querying on an empty
/// projection or an invalid cast. Engine, I/O and compressor errors are
/// passed through.
pub fn select(request: &SelectRequest) -> Result<SelectSummary, PipelineError> {
    if file_kind(&request.input)? != FileKind::Parquet {
        return Err(PipelineError::NotParquet(request.input.clone()));
    }
    let output_kind = file_kind(&request.output)?;
    let compressor = output_compressor(output_kind, &request.options)?;
    let rest = match &request.output_rest {
        Some(path) => {
            let kind = file_kind(path)?;
            Some((path, kind, output_compressor(kind, &request.options)?))
        }
        None => None,
    };

    let mut condition = translate(request.condition.trim())?;
    if let Some(chroms) = &request.chrom_subset {
        condition = subset_condition(&condition, chroms);
    }

    let conn = engine::connect(&request.options.engine)?;
    let source = open_source(&conn, &request.input, FileKind::Parquet)?;

    let header = update_header(
        &source.header,
        &request.provenance,
        &request.remove_columns,
        request.chrom_subset.as_deref(),
    );
    let columns = if request.remove_columns.is_empty() {
        source.header.column_names()
    } else {
        let kept = header.column_names();
        if kept.is_empty() {
            return Err(PipelineError::EmptyProjection);
        }
        kept
    };
    let projection = projection(&columns, &request.type_casts)?;

    let query = format!(
        "SELECT {projection} FROM {} WHERE {condition}",
        source.relation
    );
    info!(condition = %condition, "Selecting pairs");
    let selected = write_result(
        &conn,
        &query,
        &header,
        &request.output,
        output_kind,
        &compressor,
    )?;

    let mut summary = SelectSummary {
        selected,
        rest: None,
    };
    if let Some((path, kind, compressor)) = rest {
        // Rows outside the chromosome subset land here, so keep the full
        // chromosome list
        let rest_header = update_header(
            &source.header,
            &request.provenance,
            &request.remove_columns,
            None,
        );
        let rest_query = format!(
            "SELECT {projection} FROM {} EXCEPT ALL ({query})",
            source.relation
        );
        summary.rest = write_result(&conn, &rest_query, &rest_header, path, kind, &compressor)?;
    }

    Ok(summary)
}

/// Output header: provenance, column removal and chromosome subset.
///
/// Removing a column required by the .pairs or .pairsam format, or removing
/// nothing at all, is allowed with a warning.
#[must_use]
pub fn update_header(
    header: &PairsHeader,
    provenance: &Provenance,
    remove_columns: &[String],
    chrom_subset: Option<&[String]>,
) -> PairsHeader {
    let mut updated = header.clone();
    provenance.apply(&mut updated);

    if !remove_columns.is_empty() {
        for column in remove_columns {
            if let Some(format) = required_by(column) {
                warn!("Removing required {column} column for {format} format. Output is not {format} anymore");
            }
        }

        let input_columns = header.column_names();
        let kept: Vec<String> = input_columns
            .iter()
            .filter(|c| !remove_columns.contains(*c))
            .cloned()
            .collect();

        if kept.len() == input_columns.len() {
            warn!(
                "Some column(s) {} not in the file, the operation has no effect",
                remove_columns.join(",")
            );
        } else {
            updated.set_columns(&kept);
        }
    }

    if let Some(chroms) = chrom_subset {
        updated.subset_chroms(chroms);
    }

    updated
}

/// Restrict a translated condition to pairs with both sides in `chroms`
#[must_use]
pub fn subset_condition(condition: &str, chroms: &[String]) -> String {
    if chroms.is_empty() {
        return format!("({condition}) AND FALSE");
    }
    let list = sql_quote_list(chroms);
    format!("({condition}) AND chrom1 IN ({list}) AND chrom2 IN ({list})")
}

/// Select list for `columns`, with `CAST(col AS type) AS col` in place of
/// each cast column. An empty column list projects `*`.
///
/// # Errors
///
/// Returns `PipelineError::InvalidCast` for a column that is not projected
/// or a type name that is not safe to embed.
pub fn projection(columns: &[String], casts: &[(String, String)]) -> Result<String, PipelineError> {
    for (column, type_name) in casts {
        let reason = if !columns.contains(column) {
            Some("column is not in the output")
        } else if !is_safe_type_name(type_name) {
            Some("unsupported type name")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(PipelineError::InvalidCast {
                column: column.clone(),
                type_name: type_name.clone(),
                reason,
            });
        }
    }

    if columns.is_empty() {
        return Ok("*".to_string());
    }

    let items: Vec<String> = columns
        .iter()
        .map(|column| {
            let name = sql_identifier(column);
            match casts.iter().rev().find(|(c, _)| c == column) {
                Some((_, type_name)) => format!("CAST({name} AS {}) AS {name}", type_name.trim()),
                None => name,
            }
        })
        .collect();
    Ok(items.join(", "))
}
