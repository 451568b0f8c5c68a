use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args};

use crate::cli::{program_id, EngineArgs, OutputFormat, RunSummary};
use crate::parsing::chroms::read_chrom_file;
use crate::pipeline::select::{select, SelectRequest};
use crate::pipeline::Provenance;

/// Examples shown after `select --help`
pub const SELECT_HELP: &str = "CONDITION is a Python-like boolean expression, e.g.:

    'pair_type == \"UU\"'
    'chrom1 == chrom2 and abs(pos1 - pos2) < 1000000'
    'regex_match(chrom1, \"chr[0-9]+\")'
    'region_match(chrom1, pos1, \"chr1\", 1000, 5000)'";

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Selection condition
    pub condition: String,

    /// Input Parquet file
    pub parquet_path: PathBuf,

    /// Output file for selected pairs (.parquet, .pairs or .pairs.gz)
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Optional output file for non-selected pairs
    #[arg(long)]
    pub output_rest: Option<PathBuf>,

    /// Path to chromnames file (1st column = chromosome)
    #[arg(long)]
    pub chrom_subset: Option<PathBuf>,

    /// Column type casts, e.g. -t pos1 BIGINT
    #[arg(short = 't', long = "type-cast", num_args = 2, value_names = ["COL", "TYPE"], action = ArgAction::Append)]
    pub type_cast: Vec<String>,

    /// Comma-separated list of columns to drop
    #[arg(short = 'r', long, default_value = "")]
    pub remove_columns: String,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl SelectArgs {
    /// `-t` values as (column, type) pairs
    #[must_use]
    pub fn type_casts(&self) -> Vec<(String, String)> {
        self.type_cast
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }

    #[must_use]
    pub fn removed_columns(&self) -> Vec<String> {
        self.remove_columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn run(args: &SelectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let chrom_subset = match &args.chrom_subset {
        Some(path) => Some(
            read_chrom_file(path)
                .with_context(|| format!("Failed to read chromosome list {}", path.display()))?,
        ),
        None => None,
    };

    let request = SelectRequest {
        input: args.parquet_path.clone(),
        output: args.output.clone(),
        output_rest: args.output_rest.clone(),
        condition: args.condition.clone(),
        remove_columns: args.removed_columns(),
        chrom_subset,
        type_casts: args.type_casts(),
        provenance: Provenance::from_env(&program_id("select")),
        options: args.engine.run_options(),
    };
    let summary = select(&request)?;

    RunSummary {
        command: "select",
        input: args.parquet_path.clone(),
        output: args.output.clone(),
        rows: summary.selected,
        output_rest: args.output_rest.clone(),
        rest_rows: summary.rest,
    }
    .print(format, verbose)
}
