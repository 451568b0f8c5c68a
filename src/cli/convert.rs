use std::path::PathBuf;

use clap::Args;

use crate::cli::{program_id, EngineArgs, OutputFormat, RunSummary};
use crate::pipeline::convert::{convert, ConvertRequest};
use crate::pipeline::Provenance;

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Input .pairs, .pairs.gz or .parquet file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output .pairs, .pairs.gz or .parquet file.
    /// A .pairs.gz output is compressed with --compress-program
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl ConvertArgs {
    pub(crate) fn request(&self, command: &str) -> ConvertRequest {
        ConvertRequest {
            input: self.input.clone(),
            output: self.output.clone(),
            provenance: Provenance::from_env(&program_id(command)),
            options: self.engine.run_options(),
        }
    }
}

/// Run `csv_to_parquet` or `parquet_to_csv`.
///
/// Both accept any supported input/output combination; they differ only in
/// the program ID recorded in the output header.
pub fn run(
    args: &ConvertArgs,
    command: &'static str,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let rows = convert(&args.request(command))?;

    RunSummary {
        command,
        input: args.input.clone(),
        output: args.output.clone(),
        rows,
        output_rest: None,
        rest_rows: None,
    }
    .print(format, verbose)
}
