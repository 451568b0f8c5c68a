//! Command-line interface for pairs-to-parquet.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **csv_to_parquet**: Convert .pairs/.pairs.gz to Parquet
//! - **parquet_to_csv**: Convert Parquet back to .pairs/.pairs.gz
//! - **select**: Select pairs from a Parquet file with a condition
//! - **sort**: Sort pairs by chromosomes, positions and pair type
//!
//! ## Usage
//!
//! ```text
//! # Convert a pairs file
//! pairs-to-parquet csv_to_parquet sample.pairs.gz -o sample.parquet
//!
//! # Keep unique-unique pairs on chr1, write the rest elsewhere
//! pairs-to-parquet select '(pair_type == "UU") and (chrom1 == "chr1")' \
//!     sample.parquet -o uu.parquet --output-rest other.parquet
//!
//! # Back to text, compressed with pigz
//! pairs-to-parquet parquet_to_csv uu.parquet -o uu.pairs.gz --compress-program pigz
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::engine::{EngineConfig, ProfilingMode};
use crate::io::compress::{CompressError, CompressMethod};
use crate::pipeline::RunOptions;

pub mod convert;
pub mod select;
pub mod sort;

#[derive(Parser)]
#[command(name = "pairs-to-parquet")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Convert, select and sort .pairs files through Parquet")]
#[command(
    long_about = "pairs-to-parquet stores .pairs files as Parquet, keeping the pairs header in the Parquet key-value metadata.\n\nIt provides:\n- Lossless conversion between .pairs(.gz) and Parquet\n- pairtools-style selection with conditions such as region_match(chrom1, pos1, \"chr1\", 0, 1000)\n- Sorting by chromosome pair, positions and pair type"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Format of the run summary printed to stdout
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert .pairs or .pairs.gz to Parquet; the header is kept as key-value metadata
    #[command(name = "csv_to_parquet", alias = "csv-to-parquet")]
    CsvToParquet(convert::ConvertArgs),

    /// Convert Parquet to .pairs or .pairs.gz, rebuilding the header from its metadata
    #[command(name = "parquet_to_csv", alias = "parquet-to-csv")]
    ParquetToCsv(convert::ConvertArgs),

    /// Select pairs from a Parquet file according to CONDITION
    #[command(after_help = select::SELECT_HELP)]
    Select(select::SelectArgs),

    /// Sort pairs by chrom1, chrom2, pos1, pos2 and pair_type
    Sort(convert::ConvertArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Query engine and compression options shared by all commands
#[derive(clap::Args, Debug, Clone)]
pub struct EngineArgs {
    /// Number of threads for the query engine and the compressor
    #[arg(long, default_value = "8")]
    pub nproc: usize,

    /// Custom temporary folder for spilled intermediates
    #[arg(long)]
    pub tmpdir: Option<PathBuf>,

    /// Memory limit of the query engine
    #[arg(long, default_value = "2G")]
    pub memory: String,

    /// Compressor for .pairs.gz output: auto, pigz, gzip, lzop, lz4c, lz4, snzip or none.
    /// "auto" uses pigz if available, then lz4c, then gzip
    #[arg(long, default_value = "auto", value_parser = parse_compress_method)]
    pub compress_program: CompressMethod,

    /// Show the query engine progress bar
    #[arg(long)]
    pub progress: bool,

    /// Print query profiling output
    #[arg(long, value_enum)]
    pub profiling: Option<ProfilingMode>,
}

impl EngineArgs {
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            engine: EngineConfig {
                temp_directory: self.tmpdir.clone().filter(|p| !p.as_os_str().is_empty()),
                memory_limit: Some(self.memory.clone()).filter(|m| !m.is_empty()),
                threads: self.nproc,
                progress_bar: self.progress,
                profiling: self.profiling,
            },
            compress: self.compress_program,
        }
    }
}

/// `@PG` ID recorded by a command, e.g. `pairs_to_parquet_select`
#[must_use]
pub fn program_id(command: &str) -> String {
    format!("pairs_to_parquet_{command}")
}

fn parse_compress_method(value: &str) -> Result<CompressMethod, CompressError> {
    CompressMethod::from_str(value)
}

/// What a command wrote, printed when `--format json` is given
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub command: &'static str,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Rows written to text output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_rest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_rows: Option<u64>,
}

impl RunSummary {
    pub(crate) fn print(&self, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(self)?),
            OutputFormat::Text => {
                if verbose {
                    match self.rows {
                        Some(rows) => eprintln!("Wrote {rows} pairs to {}", self.output.display()),
                        None => eprintln!("Wrote {}", self.output.display()),
                    }
                    if let Some(rest) = &self.output_rest {
                        match self.rest_rows {
                            Some(rows) => eprintln!("Wrote {rows} other pairs to {}", rest.display()),
                            None => eprintln!("Wrote {}", rest.display()),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_command() {
        let cli = Cli::try_parse_from([
            "pairs-to-parquet",
            "select",
            "pair_type == \"UU\"",
            "in.parquet",
            "-o",
            "out.parquet",
            "-t",
            "pos1",
            "BIGINT",
            "-t",
            "pos2",
            "BIGINT",
            "-r",
            "mapq1,mapq2",
        ])
        .unwrap();

        let Commands::Select(args) = cli.command else {
            panic!("expected select");
        };
        assert_eq!(
            args.type_casts(),
            vec![
                ("pos1".to_string(), "BIGINT".to_string()),
                ("pos2".to_string(), "BIGINT".to_string())
            ]
        );
        assert_eq!(args.removed_columns(), vec!["mapq1", "mapq2"]);
    }

    #[test]
    fn test_parse_convert_defaults() {
        let cli = Cli::try_parse_from(["pairs-to-parquet", "csv_to_parquet", "in.pairs", "-o", "out.parquet"])
            .unwrap();
        let Commands::CsvToParquet(args) = cli.command else {
            panic!("expected csv_to_parquet");
        };
        let options = args.engine.run_options();
        assert_eq!(options.engine, EngineConfig::default());
        assert_eq!(options.compress, CompressMethod::Auto);
    }

    #[test]
    fn test_unknown_compressor_is_rejected() {
        let result = Cli::try_parse_from([
            "pairs-to-parquet",
            "sort",
            "in.pairs",
            "-o",
            "out.pairs.gz",
            "--compress-program",
            "zstd",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_json() {
        let summary = RunSummary {
            command: "sort",
            input: PathBuf::from("in.pairs"),
            output: PathBuf::from("out.pairs"),
            rows: Some(3),
            output_rest: None,
            rest_rows: None,
        };
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows"], 3);
        assert!(json.get("output_rest").is_none());
    }
}
