use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod engine;
mod io;
mod parsing;
mod pipeline;
mod select;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("pairs_to_parquet=debug,info")
    } else {
        EnvFilter::new("pairs_to_parquet=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::CsvToParquet(args) => {
            cli::convert::run(&args, "csv_to_parquet", cli.format, cli.verbose)?;
        }
        cli::Commands::ParquetToCsv(args) => {
            cli::convert::run(&args, "parquet_to_csv", cli.format, cli.verbose)?;
        }
        cli::Commands::Select(args) => {
            cli::select::run(&args, cli.format, cli.verbose)?;
        }
        cli::Commands::Sort(args) => {
            cli::sort::run(&args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
