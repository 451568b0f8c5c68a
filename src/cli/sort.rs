use crate::cli::convert::ConvertArgs;
use crate::cli::{OutputFormat, RunSummary};
use crate::pipeline::sort::sort;

pub fn run(args: &ConvertArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let rows = sort(&args.request("sort"))?;

    RunSummary {
        command: "sort",
        input: args.input.clone(),
        output: args.output.clone(),
        rows,
        output_rest: None,
        rest_rows: None,
    }
    .print(format, verbose)
}
