//! FILENAME: stat-toolkit/src/lib.rs
//! PURPOSE: Library side of the `stat-toolkit` binary.
//! CONTEXT: Flag parsing, record splitting and text output. All grouping and
//! aggregation is delegated to the `engine` and `pivot-engine` crates.

pub mod cli;
pub mod commands;
pub mod error;
pub mod input;

pub use cli::{Cli, Command};
pub use error::{ToolError, ToolResult};

use std::io::{BufRead, Write};

/// Runs one parsed command against the given input and output.
pub fn run<R: BufRead, W: Write>(cli: &Cli, input: R, out: &mut W) -> ToolResult<()> {
    match &cli.command {
        Command::Aggr(args) => commands::run_aggr(args, input, out),
        Command::Groupby(args) => commands::run_groupby(args, input, out),
        Command::Pivot(args) => commands::run_pivot(args, input, out),
        Command::Histogram(args) => commands::run_histogram(args, input, out),
    }
}
