//! FILENAME: stat-toolkit/src/cli.rs
//! PURPOSE: Command-line surface of the toolkit.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::input::parse_delimiter;

#[derive(Parser, Debug)]
#[command(name = "stat-toolkit")]
#[command(about = "Streaming aggregation, group-by, pivot and histogram tools for delimited text")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate whitespace-separated numbers with a single aggregator.
    Aggr(AggrArgs),
    /// Group records and aggregate fields per group.
    Groupby(GroupbyArgs),
    /// Arrange aggregated records as a pivot table.
    Pivot(PivotArgs),
    /// Count numbers in fixed-width buckets.
    Histogram(HistogramArgs),
}

#[derive(Args, Debug)]
pub struct AggrArgs {
    /// Aggregator construction string, e.g. `mean` or `ci_gauss 0.95`.
    pub aggregator: String,
}

/// Options shared by the record-grouping tools.
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Aggregator argument: `<field> <aggregator>` (repeatable).
    #[arg(short = 'a', long = "aggregate", value_name = "FIELD AGGREGATOR")]
    pub metrics: Vec<String>,

    /// Field delimiter.
    #[arg(short = 'd', long = "delimiter", default_value = "\t", value_parser = parse_delimiter)]
    pub delimiter: char,

    /// Treat the first line as a header row; fields may then be named.
    #[arg(short = 'H', long = "header")]
    pub header: bool,

    /// Drop records that fail to parse instead of aborting.
    #[arg(long)]
    pub skip_bad_rows: bool,

    /// Find groups by scanning them in discovery order instead of hashing.
    #[arg(long)]
    pub linear_scan: bool,
}

#[derive(Args, Debug)]
pub struct GroupbyArgs {
    /// Grouping field(s) (repeatable).
    #[arg(short = 'g', long = "group", value_name = "FIELD", required = true)]
    pub groups: Vec<String>,

    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args, Debug)]
pub struct PivotArgs {
    /// Dimension: the fields forming one axis (2 or 3 times: [page] row column).
    #[arg(short = 'D', long = "dimension", value_name = "FIELDS")]
    pub dimensions: Vec<String>,

    /// Put repeated metrics on extra rows instead of extra columns.
    #[arg(short = 'R', long = "extend-rows")]
    pub extend_rows: bool,

    /// Marker for combinations without data.
    #[arg(long)]
    pub placeholder: Option<String>,

    /// JSON table definition; replaces -D, -a and the policy flags.
    #[arg(long, value_name = "PATH")]
    pub definition: Option<PathBuf>,

    #[command(flatten)]
    pub table: TableArgs,
}

#[derive(Args, Debug)]
pub struct HistogramArgs {
    /// Bucket width.
    #[arg(short = 'w', long = "width", default_value_t = 1.0)]
    pub width: f64,

    /// Output delimiter.
    #[arg(short = 'd', long = "delimiter", default_value = "\t", value_parser = parse_delimiter)]
    pub delimiter: char,
}
