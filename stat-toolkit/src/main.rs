//! stat-toolkit
//!
//! Usage:
//!   stat-toolkit aggr mean < numbers.txt
//!   stat-toolkit groupby -g 0 -a "2 sum" < data.tsv
//!   stat-toolkit pivot -D 0 -D 1 -a "2 mean" -a "2 stdev" < data.tsv
//!   stat-toolkit histogram -w 0.5 < numbers.txt
//!
//! Set RUST_LOG=info for an ingestion summary on stderr.

use std::io::{self, BufWriter, Write};

use clap::Parser;

use stat_toolkit::{run, Cli};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let stdin = io::stdin();
    let mut out = BufWriter::new(io::stdout().lock());
    let result = run(&cli, stdin.lock(), &mut out).and_then(|()| out.flush().map_err(Into::into));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
