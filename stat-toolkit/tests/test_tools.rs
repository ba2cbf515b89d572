//! FILENAME: tests/test_tools.rs
//! End-to-end runs of each tool over in-memory input.

use engine::EngineError;
use pretty_assertions::assert_eq;
use stat_toolkit::{run, Cli, ToolError, ToolResult};

use std::io::Write;

use clap::Parser;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn exec(args: &[&str], input: &str) -> ToolResult<String> {
    let mut argv = vec!["stat-toolkit"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    run(&cli, input.as_bytes(), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

// ============================================================================
// AGGR AND HISTOGRAM
// ============================================================================

#[test]
fn test_aggr_mean() {
    assert_eq!(exec(&["aggr", "mean"], "1 2\n3 4\n").unwrap(), "2.5\n");
}

#[test]
fn test_aggr_stops_at_first_non_number() {
    assert_eq!(exec(&["aggr", "sum"], "1 2 x 100\n").unwrap(), "3\n");
}

#[test]
fn test_aggr_sparse_stdev_is_nan() {
    assert_eq!(exec(&["aggr", "stdev"], "5\n").unwrap(), "NaN\n");
}

#[test]
fn test_aggr_rejects_unknown_aggregator() {
    let err = exec(&["aggr", "median"], "1").unwrap_err();
    assert!(matches!(err, ToolError::Engine(EngineError::Construction { .. })));
}

#[test]
fn test_histogram_rounds_to_nearest_bucket() {
    let out = exec(&["histogram", "-w", "1"], "0.4 0.6 1.4\n3\n").unwrap();
    assert_eq!(out, "0\t1\n1\t2\n3\t1\n");
}

#[test]
fn test_histogram_rejects_bad_token() {
    let err = exec(&["histogram"], "1 2 abc").unwrap_err();
    assert!(matches!(err, ToolError::Input(ref t) if t == "abc"));
}

#[test]
fn test_histogram_rejects_zero_width() {
    let err = exec(&["histogram", "-w", "0"], "1").unwrap_err();
    assert!(matches!(err, ToolError::Engine(EngineError::Construction { .. })));
}

// ============================================================================
// GROUPBY
// ============================================================================

#[test]
fn test_groupby_in_discovery_order() {
    let input = "b,2\na,1\nb,3\n";
    let out = exec(&["groupby", "-g", "0", "-a", "1 sum", "-a", "1 count", "-d", ","], input).unwrap();
    assert_eq!(out, "0,sum(1),count(1)\nb,5,2\na,1,1\n");
}

#[test]
fn test_groupby_with_header_names() {
    let input = "region,units\nnorth,2\nsouth,5\nnorth,4\n";
    let out = exec(
        &["groupby", "-H", "-d", ",", "-g", "region", "-a", "units mean"],
        input,
    )
    .unwrap();
    assert_eq!(out, "region,mean(units)\nnorth,3\nsouth,5\n");
}

#[test]
fn test_groupby_linear_scan_matches_hash() {
    let input = "a\tx\t1\nb\tx\t2\na\ty\t3\na\tx\t4\n";
    let hashed = exec(&["groupby", "-g", "0 1", "-a", "2 max"], input).unwrap();
    let scanned = exec(&["groupby", "-g", "0", "-g", "1", "-a", "2 max", "--linear-scan"], input).unwrap();
    assert_eq!(hashed, scanned);
    assert_eq!(hashed, "0\t1\tmax(2)\na\tx\t4\nb\tx\t2\na\ty\t3\n");
}

#[test]
fn test_groupby_bad_row_aborts_by_default() {
    let err = exec(&["groupby", "-d", ",", "-g", "0", "-a", "1 sum"], "a,1\nb,oops\n").unwrap_err();
    match err {
        ToolError::Engine(EngineError::RowParse { record, value, .. }) => {
            assert_eq!(record, 2);
            assert_eq!(value, "oops");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_groupby_skip_bad_rows() {
    let out = exec(
        &["groupby", "-d", ",", "-g", "0", "-a", "1 sum", "--skip-bad-rows"],
        "a,1\nb,oops\na,3\n",
    )
    .unwrap();
    assert_eq!(out, "0,sum(1)\na,4\n");
}

#[test]
fn test_groupby_requires_an_aggregator() {
    let err = exec(&["groupby", "-g", "0"], "a\t1\n").unwrap_err();
    assert!(matches!(err, ToolError::Usage(_)));
}

// ============================================================================
// PIVOT
// ============================================================================

#[test]
fn test_pivot_extend_columns_with_gaps() {
    let out = exec(
        &["pivot", "-D", "0", "-D", "1", "-a", "2 sum", "-d", ","],
        "a,x,1\nb,y,2\n",
    )
    .unwrap();
    assert_eq!(
        out,
        ",col 1 = x; sum(2),col 1 = y; sum(2)\ncol 0 = a,1,-\ncol 0 = b,-,2\n"
    );
}

#[test]
fn test_pivot_extend_rows_with_custom_placeholder() {
    let out = exec(
        &[
            "pivot", "-D", "0", "-D", "1", "-a", "2 sum", "-a", "2 count", "-d", ",", "-R",
            "--placeholder", "?",
        ],
        "a,x,1\nb,y,2\n",
    )
    .unwrap();
    assert_eq!(
        out,
        concat!(
            ",col 1 = x,col 1 = y\n",
            "col 0 = a; sum(2),1,?\n",
            "col 0 = a; count(2),1,?\n",
            "col 0 = b; sum(2),?,2\n",
            "col 0 = b; count(2),?,1\n",
        )
    );
}

#[test]
fn test_pivot_pages() {
    let out = exec(
        &["pivot", "-D", "0", "-D", "1", "-D", "2", "-a", "3 count", "-d", ","],
        "q,a,x,1\np,a,x,1\np,a,x,5\n",
    )
    .unwrap();
    assert_eq!(
        out,
        concat!(
            "Page col 0 = p\n",
            ",col 2 = x; count(3)\n",
            "col 1 = a,2\n",
            "Page col 0 = q\n",
            ",col 2 = x; count(3)\n",
            "col 1 = a,1\n",
        )
    );
}

#[test]
fn test_pivot_rejects_single_dimension() {
    let err = exec(&["pivot", "-D", "0", "-a", "1 sum"], "a\t1\n").unwrap_err();
    assert!(matches!(err, ToolError::Engine(EngineError::Dimension(_))));
}

#[test]
fn test_pivot_from_definition_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "dimensions": [{{ "fields": ["region"] }}, {{ "fields": ["year"] }}],
            "metrics": [{{ "field": "units", "aggregator": "max" }}],
            "layout": {{ "values_position": "rows", "placeholder": "." }}
        }}"#
    )
    .unwrap();

    let out = exec(
        &["pivot", "-H", "-d", ",", "--definition", file.path().to_str().unwrap()],
        "region,year,units\nnorth,2023,4\nsouth,2024,7\nnorth,2023,9\n",
    )
    .unwrap();

    assert_eq!(
        out,
        concat!(
            ",year = 2023,year = 2024\n",
            "region = north; max(units),9,.\n",
            "region = south; max(units),.,7\n",
        )
    );
}

#[test]
fn test_pivot_definition_file_must_parse() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let result = exec(&["pivot", "--definition", file.path().to_str().unwrap()], "");
    assert!(matches!(result, Err(ToolError::Definition { .. })));
}
