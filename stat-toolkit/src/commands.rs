//! FILENAME: stat-toolkit/src/commands.rs
//! PURPOSE: The four tools, each reading from a `BufRead` and writing to a `Write`.
//! CONTEXT: `main` wires these to stdin/stdout; tests drive them with buffers.

use std::fs;
use std::io::{BufRead, Write};

use log::info;

use engine::{create_from_string, ColumnNames, EngineError, Histogram};
use pivot_engine::{
    arrange_pivot, format_value, render_group_table, BucketTable, DimensionDef, FieldSelector,
    GroupResult, HashLookup, LinearScan, LookupStrategy, MetricDef, PivotLayout, PivotView,
    RowErrorPolicy, TableDefinition, ValuesPosition,
};

use crate::cli::{AggrArgs, GroupbyArgs, HistogramArgs, PivotArgs, TableArgs};
use crate::error::{ToolError, ToolResult};
use crate::input::{read_numbers_strict, read_numbers_until_invalid, RecordReader};

// ============================================================================
// AGGR
// ============================================================================

pub fn run_aggr<R: BufRead, W: Write>(args: &AggrArgs, input: R, out: &mut W) -> ToolResult<()> {
    let mut aggregator = create_from_string(&args.aggregator)?;
    for value in read_numbers_until_invalid(input)? {
        aggregator.put(value);
    }
    writeln!(out, "{}", format_value(aggregator.get()))?;
    Ok(())
}

// ============================================================================
// HISTOGRAM
// ============================================================================

pub fn run_histogram<R: BufRead, W: Write>(
    args: &HistogramArgs,
    input: R,
    out: &mut W,
) -> ToolResult<()> {
    let mut histogram = Histogram::new(args.width)?;
    for value in read_numbers_strict(input)? {
        histogram.put(value);
    }
    for (centre, count) in histogram.buckets() {
        writeln!(out, "{}{}{}", format_value(centre), args.delimiter, count)?;
    }
    Ok(())
}

// ============================================================================
// GROUPING TABLES
// ============================================================================

/// Everything a grouping run produces before rendering.
struct Grouped {
    results: Vec<GroupResult>,
    metric_keys: Vec<String>,
    dimensions: Vec<Vec<usize>>,
    columns: Option<ColumnNames>,
}

fn parse_metrics(table: &TableArgs) -> ToolResult<Vec<MetricDef>> {
    if table.metrics.is_empty() {
        return Err(ToolError::Usage("at least one aggregator must be defined".to_string()));
    }
    Ok(table
        .metrics
        .iter()
        .map(|m| MetricDef::parse(m))
        .collect::<Result<_, _>>()?)
}

fn group_records<R: BufRead>(
    definition: &TableDefinition,
    table: &TableArgs,
    input: R,
) -> ToolResult<Grouped> {
    let mut reader = RecordReader::new(input, table.delimiter);
    let columns = if table.header {
        Some(reader.read_header()?)
    } else {
        None
    };

    if table.linear_scan {
        ingest::<LinearScan, R>(definition, reader, columns)
    } else {
        ingest::<HashLookup, R>(definition, reader, columns)
    }
}

fn ingest<L: LookupStrategy, R: BufRead>(
    definition: &TableDefinition,
    mut reader: RecordReader<R>,
    columns: Option<ColumnNames>,
) -> ToolResult<Grouped> {
    let mut table = BucketTable::<L>::with_strategy(definition, columns.as_ref())?;
    while let Some(record) = reader.next_record()? {
        table.consume_row(&record)?;
    }
    info!(
        "consumed {} record(s), skipped {}, {} bucket(s)",
        table.rows_consumed(),
        table.skipped_rows(),
        table.len()
    );

    Ok(Grouped {
        results: table.snapshot()?,
        metric_keys: table.metric_keys(),
        dimensions: table.dimensions().to_vec(),
        columns,
    })
}

fn write_row<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S], delim: char) -> ToolResult<()> {
    let mut first = true;
    for field in fields {
        if !first {
            write!(out, "{}", delim)?;
        }
        write!(out, "{}", field.as_ref())?;
        first = false;
    }
    writeln!(out)?;
    Ok(())
}

// ============================================================================
// GROUPBY
// ============================================================================

pub fn run_groupby<R: BufRead, W: Write>(
    args: &GroupbyArgs,
    input: R,
    out: &mut W,
) -> ToolResult<()> {
    let mut fields: Vec<FieldSelector> = Vec::new();
    for group in &args.groups {
        fields.extend(DimensionDef::parse(group)?.fields);
    }

    let mut definition = TableDefinition::new(
        vec![DimensionDef::new(fields)],
        parse_metrics(&args.table)?,
    );
    if args.table.skip_bad_rows {
        definition.row_errors = RowErrorPolicy::Skip;
    }

    let grouped = group_records(&definition, &args.table, input)?;
    let view = render_group_table(
        &grouped.results,
        &grouped.metric_keys,
        &grouped.dimensions,
        grouped.columns.as_ref(),
        &definition.layout.placeholder,
    );

    write_row(out, &view.header, args.table.delimiter)?;
    for row in view.text_rows() {
        write_row(out, &row, args.table.delimiter)?;
    }
    Ok(())
}

// ============================================================================
// PIVOT
// ============================================================================

/// Builds the pivot definition from a JSON file or from the flags.
pub fn pivot_definition(args: &PivotArgs) -> ToolResult<TableDefinition> {
    if let Some(path) = &args.definition {
        let text = fs::read_to_string(path)?;
        let definition: TableDefinition =
            serde_json::from_str(&text).map_err(|source| ToolError::Definition {
                path: path.clone(),
                source,
            })?;
        return Ok(definition);
    }

    let dimensions = args
        .dimensions
        .iter()
        .map(|d| DimensionDef::parse(d))
        .collect::<Result<Vec<_>, _>>()?;
    if dimensions.len() != 2 && dimensions.len() != 3 {
        return Err(EngineError::dimension("only 2 or 3 dimensions are supported").into());
    }

    let mut definition = TableDefinition::new(dimensions, parse_metrics(&args.table)?);
    if args.table.skip_bad_rows {
        definition.row_errors = RowErrorPolicy::Skip;
    }
    definition.layout = PivotLayout {
        values_position: if args.extend_rows {
            ValuesPosition::Rows
        } else {
            ValuesPosition::Columns
        },
        placeholder: args
            .placeholder
            .clone()
            .unwrap_or_else(|| PivotLayout::default().placeholder),
    };
    Ok(definition)
}

pub fn run_pivot<R: BufRead, W: Write>(args: &PivotArgs, input: R, out: &mut W) -> ToolResult<()> {
    let definition = pivot_definition(args)?;
    let grouped = group_records(&definition, &args.table, input)?;
    let view = arrange_pivot(
        &grouped.results,
        &grouped.metric_keys,
        &grouped.dimensions,
        &definition.layout,
        grouped.columns.as_ref(),
    )?;
    write_pivot(out, &view, args.table.delimiter)
}

fn write_pivot<W: Write>(out: &mut W, view: &PivotView, delim: char) -> ToolResult<()> {
    for page in &view.pages {
        if let Some(caption) = &page.caption {
            writeln!(out, "Page {}", caption)?;
        }
        for row in page.text_rows() {
            write_row(out, &row, delim)?;
        }
    }
    Ok(())
}
