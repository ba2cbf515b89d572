//! FILENAME: stat-toolkit/src/input.rs
//! PURPOSE: Turns delimited text into records.
//! CONTEXT: The engine only ever sees records (lists of string fields).
//! Runs of delimiters collapse and leading or trailing delimiters are ignored,
//! so empty fields never appear in a record.

use std::io::BufRead;

use engine::ColumnNames;

use crate::error::{ToolError, ToolResult};

/// Splits a line on `delim`, dropping empty fields.
pub fn split_record(line: &str, delim: char) -> Vec<String> {
    line.split(delim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validates a `-d` argument: one printable character or a tab.
pub fn parse_delimiter(arg: &str) -> Result<char, String> {
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c == '\t' || !c.is_control() => Ok(c),
        (Some(_), None) => Err("cannot use the given character as a delimiter".to_string()),
        _ => Err("the delimiter is expected to be a single character".to_string()),
    }
}

/// Line-by-line reader of delimited records.
pub struct RecordReader<R> {
    input: R,
    delim: char,
    line: String,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(input: R, delim: char) -> Self {
        RecordReader {
            input,
            delim,
            line: String::new(),
        }
    }

    /// Next non-blank record, or `None` at end of input.
    pub fn next_record(&mut self) -> ToolResult<Option<Vec<String>>> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let line = self.line.trim_end_matches(['\n', '\r']);
            let record = split_record(line, self.delim);
            if !record.is_empty() {
                return Ok(Some(record));
            }
        }
    }

    /// Consumes the first record as the header row.
    pub fn read_header(&mut self) -> ToolResult<ColumnNames> {
        match self.next_record()? {
            Some(header) => Ok(ColumnNames::from_header(&header)),
            None => Err(ToolError::Usage(
                "failed reading the column headers: the input is empty".to_string(),
            )),
        }
    }
}

/// Whitespace-separated numbers; stops at the first token that is not one.
pub fn read_numbers_until_invalid<R: BufRead>(input: R) -> ToolResult<Vec<f64>> {
    let mut values = Vec::new();
    for line in input.lines() {
        for token in line?.split_whitespace() {
            match engine::parse_number(token) {
                Some(v) => values.push(v),
                None => return Ok(values),
            }
        }
    }
    Ok(values)
}

/// Whitespace-separated numbers; any other token is an error.
pub fn read_numbers_strict<R: BufRead>(input: R) -> ToolResult<Vec<f64>> {
    let mut values = Vec::new();
    for line in input.lines() {
        for token in line?.split_whitespace() {
            let value = engine::parse_number(token)
                .ok_or_else(|| ToolError::Input(token.to_string()))?;
            values.push(value);
        }
    }
    Ok(values)
}
