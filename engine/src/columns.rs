//! FILENAME: engine/src/columns.rs
//! PURPOSE: Field selectors, header-row mapping and numeric field parsing.
//! CONTEXT: The engine works purely on 0-based field indices. When the input
//! starts with a header row, `ColumnNames` resolves named selectors to indices
//! and supplies the captions used in metric keys and coordinate labels.

use parser::FieldRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Index into the fields of a record (0-based).
pub type FieldIndex = usize;

/// Index <-> caption mapping taken from a header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnNames {
    names: Vec<String>,
    by_name: FxHashMap<String, FieldIndex>,
}

impl From<Vec<String>> for ColumnNames {
    fn from(names: Vec<String>) -> Self {
        ColumnNames::from_header(&names)
    }
}

impl From<ColumnNames> for Vec<String> {
    fn from(columns: ColumnNames) -> Self {
        columns.names
    }
}

impl ColumnNames {
    /// Builds the mapping from the header record.
    /// A caption that appears twice resolves to its first occurrence.
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Self {
        let names: Vec<String> = header.iter().map(|s| s.as_ref().to_string()).collect();
        let mut by_name = FxHashMap::default();
        by_name.reserve(names.len());
        for (index, name) in names.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(index);
        }
        ColumnNames { names, by_name }
    }

    /// Number of captions in the header.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Caption of a field, if the header has one.
    pub fn name(&self, field: FieldIndex) -> Option<&str> {
        self.names.get(field).map(String::as_str)
    }

    /// Index of a caption.
    pub fn index_of(&self, name: &str) -> Option<FieldIndex> {
        self.by_name.get(name).copied()
    }
}

/// Resolves a parsed selector to a field index.
pub fn resolve_field(field: &FieldRef, columns: Option<&ColumnNames>) -> EngineResult<FieldIndex> {
    match field {
        FieldRef::Index(index) => Ok(*index),
        FieldRef::Name(name) => {
            let columns = columns.ok_or_else(|| {
                EngineError::dimension(format!(
                    "field \"{}\" is selected by name but the input has no header row",
                    name
                ))
            })?;
            columns.index_of(name).ok_or_else(|| {
                EngineError::dimension(format!("no column named \"{}\" in the header row", name))
            })
        }
    }
}

/// Display label of a field: its caption when known, otherwise its index.
pub fn field_label(field: FieldIndex, columns: Option<&ColumnNames>) -> String {
    columns
        .and_then(|c| c.name(field))
        .map(str::to_string)
        .unwrap_or_else(|| field.to_string())
}

/// Parses a record field as a finite number. Surrounding whitespace is ignored.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
