//! Pivot View - Renderable output.
//!
//! This module holds the 2D grids the arranger produces. It includes:
//! - Cell types (header labels, data, gap-fill placeholders)
//! - Row/column descriptors linking each grid line back to its key and metric
//! - Pages, for three-dimensional pivots
//!
//! Turning the grids into delimited text is left to the caller; every cell
//! carries its pre-formatted string.

use serde::{Deserialize, Serialize};

use engine::Coordinate;

use crate::definition::ValuesPosition;

// ============================================================================
// CELL TYPES AND VALUES
// ============================================================================

/// The type of a cell in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotCellType {
    /// Empty corner cell (top-left area).
    Corner,
    /// Row header label.
    RowHeader,
    /// Column header label.
    ColumnHeader,
    /// Aggregated value.
    Data,
    /// No bucket exists for this (row, column) combination.
    Placeholder,
}

/// Display value for a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PivotCellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl From<f64> for PivotCellValue {
    fn from(value: f64) -> Self {
        PivotCellValue::Number(value)
    }
}

/// Formats an aggregated value for output.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}

// ============================================================================
// VIEW CELL
// ============================================================================

/// A single cell of a rendered grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotViewCell {
    pub value: PivotCellValue,
    pub cell_type: PivotCellType,
    /// Pre-formatted display string.
    pub formatted_value: String,
}

impl PivotViewCell {
    /// Creates a new data cell.
    pub fn data(value: f64) -> Self {
        PivotViewCell {
            value: PivotCellValue::Number(value),
            formatted_value: format_value(value),
            cell_type: PivotCellType::Data,
        }
    }

    /// Creates a gap-fill cell showing `marker`.
    pub fn placeholder(marker: &str) -> Self {
        PivotViewCell {
            value: PivotCellValue::Empty,
            formatted_value: marker.to_string(),
            cell_type: PivotCellType::Placeholder,
        }
    }

    pub fn row_header(label: String) -> Self {
        PivotViewCell {
            value: PivotCellValue::Text(label.clone()),
            formatted_value: label,
            cell_type: PivotCellType::RowHeader,
        }
    }

    pub fn column_header(label: String) -> Self {
        PivotViewCell {
            value: PivotCellValue::Text(label.clone()),
            formatted_value: label,
            cell_type: PivotCellType::ColumnHeader,
        }
    }

    pub fn corner() -> Self {
        PivotViewCell {
            value: PivotCellValue::Empty,
            formatted_value: String::new(),
            cell_type: PivotCellType::Corner,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.cell_type == PivotCellType::Placeholder
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            PivotCellValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

// ============================================================================
// ROW AND COLUMN DESCRIPTORS
// ============================================================================

/// Types of rows in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotRowType {
    ColumnHeader,
    Data,
}

/// Describes a row of a page grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRowDescriptor {
    pub view_row: usize,
    pub row_type: PivotRowType,
    /// The row key, for data rows.
    pub key: Option<Coordinate>,
    /// The metric, when metrics extend rows.
    pub metric: Option<String>,
}

/// Types of columns in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotColumnType {
    /// Row label column - left side.
    RowLabel,
    Data,
}

/// Describes a column of a page grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumnDescriptor {
    pub view_col: usize,
    pub col_type: PivotColumnType,
    /// The column key, for data columns.
    pub key: Option<Coordinate>,
    /// The metric, when metrics extend columns.
    pub metric: Option<String>,
}

// ============================================================================
// PAGES AND VIEW
// ============================================================================

/// One page of a pivot: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotPage {
    /// The page key; `None` for two-dimensional pivots.
    pub key: Option<Coordinate>,
    /// Display caption of the page key.
    pub caption: Option<String>,
    /// Indexed as cells[row][col]; row 0 is the column header row.
    pub cells: Vec<Vec<PivotViewCell>>,
    pub rows: Vec<PivotRowDescriptor>,
    pub columns: Vec<PivotColumnDescriptor>,
}

impl PivotPage {
    pub fn new(key: Option<Coordinate>, caption: Option<String>) -> Self {
        PivotPage {
            key,
            caption,
            cells: Vec::new(),
            rows: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Gets a cell at the specified position.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&PivotViewCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Adds a row to the page.
    pub fn add_row(&mut self, cells: Vec<PivotViewCell>, descriptor: PivotRowDescriptor) {
        self.cells.push(cells);
        self.rows.push(descriptor);
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// Data and placeholder cells, header cells excluded.
    pub fn value_cells(&self) -> impl Iterator<Item = &PivotViewCell> {
        self.cells.iter().flatten().filter(|c| {
            matches!(c.cell_type, PivotCellType::Data | PivotCellType::Placeholder)
        })
    }

    /// Formatted strings of every row, header first.
    pub fn text_rows(&self) -> Vec<Vec<&str>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.formatted_value.as_str()).collect())
            .collect()
    }
}

/// The complete rendered pivot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotView {
    pub pages: Vec<PivotPage>,
    pub values_position: ValuesPosition,
    /// Metric keys in output order.
    pub metric_keys: Vec<String>,
}

impl PivotView {
    pub fn new(values_position: ValuesPosition, metric_keys: Vec<String>) -> Self {
        PivotView {
            pages: Vec::new(),
            values_position,
            metric_keys,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of gap-fill cells across all pages.
    pub fn placeholder_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| p.value_cells())
            .filter(|c| c.is_placeholder())
            .count()
    }
}

// ============================================================================
// GROUP TABLE
// ============================================================================

/// Flat group-by output: one row per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTableView {
    /// Grouping field captions, then metric keys.
    pub header: Vec<String>,
    /// Grouping values as row headers, then one cell per metric.
    pub rows: Vec<Vec<PivotViewCell>>,
}

impl GroupTableView {
    pub fn text_rows(&self) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.formatted_value.as_str()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_cells_format_like_plain_numbers() {
        assert_eq!(PivotViewCell::data(2.0).formatted_value, "2");
        assert_eq!(PivotViewCell::data(2.5).formatted_value, "2.5");
        assert_eq!(PivotViewCell::data(f64::NAN).formatted_value, "NaN");
    }

    #[test]
    fn placeholder_counts_only_value_cells() {
        let mut page = PivotPage::new(None, None);
        page.add_row(
            vec![PivotViewCell::corner(), PivotViewCell::column_header("x".into())],
            PivotRowDescriptor {
                view_row: 0,
                row_type: PivotRowType::ColumnHeader,
                key: None,
                metric: None,
            },
        );
        page.add_row(
            vec![PivotViewCell::row_header("a".into()), PivotViewCell::placeholder("-")],
            PivotRowDescriptor {
                view_row: 1,
                row_type: PivotRowType::Data,
                key: None,
                metric: None,
            },
        );
        let mut view = PivotView::new(ValuesPosition::Columns, vec!["sum(1)".into()]);
        view.pages.push(page);
        assert_eq!(view.placeholder_count(), 1);
        assert_eq!(view.pages[0].text_rows(), vec![vec!["", "x"], vec!["a", "-"]]);
    }
}
