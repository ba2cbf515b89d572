//! Pivot Engine - Arranges finished buckets into renderable grids.
//!
//! This module takes the `GroupResult` snapshots of a `BucketTable` and
//! produces a `PivotView` (paged 2D grids) or a flat `GroupTableView`.
//!
//! Algorithm:
//! 1. Assign roles: 2 dimensions are (row, column), 3 are (page, row, column)
//! 2. Partition results by page key (a single implicit page without one)
//! 3. Collect the distinct row and column keys of each page and sort them;
//!    two distinct keys that compare equal are a `DimensionError`
//! 4. Cross the sorted keys and emit one cell per metric, gap-filling
//!    combinations without a bucket with the layout's placeholder

use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};

use engine::{field_label, ColumnNames, Coordinate, EngineError, EngineResult, FieldIndex};

use crate::cache::GroupResult;
use crate::definition::{PivotLayout, ValuesPosition};
use crate::view::{
    GroupTableView, PivotColumnDescriptor, PivotColumnType, PivotPage, PivotRowDescriptor,
    PivotRowType, PivotView, PivotViewCell,
};

// ============================================================================
// PAGE GATHERING
// ============================================================================

/// The keys and cells of one page before sorting.
#[derive(Default)]
struct PageGather<'a> {
    rows: FxHashSet<Coordinate>,
    cols: FxHashSet<Coordinate>,
    cells: FxHashMap<(Coordinate, Coordinate), &'a GroupResult>,
}

/// Which position slot plays which role.
#[derive(Debug, Clone, Copy)]
struct Roles {
    page: Option<usize>,
    row: usize,
    col: usize,
}

impl Roles {
    fn for_rank(rank: usize) -> EngineResult<Self> {
        match rank {
            2 => Ok(Roles { page: None, row: 0, col: 1 }),
            3 => Ok(Roles { page: Some(0), row: 1, col: 2 }),
            n => Err(EngineError::dimension(format!(
                "a pivot needs 2 or 3 dimensions, {} given",
                n
            ))),
        }
    }
}

// ============================================================================
// PIVOT ARRANGER
// ============================================================================

/// Arranges group results into a paged pivot grid.
pub struct PivotArranger<'a> {
    results: &'a [GroupResult],
    metric_keys: &'a [String],
    dimensions: &'a [Vec<FieldIndex>],
    layout: &'a PivotLayout,
    columns: Option<&'a ColumnNames>,
}

impl<'a> PivotArranger<'a> {
    pub fn new(
        results: &'a [GroupResult],
        metric_keys: &'a [String],
        dimensions: &'a [Vec<FieldIndex>],
        layout: &'a PivotLayout,
        columns: Option<&'a ColumnNames>,
    ) -> Self {
        PivotArranger {
            results,
            metric_keys,
            dimensions,
            layout,
            columns,
        }
    }

    /// Executes the arrangement and returns the rendered view.
    pub fn arrange(&self) -> EngineResult<PivotView> {
        let roles = Roles::for_rank(self.dimensions.len())?;

        // Step 1: Partition by page
        let pages = self.gather(roles)?;

        // Step 2: Sort page keys
        let mut page_keys: Vec<Option<Coordinate>> = pages.keys().cloned().collect();
        if let Some(page_dim) = roles.page {
            let order = &self.dimensions[page_dim];
            let keys = page_keys.into_iter().flatten().collect();
            let sorted = sort_keys(keys, order, "page", self.columns)?;
            page_keys = sorted.into_iter().map(Some).collect();
        }

        // Step 3: Render each page
        let mut view = PivotView::new(self.layout.values_position, self.metric_keys.to_vec());
        for key in page_keys {
            let Some(gather) = pages.get(&key) else {
                continue;
            };
            let rows = sort_keys(
                gather.rows.iter().cloned().collect(),
                &self.dimensions[roles.row],
                "row",
                self.columns,
            )?;
            let cols = sort_keys(
                gather.cols.iter().cloned().collect(),
                &self.dimensions[roles.col],
                "column",
                self.columns,
            )?;

            let caption = key.as_ref().map(|k| k.caption(self.columns));
            let mut page = PivotPage::new(key, caption);
            match self.layout.values_position {
                ValuesPosition::Columns => {
                    self.render_extend_columns(&mut page, gather, &rows, &cols)
                }
                ValuesPosition::Rows => self.render_extend_rows(&mut page, gather, &rows, &cols),
            }
            view.pages.push(page);
        }

        Ok(view)
    }

    fn gather(&self, roles: Roles) -> EngineResult<FxHashMap<Option<Coordinate>, PageGather<'a>>> {
        let mut pages: FxHashMap<Option<Coordinate>, PageGather<'a>> = FxHashMap::default();
        let results: &'a [GroupResult] = self.results;
        for result in results {
            let position = &result.position;
            if position.rank() != self.dimensions.len() {
                return Err(EngineError::dimension(format!(
                    "position {} has {} coordinate(s), expected {}",
                    position,
                    position.rank(),
                    self.dimensions.len()
                )));
            }
            let page_key = roles.page.and_then(|i| position.coordinate(i)).cloned();
            let row = position.coordinate(roles.row);
            let col = position.coordinate(roles.col);
            let (Some(row), Some(col)) = (row, col) else {
                continue;
            };

            let page = pages.entry(page_key).or_default();
            page.rows.insert(row.clone());
            page.cols.insert(col.clone());
            page.cells.insert((row.clone(), col.clone()), result);
        }
        Ok(pages)
    }

    fn cell(
        &self,
        gather: &PageGather<'_>,
        row: &Coordinate,
        col: &Coordinate,
        metric: &str,
    ) -> PivotViewCell {
        gather
            .cells
            .get(&(row.clone(), col.clone()))
            .and_then(|result| result.value(metric))
            .map(PivotViewCell::data)
            .unwrap_or_else(|| PivotViewCell::placeholder(&self.layout.placeholder))
    }

    /// One physical row per row key; one column per (column key, metric).
    fn render_extend_columns(
        &self,
        page: &mut PivotPage,
        gather: &PageGather<'_>,
        rows: &[Coordinate],
        cols: &[Coordinate],
    ) {
        let mut header = vec![PivotViewCell::corner()];
        page.columns.push(row_label_column());
        for col in cols {
            for metric in self.metric_keys {
                header.push(PivotViewCell::column_header(format!(
                    "{}; {}",
                    col.caption(self.columns),
                    metric
                )));
                page.columns.push(PivotColumnDescriptor {
                    view_col: page.columns.len(),
                    col_type: PivotColumnType::Data,
                    key: Some(col.clone()),
                    metric: Some(metric.clone()),
                });
            }
        }
        page.add_row(header, header_row());

        for row in rows {
            let mut cells = vec![PivotViewCell::row_header(row.caption(self.columns))];
            for col in cols {
                for metric in self.metric_keys {
                    cells.push(self.cell(gather, row, col, metric));
                }
            }
            let descriptor = PivotRowDescriptor {
                view_row: page.row_count(),
                row_type: PivotRowType::Data,
                key: Some(row.clone()),
                metric: None,
            };
            page.add_row(cells, descriptor);
        }
    }

    /// One column per column key; one physical row per (row key, metric).
    fn render_extend_rows(
        &self,
        page: &mut PivotPage,
        gather: &PageGather<'_>,
        rows: &[Coordinate],
        cols: &[Coordinate],
    ) {
        let mut header = vec![PivotViewCell::corner()];
        page.columns.push(row_label_column());
        for col in cols {
            header.push(PivotViewCell::column_header(col.caption(self.columns)));
            page.columns.push(PivotColumnDescriptor {
                view_col: page.columns.len(),
                col_type: PivotColumnType::Data,
                key: Some(col.clone()),
                metric: None,
            });
        }
        page.add_row(header, header_row());

        for row in rows {
            for metric in self.metric_keys {
                let label = format!("{}; {}", row.caption(self.columns), metric);
                let mut cells = vec![PivotViewCell::row_header(label)];
                for col in cols {
                    cells.push(self.cell(gather, row, col, metric));
                }
                let descriptor = PivotRowDescriptor {
                    view_row: page.row_count(),
                    row_type: PivotRowType::Data,
                    key: Some(row.clone()),
                    metric: Some(metric.clone()),
                };
                page.add_row(cells, descriptor);
            }
        }
    }
}

fn header_row() -> PivotRowDescriptor {
    PivotRowDescriptor {
        view_row: 0,
        row_type: PivotRowType::ColumnHeader,
        key: None,
        metric: None,
    }
}

fn row_label_column() -> PivotColumnDescriptor {
    PivotColumnDescriptor {
        view_col: 0,
        col_type: PivotColumnType::RowLabel,
        key: None,
        metric: None,
    }
}

/// Sorts keys field by field in declaration order. The order must be
/// strict: distinct keys comparing equal mean the dimension cannot be laid
/// out deterministically.
fn sort_keys(
    mut keys: Vec<Coordinate>,
    order: &[FieldIndex],
    role: &str,
    columns: Option<&ColumnNames>,
) -> EngineResult<Vec<Coordinate>> {
    keys.sort_by(|a, b| a.compare_in_order(b, order));
    for pair in keys.windows(2) {
        if pair[0].compare_in_order(&pair[1], order) == Ordering::Equal {
            return Err(EngineError::dimension(format!(
                "{} keys \"{}\" and \"{}\" are distinct but sort as equal",
                role,
                pair[0].caption(columns),
                pair[1].caption(columns)
            )));
        }
    }
    Ok(keys)
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Arranges group results into a pivot view.
/// This is the main entry point for pivot rendering.
pub fn arrange_pivot(
    results: &[GroupResult],
    metric_keys: &[String],
    dimensions: &[Vec<FieldIndex>],
    layout: &PivotLayout,
    columns: Option<&ColumnNames>,
) -> EngineResult<PivotView> {
    PivotArranger::new(results, metric_keys, dimensions, layout, columns).arrange()
}

/// Renders group results as a flat table, one row per bucket in the order
/// given. Each row lists the grouping values, then one cell per metric.
pub fn render_group_table(
    results: &[GroupResult],
    metric_keys: &[String],
    dimensions: &[Vec<FieldIndex>],
    columns: Option<&ColumnNames>,
    placeholder: &str,
) -> GroupTableView {
    let mut header: Vec<String> = dimensions
        .iter()
        .flatten()
        .map(|&field| field_label(field, columns))
        .collect();
    header.extend(metric_keys.iter().cloned());

    let rows = results
        .iter()
        .map(|result| {
            let mut cells: Vec<PivotViewCell> = dimensions
                .iter()
                .enumerate()
                .flat_map(|(i, fields)| {
                    let coord = result.position.coordinate(i);
                    fields.iter().map(move |&field| {
                        coord.and_then(|c| c.value(field)).unwrap_or_default().to_string()
                    })
                })
                .map(PivotViewCell::row_header)
                .collect();
            cells.extend(metric_keys.iter().map(|key| {
                result
                    .value(key)
                    .map(PivotViewCell::data)
                    .unwrap_or_else(|| PivotViewCell::placeholder(placeholder))
            }));
            cells
        })
        .collect();

    GroupTableView { header, rows }
}
