//! FILENAME: pivot-engine/src/definition.rs
//! Table Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a grouping table.
//! These structures are designed to be:
//! - Serializable (for loading from a JSON definition file)
//! - Built from command-line arguments just as well
//! - Immutable snapshots of user intent: nothing here touches records

use serde::{Deserialize, Serialize};

use engine::{
    field_label, resolve_field, AggregatorSpec, ColumnNames, EngineError, EngineResult,
    FieldIndex,
};
use parser::FieldRef;

// ============================================================================
// FIELD SELECTORS
// ============================================================================

/// A field chosen by position or by header caption.
/// Serialized untagged: `3` or `"price"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSelector {
    Index(FieldIndex),
    Name(String),
}

impl From<FieldRef> for FieldSelector {
    fn from(field: FieldRef) -> Self {
        match field {
            FieldRef::Index(i) => FieldSelector::Index(i),
            FieldRef::Name(name) => FieldSelector::Name(name),
        }
    }
}

impl From<&FieldSelector> for FieldRef {
    fn from(field: &FieldSelector) -> Self {
        match field {
            FieldSelector::Index(i) => FieldRef::Index(*i),
            FieldSelector::Name(name) => FieldRef::Name(name.clone()),
        }
    }
}

impl FieldSelector {
    /// Resolves to a field index, consulting the header row for names.
    pub fn resolve(&self, columns: Option<&ColumnNames>) -> EngineResult<FieldIndex> {
        resolve_field(&FieldRef::from(self), columns)
    }
}

// ============================================================================
// DIMENSIONS AND METRICS
// ============================================================================

/// One grouping axis: the fields whose values form its coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    pub fields: Vec<FieldSelector>,
}

impl DimensionDef {
    pub fn new(fields: Vec<FieldSelector>) -> Self {
        DimensionDef { fields }
    }

    /// Parses a dimension argument such as `"1 2"` or `"region, 'unit type'"`.
    pub fn parse(input: &str) -> EngineResult<Self> {
        let arg = parser::parse_dimension(input).map_err(|e| {
            EngineError::dimension(format!("failed parsing dimension \"{}\": {}", input, e.message))
        })?;
        Ok(DimensionDef {
            fields: arg.fields.into_iter().map(FieldSelector::from).collect(),
        })
    }

    pub fn resolve(&self, columns: Option<&ColumnNames>) -> EngineResult<Vec<FieldIndex>> {
        self.fields.iter().map(|f| f.resolve(columns)).collect()
    }
}

/// A (source field, aggregator construction string) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDef {
    pub field: FieldSelector,
    pub aggregator: String,
}

impl MetricDef {
    pub fn new(field: FieldSelector, aggregator: impl Into<String>) -> Self {
        MetricDef {
            field,
            aggregator: aggregator.into(),
        }
    }

    /// Parses a metric argument such as `"3 sum"` or `"price ci_gauss 0.9"`.
    pub fn parse(input: &str) -> EngineResult<Self> {
        let arg = parser::parse_metric(input)
            .map_err(|e| EngineError::construction(input, e.message))?;
        Ok(MetricDef {
            field: arg.field.into(),
            aggregator: arg.aggregator.to_string(),
        })
    }

    pub fn spec(&self) -> EngineResult<AggregatorSpec> {
        AggregatorSpec::parse(&self.aggregator)
    }
}

/// A metric after selector resolution and spec validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetric {
    /// `spec(field)`, e.g. `sum(price)` or `stdev(3)`.
    pub key: String,
    pub field: FieldIndex,
    pub spec: AggregatorSpec,
}

/// Builds the key under which a metric is stored in every bucket.
pub fn metric_key(spec: &AggregatorSpec, field: FieldIndex, columns: Option<&ColumnNames>) -> String {
    format!("{}({})", spec, field_label(field, columns))
}

// ============================================================================
// POLICIES
// ============================================================================

/// What happens to a record that cannot be ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// The first bad record aborts the batch.
    #[default]
    Abort,
    /// The bad record is dropped as a whole and counted.
    Skip,
}

/// How under-populated statistics are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SparseStatPolicy {
    #[default]
    Nan,
    Fail,
}

// ============================================================================
// TABLE DEFINITION
// ============================================================================

/// The complete definition of a grouping table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDefinition {
    pub dimensions: Vec<DimensionDef>,
    pub metrics: Vec<MetricDef>,
    #[serde(default)]
    pub row_errors: RowErrorPolicy,
    #[serde(default)]
    pub sparse_stats: SparseStatPolicy,
    /// Pivot rendering options; ignored by the flat group-by output.
    #[serde(default)]
    pub layout: PivotLayout,
}

impl TableDefinition {
    pub fn new(dimensions: Vec<DimensionDef>, metrics: Vec<MetricDef>) -> Self {
        TableDefinition {
            dimensions,
            metrics,
            ..Default::default()
        }
    }

    /// Checks the definition before any record is read:
    /// at least one dimension, each non-empty, at least one metric,
    /// and every aggregator string recognized.
    pub fn validate(&self) -> EngineResult<()> {
        if self.dimensions.is_empty() {
            return Err(EngineError::dimension("at least one dimension must be defined"));
        }
        if let Some(i) = self.dimensions.iter().position(|d| d.fields.is_empty()) {
            return Err(EngineError::dimension(format!("dimension {} selects no fields", i)));
        }
        if self.metrics.is_empty() {
            return Err(EngineError::construction("", "at least one aggregator must be defined"));
        }
        for metric in &self.metrics {
            metric.spec()?;
        }
        Ok(())
    }

    /// Resolves every dimension to field indices.
    pub fn resolve_dimensions(
        &self,
        columns: Option<&ColumnNames>,
    ) -> EngineResult<Vec<Vec<FieldIndex>>> {
        self.dimensions.iter().map(|d| d.resolve(columns)).collect()
    }

    /// Resolves every metric, in definition order. Two metrics with the
    /// same key are kept once.
    pub fn resolve_metrics(&self, columns: Option<&ColumnNames>) -> EngineResult<Vec<ResolvedMetric>> {
        let mut resolved: Vec<ResolvedMetric> = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            let spec = metric.spec()?;
            let field = metric.field.resolve(columns)?;
            let key = metric_key(&spec, field, columns);
            if resolved.iter().any(|m| m.key == key) {
                log::warn!("metric {} is defined more than once; keeping one slot", key);
                continue;
            }
            resolved.push(ResolvedMetric { key, field, spec });
        }
        Ok(resolved)
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Pivot rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotLayout {
    /// Where repeated metrics go.
    #[serde(default)]
    pub values_position: ValuesPosition,

    /// Marker written where a (row, column) combination has no bucket.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    "-".to_string()
}

impl Default for PivotLayout {
    fn default() -> Self {
        PivotLayout {
            values_position: ValuesPosition::Columns,
            placeholder: default_placeholder(),
        }
    }
}

/// Where multiple metrics are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuesPosition {
    /// Extend columns: one output column per (column key, metric).
    #[default]
    Columns,
    /// Extend rows: one output row per (row key, metric).
    Rows,
}
