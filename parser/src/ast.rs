//! FILENAME: parser/src/ast.rs
//! PURPOSE: Defines the syntax tree for construction strings.
//! CONTEXT: The parser produces these nodes; the engine resolves field
//! references against the input and turns aggregator calls into live
//! aggregators. Nothing here knows which keywords are valid.

use std::fmt;

/// Reference to an input field, either by position or by header caption.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum FieldRef {
    /// 0-based field index.
    Index(usize),
    /// Column caption from the header row.
    Name(String),
}

/// An aggregator keyword with its numeric parameters, e.g. `ci_gauss 0.95`.
#[derive(Debug, PartialEq, Clone)]
pub struct AggregatorCall {
    pub keyword: String,
    pub args: Vec<f64>,
}

/// A metric argument: the field to aggregate and how, e.g. `3 sum`.
#[derive(Debug, PartialEq, Clone)]
pub struct MetricArg {
    pub field: FieldRef,
    pub aggregator: AggregatorCall,
}

/// A dimension argument: the fields whose values form one coordinate.
#[derive(Debug, PartialEq, Clone)]
pub struct DimensionArg {
    pub fields: Vec<FieldRef>,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Index(i) => write!(f, "{}", i),
            FieldRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Canonical text of the call: the keyword followed by its arguments,
/// separated by single spaces. Metric keys are built from this form.
impl fmt::Display for AggregatorCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl fmt::Display for MetricArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.aggregator)
    }
}
