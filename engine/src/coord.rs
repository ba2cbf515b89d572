//! FILENAME: engine/src/coord.rs
//! PURPOSE: Composite bucket keys: `Coordinate` (one dimension) and `Position`
//! (one coordinate per dimension).
//! CONTEXT: A coordinate binds a set of fields to the values one record holds
//! there. It doubles as a filter: it "matches" every record holding the same
//! values. Keys are built fresh for every record and must compare and hash
//! equal across records that share the same values.
//!
//! Equality and hashing are derived from the (field, value) pairs kept sorted
//! by field, so selector order never matters and map lookups always finish
//! with a full structural comparison.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::columns::{parse_number, ColumnNames, FieldIndex};
use crate::error::{EngineError, EngineResult};

// ============================================================================
// COORDINATE
// ============================================================================

/// Field -> value pairs taken from one record, sorted by field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    values: SmallVec<[(FieldIndex, String); 4]>,
}

impl Coordinate {
    /// Builds the coordinate of `record` for the given dimension selectors.
    /// A selector past the end of the record is a `DimensionError`.
    pub fn from_selectors<S: AsRef<str>>(
        selectors: &[FieldIndex],
        record: &[S],
    ) -> EngineResult<Self> {
        let mut values = SmallVec::with_capacity(selectors.len());
        for &field in selectors {
            let value = record.get(field).ok_or_else(|| {
                EngineError::dimension(format!(
                    "field {} is out of range for a record of {} field(s)",
                    field,
                    record.len()
                ))
            })?;
            values.push((field, value.as_ref().to_string()));
        }
        Ok(Self::normalized(values))
    }

    /// Builds a coordinate from explicit pairs, in any order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (FieldIndex, S)>,
        S: Into<String>,
    {
        Self::normalized(pairs.into_iter().map(|(f, v)| (f, v.into())).collect())
    }

    fn normalized(mut values: SmallVec<[(FieldIndex, String); 4]>) -> Self {
        values.sort_by_key(|(field, _)| *field);
        // A field selected twice carries the same value both times.
        values.dedup_by_key(|(field, _)| *field);
        Coordinate { values }
    }

    /// Value bound to `field`, if this coordinate covers it.
    pub fn value(&self, field: FieldIndex) -> Option<&str> {
        self.values
            .binary_search_by_key(&field, |(f, _)| *f)
            .ok()
            .map(|i| self.values[i].1.as_str())
    }

    /// Bound fields in ascending order.
    pub fn fields(&self) -> impl Iterator<Item = FieldIndex> + '_ {
        self.values.iter().map(|(f, _)| *f)
    }

    /// (field, value) pairs in ascending field order.
    pub fn pairs(&self) -> impl Iterator<Item = (FieldIndex, &str)> + '_ {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when `record` holds this coordinate's value at every bound field.
    pub fn matches<S: AsRef<str>>(&self, record: &[S]) -> bool {
        self.values
            .iter()
            .all(|(field, value)| record.get(*field).map(|v| v.as_ref()) == Some(value.as_str()))
    }

    /// Human-readable label, e.g. `region = north, col 3 = 7`.
    pub fn caption(&self, columns: Option<&ColumnNames>) -> String {
        self.values
            .iter()
            .map(|(field, value)| match columns.and_then(|c| c.name(*field)) {
                Some(name) => format!("{} = {}", name, value),
                None => format!("col {} = {}", field, value),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rendering order walking `order` (the dimension's declared fields).
    /// Fields missing on either side are skipped.
    pub fn compare_in_order(&self, other: &Coordinate, order: &[FieldIndex]) -> Ordering {
        for &field in order {
            if let (Some(l), Some(r)) = (self.value(field), other.value(field)) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.caption(None))
    }
}

/// Numbers compare numerically and sort before all other values, which
/// compare lexicographically. A total order, so it is safe for `sort_by`.
pub fn compare_values(left: &str, right: &str) -> Ordering {
    match (parse_number(left), parse_number(right)) {
        (Some(l), Some(r)) => l.total_cmp(&r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}

// ============================================================================
// POSITION
// ============================================================================

/// One coordinate per declared dimension, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    coords: SmallVec<[Coordinate; 3]>,
}

impl Position {
    /// A position needs at least one coordinate.
    pub fn new<I: IntoIterator<Item = Coordinate>>(coords: I) -> EngineResult<Self> {
        let coords: SmallVec<[Coordinate; 3]> = coords.into_iter().collect();
        if coords.is_empty() {
            return Err(EngineError::dimension(
                "a position must have at least one coordinate",
            ));
        }
        Ok(Position { coords })
    }

    /// Builds the position of `record` for each dimension's selectors.
    pub fn from_record<S: AsRef<str>>(
        dimensions: &[Vec<FieldIndex>],
        record: &[S],
    ) -> EngineResult<Self> {
        let coords = dimensions
            .iter()
            .map(|selectors| Coordinate::from_selectors(selectors, record))
            .collect::<EngineResult<SmallVec<[Coordinate; 3]>>>()?;
        Position::new(coords)
    }

    pub fn coordinate(&self, index: usize) -> Option<&Coordinate> {
        self.coords.get(index)
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coords
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.coords.len()
    }

    /// True when every coordinate matches `record`.
    pub fn matches<S: AsRef<str>>(&self, record: &[S]) -> bool {
        self.coords.iter().all(|c| c.matches(record))
    }

    pub fn caption(&self, columns: Option<&ColumnNames>) -> String {
        self.coords
            .iter()
            .map(|c| format!("coord({})", c.caption(columns)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.caption(None))
    }
}
