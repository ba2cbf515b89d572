//! Bucket Table - The grouping engine.
//!
//! The table is designed for:
//! - Single-pass ingestion of records (O(n) with hash lookup)
//! - Lazy aggregator construction: a bucket creates its aggregators the
//!   first time a record lands in it
//! - Whole-record atomicity: a record is validated before anything is fed
//!
//! Architecture:
//! - Buckets live in an arena (`Vec<Bucket>`) and are addressed by `BucketId`
//! - A `LookupStrategy` maps an incoming record to a `BucketId`, inserting a
//!   new bucket on first sight. Two strategies exist and are interchangeable:
//!   `HashLookup` (Position -> BucketId map) and `LinearScan` (first bucket
//!   whose position matches the raw record, in discovery order)
//! - Iteration always follows discovery order

use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use engine::{
    parse_number, Aggregator, ColumnNames, EngineError, EngineResult, FieldIndex, Position,
};

use crate::definition::{ResolvedMetric, RowErrorPolicy, SparseStatPolicy, TableDefinition};

/// Index of a bucket in the arena.
pub type BucketId = u32;

// ============================================================================
// BUCKET
// ============================================================================

/// The live aggregators of one position, one slot per metric.
/// A slot stays `None` until the first record reaches this bucket.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub position: Position,
    slots: Vec<Option<Aggregator>>,
    rows: u64,
}

impl Bucket {
    fn new(position: Position, metric_count: usize) -> Self {
        Bucket {
            position,
            slots: vec![None; metric_count],
            rows: 0,
        }
    }

    /// Number of records that landed here.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn aggregator(&self, slot: usize) -> Option<&Aggregator> {
        self.slots.get(slot).and_then(Option::as_ref)
    }
}

// ============================================================================
// LOOKUP STRATEGIES
// ============================================================================

/// Maps a record to its bucket, creating the bucket on first sight.
pub trait LookupStrategy: Default {
    /// Returns the bucket holding `position`, or `None` if there is none yet.
    fn find<S: AsRef<str>>(
        &self,
        buckets: &[Bucket],
        position: &Position,
        record: &[S],
    ) -> Option<BucketId>;

    /// Records that `id` now holds `position`.
    fn register(&mut self, position: &Position, id: BucketId);

    fn name(&self) -> &'static str;
}

/// Hash-indexed lookup: O(1) amortized per record.
#[derive(Debug, Default, Clone)]
pub struct HashLookup {
    index: FxHashMap<Position, BucketId>,
}

impl LookupStrategy for HashLookup {
    fn find<S: AsRef<str>>(
        &self,
        _buckets: &[Bucket],
        position: &Position,
        _record: &[S],
    ) -> Option<BucketId> {
        self.index.get(position).copied()
    }

    fn register(&mut self, position: &Position, id: BucketId) {
        self.index.insert(position.clone(), id);
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}

/// Linear scan over discovered buckets, testing each position against the
/// raw record. O(groups) per record; first match wins.
#[derive(Debug, Default, Clone)]
pub struct LinearScan;

impl LookupStrategy for LinearScan {
    fn find<S: AsRef<str>>(
        &self,
        buckets: &[Bucket],
        _position: &Position,
        record: &[S],
    ) -> Option<BucketId> {
        buckets
            .iter()
            .position(|b| b.position.matches(record))
            .map(|i| i as BucketId)
    }

    fn register(&mut self, _position: &Position, _id: BucketId) {}

    fn name(&self) -> &'static str {
        "linear-scan"
    }
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// The materialized metrics of one bucket, taken after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResult {
    pub position: Position,
    /// `(metric key, value)` in metric definition order.
    pub values: Vec<(String, f64)>,
}

impl GroupResult {
    pub fn value(&self, metric_key: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(key, _)| key == metric_key)
            .map(|(_, v)| *v)
    }
}

// ============================================================================
// BUCKET TABLE
// ============================================================================

/// Groups records into buckets keyed by `Position`.
#[derive(Debug, Clone)]
pub struct BucketTable<L: LookupStrategy = HashLookup> {
    dimensions: Vec<Vec<FieldIndex>>,
    metrics: Vec<ResolvedMetric>,
    row_errors: RowErrorPolicy,
    sparse_stats: SparseStatPolicy,
    buckets: Vec<Bucket>,
    lookup: L,
    rows_consumed: u64,
    skipped_rows: u64,
}

impl BucketTable<HashLookup> {
    /// A table using hash lookup.
    pub fn new(definition: &TableDefinition, columns: Option<&ColumnNames>) -> EngineResult<Self> {
        Self::with_strategy(definition, columns)
    }
}

impl BucketTable<LinearScan> {
    /// A table using linear-scan lookup.
    pub fn linear(definition: &TableDefinition, columns: Option<&ColumnNames>) -> EngineResult<Self> {
        Self::with_strategy(definition, columns)
    }
}

impl<L: LookupStrategy> BucketTable<L> {
    /// Validates and resolves the definition. Fails before any record is seen
    /// if an aggregator string is malformed or a selector cannot be resolved.
    pub fn with_strategy(
        definition: &TableDefinition,
        columns: Option<&ColumnNames>,
    ) -> EngineResult<Self> {
        definition.validate()?;
        let dimensions = definition.resolve_dimensions(columns)?;
        let metrics = definition.resolve_metrics(columns)?;
        let lookup = L::default();
        debug!(
            "bucket table: {} dimension(s), {} metric(s), {} lookup",
            dimensions.len(),
            metrics.len(),
            lookup.name()
        );

        Ok(BucketTable {
            dimensions,
            metrics,
            row_errors: definition.row_errors,
            sparse_stats: definition.sparse_stats,
            buckets: Vec::new(),
            lookup,
            rows_consumed: 0,
            skipped_rows: 0,
        })
    }

    /// Ingests one record.
    ///
    /// Under `RowErrorPolicy::Skip` a record with an out-of-range selector or
    /// a non-numeric metric field is dropped whole and `Ok(())` is returned.
    pub fn consume_row<S: AsRef<str>>(&mut self, record: &[S]) -> EngineResult<()> {
        let record_no = self.rows_consumed + self.skipped_rows + 1;
        match self.ingest(record, record_no) {
            Ok(()) => {
                self.rows_consumed += 1;
                Ok(())
            }
            Err(err) if self.row_errors == RowErrorPolicy::Skip => {
                warn!("skipping record {}: {}", record_no, err);
                self.skipped_rows += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn ingest<S: AsRef<str>>(&mut self, record: &[S], record_no: u64) -> EngineResult<()> {
        let position =
            Position::from_record(&self.dimensions, record).map_err(|e| e.in_record(record_no))?;

        // Parse every metric field before touching a bucket.
        let mut values = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            let raw = record.get(metric.field).map(|v| v.as_ref()).ok_or_else(|| {
                EngineError::dimension(format!(
                    "field {} is out of range for a record of {} field(s)",
                    metric.field,
                    record.len()
                ))
                .in_record(record_no)
            })?;
            let value = parse_number(raw).ok_or_else(|| EngineError::RowParse {
                record: record_no,
                field: metric.field,
                value: raw.to_string(),
            })?;
            values.push(value);
        }

        let id = self.get_or_insert(position, record);
        let bucket = &mut self.buckets[id as usize];
        bucket.rows += 1;
        for ((slot, metric), value) in bucket.slots.iter_mut().zip(&self.metrics).zip(values) {
            slot.get_or_insert_with(|| metric.spec.build()).put(value);
        }
        Ok(())
    }

    fn get_or_insert<S: AsRef<str>>(&mut self, position: Position, record: &[S]) -> BucketId {
        if let Some(id) = self.lookup.find(&self.buckets, &position, record) {
            return id;
        }
        let id = self.buckets.len() as BucketId;
        debug!("new bucket {} at {}", id, position);
        self.lookup.register(&position, id);
        self.buckets.push(Bucket::new(position, self.metrics.len()));
        id
    }

    /// Visits every (position, metric key, value) triple, in discovery order.
    /// Restartable: repeated calls yield the same triples.
    pub fn for_each<F>(&self, mut visit: F) -> EngineResult<()>
    where
        F: FnMut(&Position, &str, f64),
    {
        for bucket in &self.buckets {
            for (slot, metric) in bucket.slots.iter().zip(&self.metrics) {
                if let Some(aggregator) = slot {
                    visit(&bucket.position, &metric.key, self.materialize(metric, aggregator)?);
                }
            }
        }
        Ok(())
    }

    /// Materializes every bucket.
    pub fn snapshot(&self) -> EngineResult<Vec<GroupResult>> {
        let mut results = Vec::with_capacity(self.buckets.len());
        for bucket in &self.buckets {
            let mut values = Vec::with_capacity(self.metrics.len());
            for (slot, metric) in bucket.slots.iter().zip(&self.metrics) {
                if let Some(aggregator) = slot {
                    values.push((metric.key.clone(), self.materialize(metric, aggregator)?));
                }
            }
            results.push(GroupResult {
                position: bucket.position.clone(),
                values,
            });
        }
        Ok(results)
    }

    fn materialize(&self, metric: &ResolvedMetric, aggregator: &Aggregator) -> EngineResult<f64> {
        match self.sparse_stats {
            SparseStatPolicy::Nan => Ok(aggregator.get()),
            SparseStatPolicy::Fail => {
                aggregator
                    .try_get()
                    .ok_or_else(|| EngineError::InsufficientData {
                        metric: metric.key.clone(),
                        count: aggregator.observations().unwrap_or(0),
                    })
            }
        }
    }

    /// Metric keys in definition order, duplicates collapsed.
    pub fn metric_keys(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.key.clone()).collect()
    }

    /// Resolved field indices of each dimension.
    pub fn dimensions(&self) -> &[Vec<FieldIndex>] {
        &self.dimensions
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Discovered positions, in discovery order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.buckets.iter().map(|b| &b.position)
    }

    /// Number of distinct positions.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn rows_consumed(&self) -> u64 {
        self.rows_consumed
    }

    pub fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }
}
