//! FILENAME: engine/src/error.rs

use thiserror::Error;

use crate::columns::FieldIndex;

/// Every failure the aggregation engine can report.
/// All of them abort the batch unless a row policy says otherwise.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Failed recognizing aggregator in \"{input}\": {reason}")]
    Construction { input: String, reason: String },

    #[error("Record {record}: field {field} holds \"{value}\", which is not a finite number")]
    RowParse {
        record: u64,
        field: FieldIndex,
        value: String,
    },

    #[error("Dimension error: {0}")]
    Dimension(String),

    #[error("Metric {metric} has {count} value(s), too few to produce a statistic")]
    InsufficientData { metric: String, count: u64 },
}

impl EngineError {
    pub fn construction(input: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Construction {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn dimension(message: impl Into<String>) -> Self {
        EngineError::Dimension(message.into())
    }

    /// Attributes a dimension failure to the record that caused it.
    pub fn in_record(self, record: u64) -> Self {
        match self {
            EngineError::Dimension(message) => {
                EngineError::Dimension(format!("record {}: {}", record, message))
            }
            other => other,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
