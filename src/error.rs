//! Error taxonomy for dump extraction.
//!
//! Fatal variants stop processing of the current input file. Recoverable
//! variants are routed through the [`FaultTracker`](crate::faults::FaultTracker)
//! and never stop the scan on their own.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unable to determine encoding of {}: {detail}", path.display())]
    EncodingUndetermined { path: PathBuf, detail: String },

    #[error(
        "unterminated {kind} statement at end of input (statement started after byte {last_offset}, \
         {length} bytes pending)\n\nLine:\n{fragment}"
    )]
    UnterminatedStatement {
        kind: &'static str,
        /// Offset of the last byte that belonged to a complete statement.
        last_offset: u64,
        length: usize,
        fragment: String,
    },

    #[error("malformed value tuple in table `{table}`: {detail}")]
    MalformedValueTuple { table: String, detail: String },

    #[error("wrong number of values in table `{table}`: expected {expected}, found {found}")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("insert into `{table}` names column `{column}` which is not in the table schema")]
    UnknownColumn { table: String, column: String },

    #[error(
        "aborting: {bad} of {total} statements failed ({rate:.2}% > {max_rate:.2}%), \
         last read byte offset {last_offset}\nLast error: {detail}\n\nLine:\n{context}"
    )]
    AbortThresholdExceeded {
        bad: u64,
        total: u64,
        rate: f64,
        max_rate: f64,
        last_offset: u64,
        detail: String,
        context: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Faults that are counted and logged instead of stopping the file.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExtractError::MalformedValueTuple { .. }
                | ExtractError::ColumnCountMismatch { .. }
                | ExtractError::UnknownColumn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let fault = ExtractError::ColumnCountMismatch {
            table: "users".to_string(),
            expected: 3,
            found: 2,
        };
        assert!(fault.is_recoverable());

        let fatal = ExtractError::UnterminatedStatement {
            kind: "INSERT INTO",
            last_offset: 10,
            length: 4,
            fragment: "INSE".to_string(),
        };
        assert!(!fatal.is_recoverable());
    }

    #[test]
    fn test_mismatch_message() {
        let fault = ExtractError::ColumnCountMismatch {
            table: "users".to_string(),
            expected: 3,
            found: 2,
        };
        assert_eq!(
            fault.to_string(),
            "wrong number of values in table `users`: expected 3, found 2"
        );
    }
}
