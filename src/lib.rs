//! Streaming extraction of table rows from SQL dump files into CSV.
//!
//! A dump is read once, front to back. Statements are assembled from the
//! decoded text, classified by their leading keyword, filtered by table name
//! and only then tokenized. Rows go to one CSV file per table; statements
//! that fail to tokenize are counted and reported instead of stopping the
//! run, unless too many of them fail.

pub mod encoding;
pub mod error;
pub mod extractor;
pub mod faults;
pub mod filter;
pub mod parser;
pub mod progress;
pub mod schema;
pub mod writer;

pub use error::ExtractError;
pub use extractor::{ExtractStats, Extractor, ExtractorConfig, FileOutcome};
