//! Fault accounting for recoverable parse failures.
//!
//! Every INSERT statement or COPY row is one unit of work. A unit that fails
//! to tokenize is a fault; once enough units have been seen and the share of
//! faults crosses the policy's threshold the whole file is aborted. Fault
//! records are streamed to an anonymous temporary file and only turned into a
//! `<input>.bad_inserts.txt` sidecar when the file finishes under threshold.

use crate::error::ExtractError;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_MAX_FAILURE_RATE: f64 = 0.20;
pub const DEFAULT_MIN_SAMPLE_SIZE: u64 = 5;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 5000;

/// Appended to statement text cut at `max_context_chars`.
pub const TRUNCATION_MARKER: &str = "...OUTPUT CUT DUE TO LENGTH...";

/// Suffix of the diagnostics sidecar, appended to the full input file name.
pub const SIDECAR_SUFFIX: &str = ".bad_inserts.txt";

/// Abort threshold and diagnostics limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultPolicy {
    /// Abort once `bad / total` exceeds this ratio...
    pub max_failure_rate: f64,
    /// ...and at least this many units have been seen.
    pub min_sample_size: u64,
    pub max_context_chars: usize,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            max_failure_rate: DEFAULT_MAX_FAILURE_RATE,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounts {
    pub total: u64,
    pub bad: u64,
}

impl FaultCounts {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.bad as f64 / self.total as f64
        }
    }
}

struct LastFault {
    detail: String,
    context: String,
}

pub struct FaultTracker {
    policy: FaultPolicy,
    counts: FaultCounts,
    last_offset: u64,
    last_fault: Option<LastFault>,
    encoding: &'static Encoding,
    records: Option<BufWriter<File>>,
}

impl FaultTracker {
    pub fn new(policy: FaultPolicy) -> Self {
        Self {
            policy,
            counts: FaultCounts::default(),
            last_offset: 0,
            last_fault: None,
            encoding: encoding_rs::UTF_8,
            records: None,
        }
    }

    /// Encoding used for the sidecar text.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn counts(&self) -> FaultCounts {
        self.counts
    }

    /// Count one unit of work ending at `offset`.
    pub fn record_total(&mut self, offset: u64) -> Result<(), ExtractError> {
        self.counts.total += 1;
        self.last_offset = offset;
        self.check()
    }

    /// Record a recoverable failure of the unit most recently counted.
    pub fn record_fault(
        &mut self,
        error: &ExtractError,
        context: &str,
        offset: u64,
    ) -> Result<(), ExtractError> {
        // A fault always belongs to a counted unit
        if self.counts.bad == self.counts.total {
            self.counts.total += 1;
        }
        self.counts.bad += 1;
        self.last_offset = offset;

        let detail = error.to_string();
        let context = truncate_context(context, self.policy.max_context_chars);
        warn!(fault = self.counts.bad, offset, "{}", detail);

        self.write_record(self.counts.bad, offset, &detail, &context)?;
        self.last_fault = Some(LastFault { detail, context });
        self.check()
    }

    fn check(&self) -> Result<(), ExtractError> {
        let counts = self.counts;
        if counts.total < self.policy.min_sample_size
            || counts.rate() <= self.policy.max_failure_rate
        {
            return Ok(());
        }

        let (detail, context) = match &self.last_fault {
            Some(last) => (last.detail.clone(), last.context.clone()),
            None => (String::new(), String::new()),
        };
        Err(ExtractError::AbortThresholdExceeded {
            bad: counts.bad,
            total: counts.total,
            rate: counts.rate() * 100.0,
            max_rate: self.policy.max_failure_rate * 100.0,
            last_offset: self.last_offset,
            detail,
            context,
        })
    }

    fn write_record(
        &mut self,
        sequence: u64,
        offset: u64,
        detail: &str,
        context: &str,
    ) -> io::Result<()> {
        if self.records.is_none() {
            self.records = Some(BufWriter::new(tempfile::tempfile()?));
        }
        let record = format!(
            "******\nFault #{} (statement ending at byte {})\nError: {}\n\nLine:\n{}\n\n",
            sequence, offset, detail, context
        );
        let (bytes, _, _) = self.encoding.encode(&record);
        if let Some(records) = self.records.as_mut() {
            records.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Write the sidecar if any fault was recorded; returns its path.
    pub fn finish(self, sidecar: &Path) -> Result<Option<PathBuf>, ExtractError> {
        let Some(records) = self.records else {
            return Ok(None);
        };
        let mut records = records.into_inner().map_err(|e| e.into_error())?;
        records.seek(SeekFrom::Start(0))?;

        let mut out = BufWriter::new(File::create(sidecar)?);
        let header = format!(
            "##### Insert Errors #####\nError rate: {:.2}%\n\n",
            self.counts.rate() * 100.0
        );
        out.write_all(&self.encoding.encode(&header).0)?;
        io::copy(&mut records, &mut out)?;
        out.flush()?;

        Ok(Some(sidecar.to_path_buf()))
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_context(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// `<input>.bad_inserts.txt`, placed in `dir` when given.
pub fn sidecar_path(input: &Path, dir: Option<&Path>) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dump".to_string());
    let name = format!("{}{}", file_name, SIDECAR_SUFFIX);
    match dir.or_else(|| input.parent()) {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mismatch() -> ExtractError {
        ExtractError::ColumnCountMismatch {
            table: "users".to_string(),
            expected: 2,
            found: 3,
        }
    }

    fn bad_unit(tracker: &mut FaultTracker, offset: u64) -> Result<(), ExtractError> {
        tracker.record_total(offset)?;
        tracker.record_fault(&mismatch(), "INSERT INTO users VALUES (1,2,3);", offset)
    }

    #[test]
    fn test_below_min_sample_never_aborts() {
        let mut tracker = FaultTracker::new(FaultPolicy::default());
        for i in 0..4 {
            bad_unit(&mut tracker, i * 10).unwrap();
        }
        assert_eq!(tracker.counts(), FaultCounts { total: 4, bad: 4 });
    }

    #[test]
    fn test_two_of_eight_aborts() {
        let mut tracker = FaultTracker::new(FaultPolicy::default());
        for i in 0..6 {
            tracker.record_total(i).unwrap();
        }
        bad_unit(&mut tracker, 6).unwrap();
        let err = bad_unit(&mut tracker, 7).unwrap_err();
        match err {
            ExtractError::AbortThresholdExceeded {
                bad, total, detail, ..
            } => {
                assert_eq!((bad, total), (2, 8));
                assert!(detail.contains("expected 2, found 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_early_faults_abort_once_sample_is_large_enough() {
        let mut tracker = FaultTracker::new(FaultPolicy::default());
        bad_unit(&mut tracker, 0).unwrap();
        bad_unit(&mut tracker, 1).unwrap();
        tracker.record_total(2).unwrap();
        tracker.record_total(3).unwrap();
        assert!(tracker.record_total(4).is_err());
    }

    #[test]
    fn test_fault_without_total_keeps_invariant() {
        let mut tracker = FaultTracker::new(FaultPolicy::default());
        tracker.record_fault(&mismatch(), "x", 0).unwrap();
        let counts = tracker.counts();
        assert!(counts.bad <= counts.total);
    }

    #[test]
    fn test_sidecar_written_only_with_faults() {
        let dir = TempDir::new().unwrap();
        let sidecar = dir.path().join("dump.sql.bad_inserts.txt");

        let clean = FaultTracker::new(FaultPolicy::default());
        assert!(clean.finish(&sidecar).unwrap().is_none());
        assert!(!sidecar.exists());

        let mut tracker = FaultTracker::new(FaultPolicy::default());
        for i in 0..9 {
            tracker.record_total(i).unwrap();
        }
        bad_unit(&mut tracker, 42).unwrap();
        let written = tracker.finish(&sidecar).unwrap().unwrap();

        let content = std::fs::read_to_string(written).unwrap();
        assert!(content.starts_with("##### Insert Errors #####\nError rate: 10.00%"));
        assert!(content.contains("Fault #1 (statement ending at byte 42)"));
        assert!(content.contains("INSERT INTO users VALUES (1,2,3);"));
    }

    #[test]
    fn test_truncate_context() {
        assert_eq!(truncate_context("abc", 5), "abc");
        assert_eq!(truncate_context("ééééé", 2), format!("éé{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/data/dump.sql"), None),
            PathBuf::from("/data/dump.sql.bad_inserts.txt")
        );
        assert_eq!(
            sidecar_path(Path::new("/data/dump.sql"), Some(Path::new("/out"))),
            PathBuf::from("/out/dump.sql.bad_inserts.txt")
        );
    }
}
