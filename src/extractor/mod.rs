//! Extraction orchestrator.
//!
//! Drives one input file through encoding resolution, statement assembly,
//! classification, filtering and tokenizing, and routes the resulting rows to
//! the per-table CSV writers. Recoverable faults go to the [`FaultTracker`];
//! everything else stops the file.

use crate::encoding::{resolve_encoding, DecodingReader, DEFAULT_ENCODING};
use crate::error::ExtractError;
use crate::faults::{sidecar_path, FaultPolicy, FaultTracker};
use crate::filter::TableFilter;
use crate::parser::{
    classify, parse_copy_row, parse_insert, RawStatement, SqlDialect, Statement,
    StatementReader, ValueTuple, READ_BUFFER_SIZE,
};
use crate::progress::ProgressReader;
use crate::schema::{parse_column_names, SchemaRegistry, SchemaSource, TableSchema};
use crate::writer::WriterPool;
use encoding_rs::Encoding;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Where the orchestrator is in the processing of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    DeterminingEncoding,
    Scanning,
    ProcessingCreateTable,
    ProcessingInsert,
    ProcessingCopyBlock,
    Finished,
    FatalAborted,
}

/// Per-file extraction results
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    /// Tables that received at least one row
    pub total_tables: usize,
    /// Accepted INSERT statements plus COPY blocks
    pub total_inserts: u64,
    /// CSV rows written
    pub total_values: u64,
    pub total_faults: u64,
    pub total_statements: u64,
    /// Decoded bytes consumed
    pub bytes_processed: u64,
    pub encoding: String,
    /// Tables in order of their first written row
    pub tables: Vec<String>,
    /// Tables written without a header line because no schema was known
    pub tables_without_header: Vec<String>,
    /// CSV files created, sorted
    pub output_files: Vec<PathBuf>,
    pub sidecar: Option<PathBuf>,
}

/// What the caller learns about one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Success {
        total_tables: usize,
        total_inserts: u64,
        total_values: u64,
    },
    Failure(String),
}

impl FileOutcome {
    pub fn from_result(result: &Result<ExtractStats, ExtractError>) -> Self {
        match result {
            Ok(stats) => FileOutcome::Success {
                total_tables: stats.total_tables,
                total_inserts: stats.total_inserts,
                total_values: stats.total_values,
            },
            Err(e) => FileOutcome::Failure(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success { .. })
    }
}

pub struct ExtractorConfig {
    pub dialect: SqlDialect,
    pub table_filter: TableFilter,
    /// Encoding label that bypasses detection
    pub forced_encoding: Option<String>,
    pub default_encoding: &'static Encoding,
    pub fault_policy: FaultPolicy,
    /// Directory for CSV and sidecar files; next to the input when `None`
    pub output_dir: Option<PathBuf>,
    pub buffer_size: usize,
    pub progress_fn: Option<Box<dyn Fn(u64)>>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            table_filter: TableFilter::all(),
            forced_encoding: None,
            default_encoding: DEFAULT_ENCODING,
            fault_policy: FaultPolicy::default(),
            output_dir: None,
            buffer_size: READ_BUFFER_SIZE,
            progress_fn: None,
        }
    }
}

pub struct Extractor {
    input_file: PathBuf,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(input_file: PathBuf) -> Self {
        Self {
            input_file,
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.config.dialect = dialect;
        self
    }

    pub fn with_table_filter(mut self, filter: TableFilter) -> Self {
        self.config.table_filter = filter;
        self
    }

    pub fn with_encoding(mut self, label: Option<String>) -> Self {
        self.config.forced_encoding = label;
        self
    }

    pub fn with_default_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.config.default_encoding = encoding;
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.config.fault_policy = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.output_dir = dir;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size.max(1);
        self
    }

    pub fn with_progress<F: Fn(u64) + 'static>(mut self, f: F) -> Self {
        self.config.progress_fn = Some(Box::new(f));
        self
    }

    pub fn extract(mut self) -> Result<ExtractStats, ExtractError> {
        let path = self.input_file.clone();
        let compression = Compression::from_path(&path);
        let sidecar = sidecar_path(&path, self.config.output_dir.as_deref());
        let mut phase = Phase::Idle;

        enter(&mut phase, Phase::DeterminingEncoding, &path);
        let encoding = resolve_encoding(
            &path,
            self.config.forced_encoding.as_deref(),
            self.config.default_encoding,
            || compression.wrap_reader(Box::new(File::open(&path)?)),
        )?;

        if let Some(dir) = &self.config.output_dir {
            fs::create_dir_all(dir)?;
        }
        match fs::remove_file(&sidecar) {
            Ok(()) => debug!(file = %sidecar.display(), "removed stale diagnostics file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = File::open(&path)?;
        let raw: Box<dyn Read> = match self.config.progress_fn.take() {
            Some(cb) => Box::new(ProgressReader::new(file, move |bytes| cb(bytes))),
            None => Box::new(file),
        };
        let decoded = DecodingReader::new(compression.wrap_reader(raw)?, encoding);
        let reader = BufReader::with_capacity(self.config.buffer_size, decoded);
        let mut statements = StatementReader::new(reader, self.config.dialect);

        let mut state = ExtractionState {
            path: &path,
            dialect: self.config.dialect,
            table_filter: &self.config.table_filter,
            schemas: SchemaRegistry::new(),
            writers: WriterPool::new(&path, self.config.output_dir.clone(), encoding),
            faults: FaultTracker::new(self.config.fault_policy).with_encoding(encoding),
            copy: None,
            stats: ExtractStats {
                encoding: encoding.name().to_string(),
                ..Default::default()
            },
            phase,
        };

        state.enter(Phase::Scanning);
        let scanned = state.scan(&mut statements);
        state.stats.bytes_processed = statements.offset();

        if let Err(e) = scanned {
            state.enter(Phase::FatalAborted);
            // Rows already accepted stay on disk
            if let Err(flush_err) = state.writers.close_all() {
                warn!(error = %flush_err, "failed to flush output after abort");
            }
            return Err(e);
        }

        state.writers.close_all()?;
        state.enter(Phase::Finished);

        let ExtractionState {
            faults,
            writers,
            mut stats,
            ..
        } = state;
        stats.output_files = writers.paths();
        stats.total_faults = faults.counts().bad;
        stats.total_tables = stats.tables.len();
        stats.sidecar = faults.finish(&sidecar)?;

        info!(
            file = %path.display(),
            tables = stats.total_tables,
            inserts = stats.total_inserts,
            values = stats.total_values,
            faults = stats.total_faults,
            "extraction finished"
        );
        Ok(stats)
    }
}

fn enter(phase: &mut Phase, next: Phase, path: &Path) {
    trace!(file = %path.display(), from = ?*phase, to = ?next, "phase change");
    *phase = next;
}

/// Table receiving the rows of the current COPY block
struct CopyTarget {
    table_name: String,
    column_names: Vec<String>,
    accepted: bool,
}

/// Mutable state owned by the extraction of one file
struct ExtractionState<'a> {
    path: &'a Path,
    dialect: SqlDialect,
    table_filter: &'a TableFilter,
    schemas: SchemaRegistry,
    writers: WriterPool,
    faults: FaultTracker,
    copy: Option<CopyTarget>,
    stats: ExtractStats,
    phase: Phase,
}

impl ExtractionState<'_> {
    fn enter(&mut self, next: Phase) {
        if self.phase != next {
            enter(&mut self.phase, next, self.path);
        }
    }

    fn scan<R: io::BufRead>(
        &mut self,
        statements: &mut StatementReader<R>,
    ) -> Result<(), ExtractError> {
        loop {
            let raw = match statements.next_statement() {
                Ok(Some(raw)) => raw,
                Ok(None) => return Ok(()),
                Err(ExtractError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(ExtractError::EncodingUndetermined {
                        path: self.path.to_path_buf(),
                        detail: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            };
            self.stats.total_statements += 1;
            self.dialect = statements.dialect();
            self.handle(&raw)?;
        }
    }

    fn handle(&mut self, raw: &RawStatement) -> Result<(), ExtractError> {
        match classify(raw) {
            Statement::CreateTable {
                table_name,
                body_text,
            } => {
                if !self.table_filter.matches(&table_name) {
                    return Ok(());
                }
                self.enter(Phase::ProcessingCreateTable);
                self.process_create_table(table_name, &body_text);
            }
            Statement::InsertInto {
                table_name,
                body_text,
            } => {
                if !self.table_filter.matches(&table_name) {
                    return Ok(());
                }
                self.enter(Phase::ProcessingInsert);
                self.process_insert(&table_name, &body_text, raw)?;
            }
            Statement::BulkCopyHeader {
                table_name,
                column_names,
            } => {
                self.enter(Phase::ProcessingCopyBlock);
                self.begin_copy(table_name, column_names);
                return Ok(());
            }
            Statement::BulkCopyRow { raw_fields } => {
                self.process_copy_row(&raw_fields, raw)?;
                return Ok(());
            }
            Statement::BulkCopyEnd => {
                if let Some(copy) = self.copy.take() {
                    debug!(table = %copy.table_name, "end of COPY block");
                }
            }
            Statement::Unrecognized => {
                trace!(offset = raw.end_offset, "skipping unrecognized statement");
                return Ok(());
            }
        }
        self.enter(Phase::Scanning);
        Ok(())
    }

    fn process_create_table(&mut self, table_name: String, body_text: &str) {
        let columns = parse_column_names(body_text);
        if columns.is_empty() {
            warn!(table = %table_name, "CREATE TABLE without readable columns");
            return;
        }
        debug!(table = %table_name, columns = columns.len(), "found table schema");
        if !self
            .schemas
            .register(TableSchema::new(table_name, columns, SchemaSource::CreateTable))
        {
            debug!("keeping earlier schema");
        }
    }

    fn process_insert(
        &mut self,
        table_name: &str,
        body_text: &str,
        raw: &RawStatement,
    ) -> Result<(), ExtractError> {
        self.faults.record_total(raw.end_offset)?;

        let insert = match parse_insert(body_text, self.dialect) {
            Ok(insert) => insert,
            Err(detail) => {
                let fault = ExtractError::MalformedValueTuple {
                    table: table_name.to_string(),
                    detail,
                };
                return self.faults.record_fault(&fault, &raw.text, raw.end_offset);
            }
        };

        if let Some(columns) = &insert.columns {
            if !self.schemas.contains(table_name) {
                debug!(table = %table_name, "schema taken from INSERT column list");
                self.schemas.register(TableSchema::new(
                    table_name,
                    columns.clone(),
                    SchemaSource::InsertColumns,
                ));
            }
        }

        let rows = match shape_rows(
            table_name,
            &insert.tuples,
            insert.columns.as_deref(),
            self.schemas.get(table_name),
        ) {
            Ok(rows) => rows,
            Err(fault) => return self.faults.record_fault(&fault, &raw.text, raw.end_offset),
        };

        self.write_rows(table_name, &rows)?;
        self.stats.total_inserts += 1;
        Ok(())
    }

    fn begin_copy(&mut self, table_name: String, column_names: Vec<String>) {
        let accepted = self.table_filter.matches(&table_name);
        if accepted {
            debug!(table = %table_name, "start of COPY block");
            if !column_names.is_empty() && !self.schemas.contains(&table_name) {
                self.schemas.register(TableSchema::new(
                    table_name.clone(),
                    column_names.clone(),
                    SchemaSource::CopyHeader,
                ));
            }
            self.stats.total_inserts += 1;
        }
        self.copy = Some(CopyTarget {
            table_name,
            column_names,
            accepted,
        });
    }

    fn process_copy_row(
        &mut self,
        raw_fields: &[String],
        raw: &RawStatement,
    ) -> Result<(), ExtractError> {
        let Some(copy) = self.copy.take() else {
            return Ok(());
        };
        if !copy.accepted {
            self.copy = Some(copy);
            return Ok(());
        }

        let result = self.write_copy_row(&copy, raw_fields, raw);
        self.copy = Some(copy);
        result
    }

    fn write_copy_row(
        &mut self,
        copy: &CopyTarget,
        raw_fields: &[String],
        raw: &RawStatement,
    ) -> Result<(), ExtractError> {
        self.faults.record_total(raw.end_offset)?;

        let tuples = [parse_copy_row(raw_fields)];
        let columns = (!copy.column_names.is_empty()).then_some(copy.column_names.as_slice());
        let rows = match shape_rows(
            &copy.table_name,
            &tuples,
            columns,
            self.schemas.get(&copy.table_name),
        ) {
            Ok(rows) => rows,
            Err(fault) => return self.faults.record_fault(&fault, &raw.text, raw.end_offset),
        };

        self.write_rows(&copy.table_name, &rows)
    }

    /// Write accepted rows, opening the table's file (and header) on first use.
    fn write_rows(&mut self, table_name: &str, rows: &[Vec<&str>]) -> Result<(), ExtractError> {
        if !self.writers.is_open(table_name) {
            let writer = self.writers.open_for_table(table_name)?;
            self.stats.tables.push(table_name.to_string());
            match self.schemas.get(table_name) {
                Some(schema) => writer.write_header(schema.column_names.as_slice())?,
                None => {
                    warn!(table = %table_name, "no schema found, writing CSV without header");
                    self.stats.tables_without_header.push(table_name.to_string());
                }
            }
        }

        for row in rows {
            self.writers.write_row(table_name, row.iter().copied())?;
        }
        self.stats.total_values += rows.len() as u64;
        Ok(())
    }
}

/// Validate tuple widths and lay values out in schema column order.
///
/// Any bad tuple rejects the whole batch, so nothing is written for a
/// statement that fails part way.
fn shape_rows<'v>(
    table_name: &str,
    tuples: &'v [ValueTuple],
    columns: Option<&[String]>,
    schema: Option<&TableSchema>,
) -> Result<Vec<Vec<&'v str>>, ExtractError> {
    let positions = match (columns, schema) {
        (Some(columns), Some(schema)) => Some(schema.column_positions(columns).map_err(
            |column| ExtractError::UnknownColumn {
                table: table_name.to_string(),
                column,
            },
        )?),
        _ => None,
    };

    let expected = match (columns, schema) {
        (Some(columns), _) => Some(columns.len()),
        (None, Some(schema)) => Some(schema.width()),
        (None, None) => None,
    };

    let mut rows = Vec::with_capacity(tuples.len());
    for tuple in tuples {
        if let Some(expected) = expected {
            if tuple.len() != expected {
                return Err(ExtractError::ColumnCountMismatch {
                    table: table_name.to_string(),
                    expected,
                    found: tuple.len(),
                });
            }
        }

        let row = match (&positions, schema) {
            (Some(positions), Some(schema)) => {
                let mut row = vec![""; schema.width()];
                for (value, &pos) in tuple.iter().zip(positions) {
                    row[pos] = value.as_field();
                }
                row
            }
            _ => tuple.iter().map(|v| v.as_field()).collect(),
        };
        rows.push(row);
    }

    Ok(rows)
}
