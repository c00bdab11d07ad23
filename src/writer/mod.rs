//! Per-table CSV output.
//!
//! Every field is wrapped in double quotes. Embedded double quotes are
//! written as-is, carriage returns and newlines become the two-character
//! escapes `\r` and `\n`, so each row is exactly one physical line.

use crate::extractor::Compression;
use ahash::AHashMap;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;
pub const ROW_BUFFER_COUNT: usize = 100;

/// Render one CSV line, including the trailing newline.
pub fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push('"');
        for ch in field.as_ref().chars() {
            match ch {
                '\r' => line.push_str("\\r"),
                '\n' => line.push_str("\\n"),
                _ => line.push(ch),
            }
        }
        line.push('"');
    }
    line.push('\n');
    line
}

/// `<input stem>.<table>.csv`, with any compression extension stripped
/// before the stem is taken.
pub fn output_file_name(input: &Path, table_name: &str) -> String {
    let base = match Compression::from_path(input) {
        Compression::None => input.file_name(),
        _ => input.file_stem(),
    };
    let base = base
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dump".to_string());

    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base.as_str(),
    };

    let table: String = table_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();

    format!("{}.{}.csv", stem, table)
}

/// Output path for a table, next to the input unless `output_dir` is given.
pub fn output_path(input: &Path, output_dir: Option<&Path>, table_name: &str) -> PathBuf {
    let name = output_file_name(input, table_name);
    match output_dir.or_else(|| input.parent()) {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Buffered CSV writer for one table
pub struct CsvWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    encoding: &'static Encoding,
    header_written: bool,
    rows_written: u64,
    write_count: usize,
    max_row_buffer: usize,
}

impl CsvWriter {
    /// Create (truncating) the file at `path`. Text is encoded with the
    /// output form of `encoding`.
    pub fn new(path: &Path, encoding: &'static Encoding) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, file);

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            encoding: encoding.output_encoding(),
            header_written: false,
            rows_written: 0,
            write_count: 0,
            max_row_buffer: ROW_BUFFER_COUNT,
        })
    }

    /// Write the header line. Only the first call has any effect, and only
    /// before any row was written.
    pub fn write_header<S: AsRef<str>>(&mut self, columns: &[S]) -> std::io::Result<()> {
        if self.header_written || self.rows_written > 0 {
            return Ok(());
        }
        self.write_line(&csv_line(columns))?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_row<I, S>(&mut self, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_line(&csv_line(fields))?;
        self.rows_written += 1;

        self.write_count += 1;
        if self.write_count >= self.max_row_buffer {
            self.write_count = 0;
            self.writer.flush()?;
        }

        Ok(())
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let (bytes, _, _) = self.encoding.encode(line);
        self.writer.write_all(&bytes)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.write_count = 0;
        self.writer.flush()
    }
}

/// Lazily opened CSV writers for all tables of one input file
pub struct WriterPool {
    input_path: PathBuf,
    output_dir: Option<PathBuf>,
    encoding: &'static Encoding,
    writers: AHashMap<String, CsvWriter>,
}

impl WriterPool {
    pub fn new(input_path: &Path, output_dir: Option<PathBuf>, encoding: &'static Encoding) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            output_dir,
            encoding,
            writers: AHashMap::new(),
        }
    }

    pub fn is_open(&self, table_name: &str) -> bool {
        self.writers.contains_key(table_name)
    }

    /// Get the writer for a table, creating its file on first use.
    pub fn open_for_table(&mut self, table_name: &str) -> std::io::Result<&mut CsvWriter> {
        use std::collections::hash_map::Entry;

        match self.writers.entry(table_name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = output_path(&self.input_path, self.output_dir.as_deref(), table_name);
                let writer = CsvWriter::new(&path, self.encoding)?;
                Ok(entry.insert(writer))
            }
        }
    }

    pub fn write_row<I, S>(&mut self, table_name: &str, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let writer = self.open_for_table(table_name)?;
        writer.write_row(fields)
    }

    /// Paths of all files written so far, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.writers.values().map(|w| w.path.clone()).collect();
        paths.sort();
        paths
    }

    pub fn close_all(&mut self) -> std::io::Result<()> {
        for (_, writer) in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_line_quotes_every_field() {
        assert_eq!(csv_line(["1", "", "a,b"]), "\"1\",\"\",\"a,b\"\n");
    }

    #[test]
    fn test_csv_line_escapes_line_breaks() {
        assert_eq!(csv_line(["a\r\nb"]), "\"a\\r\\nb\"\n");
    }

    #[test]
    fn test_csv_line_keeps_single_embedded_quote() {
        assert_eq!(csv_line(["say \"hi\""]), "\"say \"hi\"\"\n");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(Path::new("/d/dump.sql"), "users"), "dump.users.csv");
        assert_eq!(output_file_name(Path::new("dump.sql.gz"), "users"), "dump.users.csv");
        assert_eq!(output_file_name(Path::new("dump"), "users"), "dump.users.csv");
        assert_eq!(
            output_file_name(Path::new("site.2024.sql"), "a/b"),
            "site.2024.a_b.csv"
        );
    }

    #[test]
    fn test_output_path_override() {
        assert_eq!(
            output_path(Path::new("/in/dump.sql"), Some(Path::new("/out")), "t"),
            PathBuf::from("/out/dump.t.csv")
        );
        assert_eq!(
            output_path(Path::new("/in/dump.sql"), None, "t"),
            PathBuf::from("/in/dump.t.csv")
        );
    }
}
