use super::glob_util::{expand_file_patterns, MultiFileResult};
use super::mover::move_into;
use super::Cli;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sqldump_extract::encoding::lookup_encoding;
use sqldump_extract::error::ExtractError;
use sqldump_extract::extractor::{ExtractStats, Extractor, FileOutcome};
use sqldump_extract::filter::TableFilter;
use sqldump_extract::parser::SqlDialect;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// JSON output for a run
#[derive(Serialize)]
struct RunJsonOutput {
    total_files: usize,
    succeeded: usize,
    failed: usize,
    elapsed_secs: f64,
    results: Vec<FileJsonResult>,
}

#[derive(Serialize)]
struct FileJsonResult {
    file: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<FileStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    moved_to: Option<String>,
}

#[derive(Serialize)]
struct FileStatistics {
    encoding: String,
    total_tables: usize,
    total_inserts: u64,
    total_values: u64,
    total_faults: u64,
    total_statements: u64,
    bytes_processed: u64,
    elapsed_secs: f64,
    tables: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tables_without_header: Vec<String>,
    output_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics_file: Option<String>,
}

impl FileStatistics {
    fn new(stats: &ExtractStats, elapsed_secs: f64) -> Self {
        Self {
            encoding: stats.encoding.clone(),
            total_tables: stats.total_tables,
            total_inserts: stats.total_inserts,
            total_values: stats.total_values,
            total_faults: stats.total_faults,
            total_statements: stats.total_statements,
            bytes_processed: stats.bytes_processed,
            elapsed_secs,
            tables: stats.tables.clone(),
            tables_without_header: stats.tables_without_header.clone(),
            output_files: stats
                .output_files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            diagnostics_file: stats.sidecar.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Settings shared by every file of a run
struct RunSettings {
    dialect: SqlDialect,
    table_filter: TableFilter,
    encoding: Option<String>,
    output: Option<PathBuf>,
    progress: bool,
    json: bool,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let files = expand_file_patterns(&cli.files)?;

    let dialect: SqlDialect = cli
        .dialect
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let table_filter = TableFilter::from_option(cli.tables.as_deref())
        .map_err(|e| anyhow::anyhow!("invalid --tables pattern: {}", e))?;
    if let Some(label) = &cli.encoding {
        if lookup_encoding(label).is_none() {
            anyhow::bail!("unknown encoding: {}", label);
        }
    }

    let settings = RunSettings {
        dialect,
        table_filter,
        encoding: cli.encoding.clone(),
        output: cli.output.clone(),
        progress: cli.progress && !cli.json,
        json: cli.json,
    };

    let total = files.len();
    let mut result = MultiFileResult::new(total);
    let mut json_results = Vec::with_capacity(total);
    let start_time = Instant::now();

    for (idx, file) in files.iter().enumerate() {
        if !settings.json && total > 1 {
            println!("[{}/{}] {}", idx + 1, total, file.display());
        }

        let file_start = Instant::now();
        let extracted = extract_file(file, &settings);
        let elapsed = file_start.elapsed();
        let outcome = FileOutcome::from_result(&extracted);

        let destination = if outcome.is_success() {
            cli.completed.as_deref()
        } else {
            cli.failed.as_deref()
        };
        let moved_to = destination.and_then(|dir| match move_into(file, dir) {
            Ok(target) => Some(target),
            Err(e) => {
                eprintln!("Warning: {}", e);
                None
            }
        });

        match &extracted {
            Ok(stats) => {
                if !settings.json {
                    print_success(stats, elapsed.as_secs_f64());
                }
                json_results.push(FileJsonResult {
                    file: file.display().to_string(),
                    status: "success".to_string(),
                    statistics: Some(FileStatistics::new(stats, elapsed.as_secs_f64())),
                    error: None,
                    moved_to: moved_to.map(|p| p.display().to_string()),
                });
                result.record_success();
            }
            Err(e) => {
                if !settings.json {
                    eprintln!("Error processing {}: {}", file.display(), e);
                }
                json_results.push(FileJsonResult {
                    file: file.display().to_string(),
                    status: "failed".to_string(),
                    statistics: None,
                    error: Some(e.to_string()),
                    moved_to: moved_to.map(|p| p.display().to_string()),
                });
                result.record_failure(file.clone(), e.to_string());
                if cli.exit_on_error {
                    break;
                }
            }
        }
    }

    let elapsed = start_time.elapsed();

    if settings.json {
        let output_json = RunJsonOutput {
            total_files: total,
            succeeded: result.succeeded,
            failed: result.failed,
            elapsed_secs: elapsed.as_secs_f64(),
            results: json_results,
        };
        println!("{}", serde_json::to_string_pretty(&output_json)?);
    } else if total > 1 {
        println!();
        println!("Summary:");
        println!("  Total files: {}", result.total_files);
        println!("  Succeeded: {}", result.succeeded);
        println!("  Failed: {}", result.failed);
        println!("  Time: {:.3?}", elapsed);
    }

    if cli.exit_on_error {
        if let Some((path, error)) = result.errors.first() {
            anyhow::bail!("stopped after failure in {}: {}", path.display(), error);
        }
    }
    if result.has_failures() {
        anyhow::bail!("{} of {} file(s) failed", result.failed, total);
    }

    Ok(())
}

fn extract_file(file: &Path, settings: &RunSettings) -> Result<ExtractStats, ExtractError> {
    let mut extractor = Extractor::new(file.to_path_buf())
        .with_dialect(settings.dialect)
        .with_table_filter(settings.table_filter.clone())
        .with_encoding(settings.encoding.clone())
        .with_output_dir(settings.output.clone());

    if !settings.progress {
        return extractor.extract();
    }

    let file_size = std::fs::metadata(file)?.len();
    let pb = ProgressBar::new(file_size);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
    ) {
        pb.set_style(
            style
                .progress_chars("█▓▒░  ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let pb_clone = pb.clone();
    extractor = extractor.with_progress(move |bytes| pb_clone.set_position(bytes));

    let result = extractor.extract();
    if result.is_ok() {
        pb.finish_with_message("done");
    } else {
        pb.abandon_with_message("failed");
    }
    result
}

fn print_success(stats: &ExtractStats, elapsed_secs: f64) {
    println!(
        "Processed {} table(s), {} value line(s)",
        stats.total_tables, stats.total_values
    );
    if stats.total_faults > 0 {
        println!(
            "  Skipped {} bad statement(s){}",
            stats.total_faults,
            stats
                .sidecar
                .as_ref()
                .map(|p| format!(", see {}", p.display()))
                .unwrap_or_default()
        );
    }
    tracing::debug!(
        encoding = %stats.encoding,
        statements = stats.total_statements,
        bytes = stats.bytes_processed,
        elapsed_secs,
        "file statistics"
    );
}
