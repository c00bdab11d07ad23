mod extract;
mod glob_util;
mod mover;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqldump-extract")]
#[command(version)]
#[command(
    about = "Extract the rows of SQL dump files into one CSV file per table",
    long_about = None
)]
pub struct Cli {
    /// Dump files or glob patterns (e.g., dumps/*.sql, backups/**/*.sql.gz)
    /// Supports .gz, .bz2, .xz, .zst compression
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Only extract tables matching this regex; a `<prefix>_` in front of
    /// the table name is tolerated (e.g. "users?" matches forum_users)
    #[arg(short, long)]
    pub tables: Option<String>,

    /// Force the input encoding (e.g. utf-8, latin1, windows-1251)
    #[arg(short, long)]
    pub encoding: Option<String>,

    /// SQL dialect: auto, mysql or postgres
    #[arg(short, long, default_value = "auto")]
    pub dialect: String,

    /// Directory for CSV files (default: next to each input file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Move successfully processed input files into this directory
    #[arg(long)]
    pub completed: Option<PathBuf>,

    /// Move input files that failed into this directory
    #[arg(long)]
    pub failed: Option<PathBuf>,

    /// Stop at the first file that fails
    #[arg(long)]
    pub exit_on_error: bool,

    /// Show progress during processing
    #[arg(short, long)]
    pub progress: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    extract::run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "sqldump-extract",
            "-t",
            "users?",
            "--dialect",
            "postgres",
            "--exit-on-error",
            "a.sql",
            "b.sql.gz",
        ])
        .unwrap();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.tables.as_deref(), Some("users?"));
        assert_eq!(cli.dialect, "postgres");
        assert!(cli.exit_on_error);
        assert!(cli.completed.is_none());
    }

    #[test]
    fn test_files_required() {
        assert!(Cli::try_parse_from(["sqldump-extract"]).is_err());
    }
}
