// cdrecon - CDR exception reconciliation between two carriers

mod exit_codes;
mod recon;
mod report;
mod util;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cdrecon_engine::config::MTN_OCM_TEMPLATE;
use cdrecon_engine::{summary_stats, top_groups, DEFAULT_TOP_LIMIT};
use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_RECON_LOAD, EXIT_SUCCESS, EXIT_USAGE};
use recon::ReconCommands;

#[derive(Parser)]
#[command(name = "cdrecon")]
#[command(about = "Reconcile call detail records between two carriers")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Recon(ReconCommands),

    /// Rank callers in a single CDR file by call count
    #[command(after_help = "\
Examples:
  cdrecon top mtn.csv --key A_NUMBER --measure CALL_DURATION
  cdrecon top ocm.csv --key a_number --measure duration --delimiter ';' --encoding latin1
  cdrecon top ocm.csv --key a_number --measure duration --limit 5 --json")]
    Top {
        /// Delimited CDR file
        file: PathBuf,

        /// Column to group by
        #[arg(long)]
        key: String,

        /// Numeric column to sum per group
        #[arg(long)]
        measure: String,

        /// Number of groups to keep
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,

        /// Field delimiter (sniffed when omitted)
        #[arg(long)]
        delimiter: Option<char>,

        /// Fallback text encoding when the file is not UTF-8 (e.g. latin1)
        #[arg(long)]
        encoding: Option<String>,

        /// Carrier name used in messages (defaults to the file stem)
        #[arg(long)]
        carrier: Option<String>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a starter recon config for the MTN/OCM pair
    #[command(after_help = "\
Examples:
  cdrecon template > recon.toml
  cdrecon template -o recon.toml")]
    Template {
        /// Write to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")",
        "\nengine:  cdrecon-engine ",
        env!("CARGO_PKG_VERSION"),
        "\ntarget:  ",
        env!("TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recon(cmd) => recon::cmd_recon(cmd),
        Commands::Top {
            file,
            key,
            measure,
            limit,
            delimiter,
            encoding,
            carrier,
            json,
        } => cmd_top(file, key, measure, limit, delimiter, encoding, carrier, json),
        Commands::Template { output } => cmd_template(output),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_top(
    file: PathBuf,
    key: String,
    measure: String,
    limit: usize,
    delimiter: Option<char>,
    encoding: Option<String>,
    carrier: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    if limit == 0 {
        return Err(CliError::args("--limit must be at least 1"));
    }
    let delimiter = match delimiter {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => {
            return Err(CliError::args(format!(
                "delimiter must be a single ASCII character, got {c:?}"
            )))
        }
        None => None,
    };
    if !file.exists() {
        return Err(CliError::args(format!("file not found: {}", file.display())));
    }
    let carrier = carrier.unwrap_or_else(|| file_stem(&file));

    let dataset = cdrecon_io::csv::load_dataset(&file, &carrier, delimiter, encoding.as_deref())
        .map_err(|e| CliError { code: EXIT_RECON_LOAD, message: e, hint: None })?;

    let engine_err = |e: cdrecon_engine::ReconError| {
        let hint = match &e {
            cdrecon_engine::ReconError::MissingColumn { .. } => {
                Some(format!("available columns: {}", dataset.columns.join(", ")))
            }
            _ => None,
        };
        CliError { code: recon_exit_code(&e), message: e.to_string(), hint }
    };
    let table = top_groups(&dataset, &key, &measure, limit).map_err(engine_err)?;
    let totals = summary_stats(&dataset, &measure).map_err(engine_err)?;

    if json {
        let value = serde_json::json!({
            "carrier": carrier,
            "totals": totals,
            "top": table,
        });
        let out = serde_json::to_string_pretty(&value).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{out}");
    } else {
        println!("{}", report::render_totals(&carrier, &totals));
        print!("{}", report::render_top_table(&table));
    }
    Ok(())
}

fn cmd_template(output: Option<PathBuf>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            std::fs::write(&path, MTN_OCM_TEMPLATE).map_err(|e| CliError {
                code: EXIT_ERROR,
                message: format!("cannot write {}: {e}", path.display()),
                hint: None,
            })?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{MTN_OCM_TEMPLATE}"),
    }
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string())
}
