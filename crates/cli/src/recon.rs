//! `cdrecon run` / `cdrecon validate`: config-driven carrier reconciliation.

use std::path::{Path, PathBuf};

use cdrecon_engine::model::{CarrierReport, Dataset, ReconInput};
use cdrecon_engine::ReconConfig;
use clap::{Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::exit_codes::{
    recon_exit_code, EXIT_EXPORT_EXCEPTIONS, EXIT_EXPORT_REPORT, EXIT_RECON_EXCEPTIONS,
    EXIT_RECON_INVALID_CONFIG, EXIT_RECON_LOAD, EXIT_USAGE,
};
use crate::report;
use crate::CliError;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile the configured carrier pair
    #[command(after_help = "\
Examples:
  cdrecon run recon.toml
  cdrecon run recon.toml --json
  cdrecon run recon.toml --output report.json
  cdrecon run recon.toml --export-dir out/
  cdrecon run recon.toml --export-dir out/ --export-format csv
  cdrecon run recon.toml --sample 5 --seed 42")]
    Run {
        /// Path to the recon TOML config
        config: PathBuf,

        /// Output JSON to stdout instead of the human report
        #[arg(long)]
        json: bool,

        /// Write JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write each carrier's exceptions as exceptions_<CARRIER>.<ext> here
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,

        /// Format for exported exception files
        #[arg(long, value_enum, default_value = "xlsx")]
        export_format: ExportFormat,

        /// Show N random rows of each carrier, as loaded and among its exceptions
        #[arg(long, value_name = "N")]
        sample: Option<usize>,

        /// Seed for --sample (random when omitted)
        #[arg(long, requires = "sample")]
        seed: Option<u64>,

        /// Exit with code 7 when either carrier has exceptions
        #[arg(long)]
        fail_on_exceptions: bool,
    },

    /// Validate a recon config without loading any data
    #[command(after_help = "\
Examples:
  cdrecon validate recon.toml")]
    Validate {
        /// Path to the recon TOML config
        config: PathBuf,
    },
}

pub struct RunOptions {
    pub json: bool,
    pub output: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub export_format: ExportFormat,
    pub sample: Option<usize>,
    pub seed: Option<u64>,
    pub fail_on_exceptions: bool,
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run {
            config,
            json,
            output,
            export_dir,
            export_format,
            sample,
            seed,
            fail_on_exceptions,
        } => cmd_recon_run(
            config,
            RunOptions {
                json,
                output,
                export_dir,
                export_format,
                sample,
                seed,
                fail_on_exceptions,
            },
        ),
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        recon_err(EXIT_USAGE, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    ReconConfig::from_toml(&config_str).map_err(|e| {
        recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string())
            .with_hint("run `cdrecon template` for a working example")
    })
}

/// Load every carrier the pair needs. Paths resolve relative to the config file.
fn load_input(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, CliError> {
    let mut input = ReconInput::new();
    for name in [&config.pair.left, &config.pair.right] {
        let carrier = config
            .carrier(name)
            .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;
        let path = base_dir.join(&carrier.file);
        log::debug!("{}: loading {}", name, path.display());
        if !path.exists() {
            return Err(recon_err(
                EXIT_RECON_LOAD,
                format!("{}: file not found: {}", name, path.display()),
            )
            .with_hint("carrier file paths are relative to the config file"));
        }
        let dataset = cdrecon_io::csv::load_dataset(
            &path,
            name,
            carrier.delimiter_byte(),
            carrier.encoding.as_deref(),
        )
        .map_err(|e| recon_err(EXIT_RECON_LOAD, e))?;
        input.insert(dataset);
    }
    Ok(input)
}

fn cmd_recon_run(config_path: PathBuf, opts: RunOptions) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let input = load_input(&config, base_dir)?;
    let result = cdrecon_engine::run(&config, &input)
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| recon_err(EXIT_EXPORT_REPORT, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = opts.output {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_EXPORT_REPORT, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if opts.json {
        println!("{json_str}");
    } else {
        print!("{}", report::render_report(&result));
    }

    if let Some(n) = opts.sample {
        let mut rng: Box<dyn RngCore> = match opts.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(rand::thread_rng()),
        };
        for side in [&result.left, &result.right] {
            if let Some(loaded) = input.datasets.get(&side.carrier) {
                let picked = loaded.sample(n, &mut *rng);
                eprintln!(
                    "sample of {} ({} of {}):",
                    side.carrier,
                    picked.len(),
                    loaded.len()
                );
                eprint!("{}", report::render_sample(&picked));
            }
            let picked = side.exceptions.sample(n, &mut *rng);
            eprintln!(
                "sample of {} exceptions ({} of {}):",
                side.carrier,
                picked.len(),
                side.exceptions.len()
            );
            eprint!("{}", report::render_sample(&picked));
        }
    }

    if let Some(ref dir) = opts.export_dir {
        let delimiter = |side: &CarrierReport| {
            config
                .carriers
                .get(&side.carrier)
                .and_then(|c| c.delimiter_byte())
                .unwrap_or(b',')
        };
        for side in [&result.left, &result.right] {
            let path =
                export_exceptions(&side.exceptions, dir, opts.export_format, delimiter(side))?;
            eprintln!("wrote {}", path.display());
        }
    }

    // Human summary to stderr
    let (left, right) = (&result.left, &result.right);
    eprintln!(
        "{}: {} {} exceptions, {} {} exceptions; {}",
        result.meta.config_name,
        left.exception_totals.row_count,
        left.carrier,
        right.exception_totals.row_count,
        right.carrier,
        report::gap_sentence(&result.gap),
    );

    if opts.fail_on_exceptions && !(left.exceptions.is_empty() && right.exceptions.is_empty()) {
        return Err(recon_err(EXIT_RECON_EXCEPTIONS, "exceptions found"));
    }

    Ok(())
}

/// Write one carrier's exceptions as `exceptions_<CARRIER>.<ext>` under `dir`.
fn export_exceptions(
    exceptions: &Dataset,
    dir: &Path,
    format: ExportFormat,
    delimiter: u8,
) -> Result<PathBuf, CliError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        recon_err(EXIT_EXPORT_EXCEPTIONS, format!("cannot create {}: {e}", dir.display()))
    })?;
    let path = dir.join(cdrecon_io::exception_file_name(
        &exceptions.carrier,
        format.extension(),
    ));
    let written = match format {
        ExportFormat::Xlsx => cdrecon_io::xlsx::export_dataset(exceptions, &path),
        ExportFormat::Csv => cdrecon_io::csv::export(exceptions, &path, delimiter),
    };
    written.map_err(|e| recon_err(EXIT_EXPORT_EXCEPTIONS, e))?;
    Ok(path)
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: recon '{}' with {} carrier(s), pair {} vs {}, top {}",
        config.name,
        config.carriers.len(),
        config.pair.left,
        config.pair.right,
        config.top_limit,
    );
    Ok(())
}
