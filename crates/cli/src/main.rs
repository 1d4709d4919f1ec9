// Conciliador CLI - Depreciação Acumulada x SIAFI, headless
//
// run      pair report PDFs with SIAFI sheets and reconcile every unit
// inspect  run a single extractor and print its group balances
// prepare  MATRIZ lookup and tab split for SIAFI workbooks
// validate parse and validate a config file without running

mod exit_codes;
mod inspect;
mod prepare;
mod run;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use conciliador_recon::config::Config;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "concil")]
#[command(about = "Conciliação Depreciação Acumulada x SIAFI (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair report PDFs with SIAFI sheets and reconcile every unit
    #[command(after_help = "\
Examples:
  concil run balancetes/
  concil run Relatorio_160001.pdf Siafi_160001.csv
  concil run balancetes/ --report /tmp/consolidado.pdf --json
  concil run balancetes/ --config concil.toml --output result.json")]
    Run {
        /// Files and/or directories (scanned one level for .pdf/.xlsx/.csv)
        paths: Vec<PathBuf>,

        /// TOML config file (tolerance, ledger header label)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Consolidated report PDF path
        #[arg(long, default_value = conciliador_io::report::REPORT_FILE_NAME)]
        report: PathBuf,

        /// Output JSON to stdout instead of the summary table
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Suppress progress notes on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Extract per-group balances from a single file
    #[command(after_help = "\
Examples:
  concil inspect Relatorio_160001.pdf
  concil inspect Siafi_160001.csv --json
  concil inspect Siafi_160001.xlsx --config concil.toml")]
    Inspect {
        /// Report PDF or SIAFI sheet (.pdf/.xlsx/.csv)
        file: PathBuf,

        /// TOML config file (ledger header label)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON instead of the aligned table
        #[arg(long)]
        json: bool,
    },

    /// Prepare a SIAFI workbook against the MATRIZ base and split its tabs
    #[command(after_help = "\
Examples:
  concil prepare Base_UG.xlsx --matriz MATRIZ.xlsx
  concil prepare Base_UG.xlsx --matriz MATRIZ.xlsx --workbook saida.xlsx --zip abas.zip")]
    Prepare {
        /// Multi-sheet SIAFI workbook, one tab per management unit
        target: PathBuf,

        /// Two-column MATRIZ lookup workbook (account code -> Nat Desp)
        #[arg(long)]
        matriz: PathBuf,

        /// Consolidated workbook output path
        #[arg(long, default_value = conciliador_io::prepare::CONSOLIDATED_FILE_NAME)]
        workbook: PathBuf,

        /// Zip archive output path (one workbook per tab)
        #[arg(long, default_value = conciliador_io::prepare::ARCHIVE_FILE_NAME)]
        zip: PathBuf,

        /// Suppress progress notes on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Parse and validate a config file without running
    #[command(after_help = "\
Examples:
  concil validate --config concil.toml")]
    Validate {
        /// TOML config file
        #[arg(long)]
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  conciliador-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
            "\ncontract_version(run): 1",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  conciliador-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
            "\ncontract_version(run): 1",
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: concil <command> [options]");
            eprintln!("       concil --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            paths,
            config,
            report,
            json,
            output,
            quiet,
        }) => run::cmd_run(paths, config, report, json, output, quiet),
        Some(Commands::Inspect { file, config, json }) => inspect::cmd_inspect(file, config, json),
        Some(Commands::Prepare {
            target,
            matriz,
            workbook,
            zip,
            quiet,
        }) => prepare::cmd_prepare(target, matriz, workbook, zip, quiet),
        Some(Commands::Validate { config }) => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
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
    pub fn usage(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: msg.into(),
            hint: None,
        }
    }

    /// I/O and other environment failures share the general code.
    pub fn io(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_ERROR,
            message: msg.into(),
            hint: None,
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Load the optional TOML config; house defaults when absent.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    match path {
        None => Ok(Config::default()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| CliError::usage(format!("cannot read {}: {}", path.display(), e)))?;
            Config::from_toml(&text).map_err(|e| {
                CliError::usage(format!("{}: {}", path.display(), e)).with_hint(
                    "expected [reconciliation] tolerance and/or [ledger] header_label",
                )
            })
        }
    }
}

fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let loaded = load_config(Some(&config))?;
    println!(
        "{}: ok (tolerance {}, header_label {:?})",
        config.display(),
        loaded.reconciliation.tolerance,
        loaded.ledger.header_label
    );
    Ok(())
}
