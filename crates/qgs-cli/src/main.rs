//! qgs-stable - keeps QGIS project files diff-stable under version control.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{canonicalize, check, normalize};

#[derive(Parser)]
#[command(name = "qgs-stable")]
#[command(about = "Rewrite QGIS project files in a canonical, diff-stable form")]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite project files in place
    Normalize {
        /// Project files (.qgs)
        #[arg(required = true)]
        files: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Skip fsync before replacing each file
        #[arg(long)]
        no_sync: bool,
    },
    /// Exit with an error if any project file is not canonical
    Check {
        /// Project files (.qgs)
        #[arg(required = true)]
        files: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the canonical form of a project
    Canonicalize {
        /// Input project file (or stdin if not provided)
        input: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Normalize {
            files,
            json,
            no_sync,
        } => normalize::run(files, json, !no_sync),
        Commands::Check { files, json } => check::run(files, json),
        Commands::Canonicalize { input } => canonicalize::run(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
