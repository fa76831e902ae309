use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::bail;
use clap::{Parser, Subcommand};
use rpcgen_cli::{DEFAULT_CONFIG, Project, output};
use rpcgen_codegen::{Target, TargetLanguage};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "rpcgen", about = "Generate typed client SDKs for exposed classes")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate every configured SDK.
    Generate {
        #[arg(long, default_value = DEFAULT_CONFIG, env = "RPCGEN_CONFIG")]
        config: PathBuf,

        /// Target language; replaces the `sdk` list of the config. Pair each
        /// with an `--output`.
        #[arg(short, long = "language")]
        languages: Vec<TargetLanguage>,

        #[arg(short, long = "output")]
        outputs: Vec<PathBuf>,

        /// Also write the exposed-method summary JSON here.
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Print the exposed-method summary JSON.
    Summary {
        #[arg(long, default_value = DEFAULT_CONFIG, env = "RPCGEN_CONFIG")]
        config: PathBuf,
    },

    /// Fill in the remote URL of an already generated SDK.
    Link {
        #[arg(long)]
        url: String,

        dir: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Generate {
            config,
            languages,
            outputs,
            summary,
        } => {
            if languages.len() != outputs.len() {
                bail!(
                    "{} --language flags but {} --output flags",
                    languages.len(),
                    outputs.len()
                );
            }
            let overrides: Vec<Target> = languages
                .into_iter()
                .zip(outputs)
                .map(|(language, dir)| Target::new(language, dir.to_string_lossy()))
                .collect();

            let project = Project::load(&config)?;
            let report = rpcgen_cli::generate(&project, &overrides, summary.as_deref())?;
            if !report.failures.is_empty() {
                bail!("{} of the inputs failed", report.failures.len());
            }
        }
        Command::Summary { config } => {
            let project = Project::load(&config)?;
            println!("{}", rpcgen_cli::summary(&project)?);
        }
        Command::Link { url, dir } => {
            let changed = output::link_dir(&dir, &url)?;
            tracing::info!(files = changed.len(), %url, "linked sdk");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
