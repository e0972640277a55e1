use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strata::cli::commands;
use strata::knowledge::KnowledgeTier;

/// Parse knowledge tier from string
fn parse_tier(s: &str) -> Result<KnowledgeTier, String> {
    s.parse()
}

/// Parse output format from string
fn parse_format(s: &str) -> Result<String, String> {
    match s.to_lowercase().as_str() {
        "text" | "json" => Ok(s.to_lowercase()),
        _ => Err(format!("Invalid format '{}'. Valid values: text, json", s)),
    }
}

#[derive(Parser)]
#[command(name = "strata")]
#[command(
    version,
    about = "Progressive, cache-aware project analysis with local or hosted models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Use only this config file")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize strata in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Quick ensemble scan of the whole project
    Quick {
        #[arg(long, short, help = "Model to use (default: models.quick)")]
        model: Option<String>,
    },

    /// Analyze every changed file (unchanged files come from the cache)
    Analyze {
        #[arg(long, short, help = "Worker count (default: analysis.workers)")]
        workers: Option<usize>,
        #[arg(long, short, help = "Model to use (default: models.detailed)")]
        model: Option<String>,
    },

    /// Generate knowledge documents for one tier
    Knowledge {
        #[arg(
            long,
            short,
            value_parser = parse_tier,
            default_value = "detailed",
            help = "Tier: quick, detailed, deep"
        )]
        tier: KnowledgeTier,
        #[arg(long, short, help = "Model to use (default: the tier's model)")]
        model: Option<String>,
    },

    /// Analyze a single file without touching the cache
    Explain {
        #[arg(help = "File to analyze")]
        file: PathBuf,
        #[arg(long, help = "Deadline in seconds (default: analysis.single_shot_timeout_secs)")]
        timeout: Option<u64>,
        #[arg(long, short, help = "Model to use (default: models.detailed)")]
        model: Option<String>,
    },

    /// Show project status
    Status {
        #[arg(
            short = 'f',
            long,
            value_parser = parse_format,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Clean up strata data
    Clean {
        #[arg(long, help = "Remove all strata data")]
        all: bool,
        #[arg(long, help = "Clear the analysis cache (default)")]
        cache: bool,
        #[arg(long, help = "Remove knowledge documents")]
        knowledge: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            value_parser = parse_format,
            default_value = "text",
            help = "Output format: text (TOML), json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mstrata encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Quick { model } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::quick::run(config, model.as_deref(), quiet))?;
        }
        Commands::Analyze { workers, model } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::analyze::run(
                config,
                workers,
                model.as_deref(),
                quiet,
            ))?;
        }
        Commands::Knowledge { tier, model } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::knowledge::run(
                config,
                tier,
                model.as_deref(),
                quiet,
            ))?;
        }
        Commands::Explain {
            file,
            timeout,
            model,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::explain::run(
                config,
                &file,
                timeout,
                model.as_deref(),
            ))?;
        }
        Commands::Status { format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::status::run(&format))?;
        }
        Commands::Clean {
            all,
            cache,
            knowledge,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::clean::run(all, cache, knowledge))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(config, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
