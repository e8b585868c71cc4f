use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepprd::cli::Output;
use deepprd::cli::commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "deepprd")]
#[command(
    version,
    about = "Streaming system requirements document generator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long, help = "Listen address (overrides server.bind)")]
        bind: Option<String>,
    },

    /// Generate a document locally and stream it to stdout
    Generate {
        #[arg(long, short, help = "Document topic")]
        theme: String,
        #[arg(long = "raw", help = "Raw requirements document (repeatable)")]
        raw_requirements: Vec<PathBuf>,
        #[arg(long = "visual", help = "Prototype or diagram image (repeatable)")]
        visuals: Vec<PathBuf>,
        #[arg(long = "tech", help = "Technical context document (repeatable)")]
        tech_context: Vec<PathBuf>,
        #[arg(long, short, help = "Save the document to this file")]
        output: Option<PathBuf>,
        #[arg(long, conflicts_with = "output", help = "Save as '<theme>.md'")]
        save: bool,
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
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
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
        eprintln!("\x1b[31mDeepPRD encountered an unexpected error:\x1b[0m");
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
            Output::new().error(&format!("Error: {:#}", e));
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

    match cli.command {
        Commands::Serve { bind } => {
            let rt = Runtime::new()?;
            rt.block_on(deepprd::cli::commands::serve::run(bind))?;
        }
        Commands::Generate {
            theme,
            raw_requirements,
            visuals,
            tech_context,
            output,
            save,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(deepprd::cli::commands::generate::run(GenerateOptions {
                theme,
                raw_requirements,
                visuals,
                tech_context,
                output,
                save,
            }))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                deepprd::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                deepprd::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                deepprd::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
