//! quizforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizforge", version, about = "AI quiz scoring and generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a submission against an application file
    Score {
        /// Path to the application JSON file (app info, questions, tiers)
        #[arg(long)]
        app: PathBuf,

        /// Submitted choices, one key per question (e.g. "A,B,A")
        #[arg(long, value_delimiter = ',')]
        choices: Vec<String>,

        /// Provider to use (defaults to the configured default)
        #[arg(long)]
        provider: Option<String>,

        /// Model to use (defaults to the configured default)
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate questions for an application
    Generate {
        /// Path to the application JSON file
        #[arg(long)]
        app: PathBuf,

        /// Number of questions to generate
        #[arg(long, default_value = "10")]
        questions: u32,

        /// Number of options per question
        #[arg(long, default_value = "4")]
        options: u32,

        /// Stream items as they complete instead of waiting for the full set
        #[arg(long)]
        stream: bool,

        /// Provider to use (defaults to the configured default)
        #[arg(long)]
        provider: Option<String>,

        /// Model to use (defaults to the configured default)
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example application file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            app,
            choices,
            provider,
            model,
            config,
        } => commands::score::execute(app, choices, provider, model, config).await,
        Commands::Generate {
            app,
            questions,
            options,
            stream,
            provider,
            model,
            config,
        } => commands::generate::execute(app, questions, options, stream, provider, model, config)
            .await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
