//! agentlab CLI: the main entry point.
//!
//! Commands:
//! - `ask`      Answer a single request
//! - `chat`     Interactive session over stdin
//! - `history`  Show a session's stored turns
//! - `clear`    Delete a session's stored turns
//! - `tools`    List the tools the controller can call
//! - `config`   Show the effective configuration
//! - `doctor`   Check that the generator and history store are reachable

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "agentlab",
    about = "agentlab: a ReAct reasoning controller for small local models",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single request
    Ask {
        /// Conversation session to read and extend
        #[arg(short, long, default_value = "default")]
        session: String,

        /// The request text
        message: String,
    },

    /// Chat interactively; type 'exit' to quit
    Chat {
        #[arg(short, long, default_value = "default")]
        session: String,
    },

    /// Show the stored turns of a session
    History {
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Most recent turns to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Delete every stored turn of a session
    Clear {
        #[arg(short, long, default_value = "default")]
        session: String,
    },

    /// List available tools
    Tools,

    /// Show the effective configuration
    Config {
        /// Print the config file path instead
        #[arg(long)]
        path: bool,

        /// Print the built-in defaults instead
        #[arg(long)]
        defaults: bool,
    },

    /// Check that the generator and history store are reachable
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask { session, message } => commands::ask::run(&session, &message).await?,
        Commands::Chat { session } => commands::chat::run(&session).await?,
        Commands::History { session, limit } => commands::history::show(&session, limit).await?,
        Commands::Clear { session } => commands::history::clear(&session).await?,
        Commands::Tools => commands::tools::list()?,
        Commands::Config { path, defaults } => commands::config_cmd::show(path, defaults)?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
