//! Dossier CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write default config and sample data
//! - `tools`    — List the tools a client can call
//! - `call`     — Invoke a tool with JSON arguments
//! - `search`   — Search a domain's records
//! - `overdue`  — Past-due items of a domain
//! - `upcoming` — Items dated within the next N days
//! - `stats`    — A domain's statistics summary
//! - `status`   — Show configuration and store status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "dossier",
    about = "Dossier — structured record queries and reports for tool-calling clients",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pin the reference instant (YYYY-MM-DD or RFC 3339)
    #[arg(long, global = true)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default configuration and JSONL sample data
    Onboard {
        /// Overwrite existing sample data files
        #[arg(long)]
        force: bool,
    },

    /// List available tools
    Tools {
        /// Also print each tool's parameter schema
        #[arg(long)]
        schema: bool,
    },

    /// Call a tool by name
    Call {
        /// Tool name (see `dossier tools`)
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Print the full tool result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a domain's records
    Search {
        /// Domain name (legal, billing, veterinary)
        domain: String,

        /// Text to look for; omit to list everything
        query: Option<String>,

        /// Exact-match filter, `field=value` or `field=a,b`
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// List overdue items
    Overdue {
        domain: String,

        /// Only items assigned to this person
        #[arg(long)]
        assigned_to: Option<String>,
    },

    /// List items dated within the next N days
    Upcoming {
        domain: String,

        /// Days ahead to look (0 = today only)
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
    },

    /// Show a domain's statistics summary
    Stats { domain: String },

    /// Show configuration and store status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; reports own stdout.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let now = cli.now.as_deref();
    match cli.command {
        Commands::Onboard { force } => commands::onboard::run(now, force).await?,
        Commands::Tools { schema } => commands::tools::run(now, schema).await?,
        Commands::Call { tool, args, json } => commands::call::run(now, &tool, &args, json).await?,
        Commands::Search {
            domain,
            query,
            filters,
        } => commands::query::search(now, &domain, query.as_deref(), &filters).await?,
        Commands::Overdue {
            domain,
            assigned_to,
        } => commands::query::overdue(now, &domain, assigned_to.as_deref()).await?,
        Commands::Upcoming { domain, days } => commands::query::upcoming(now, &domain, days).await?,
        Commands::Stats { domain } => commands::query::stats(now, &domain).await?,
        Commands::Status => commands::status::run(now).await?,
    }

    Ok(())
}
