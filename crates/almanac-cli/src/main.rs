use clap::{Parser, Subcommand};
use tracing::warn;

mod commands;
mod daemon;

#[derive(Parser)]
#[command(name = "almanac", version, about = "Personal calendar with event reminders")]
struct Cli {
    /// Config file (default: $ALMANAC_CONFIG, then ~/.almanac/almanac.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a new event
    Add(commands::AddArgs),
    /// Show the events on one date
    List(commands::ListArgs),
    /// Delete an event by position or id
    Delete(commands::DeleteArgs),
    /// Show the available categories
    Categories,
    /// Run the reminder loop until Ctrl-C
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "almanac=info,almanac_scheduler=info,almanac_calendar=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // explicit flag > ALMANAC_CONFIG env > ~/.almanac/almanac.toml
    let config_path = cli.config.or_else(|| std::env::var("ALMANAC_CONFIG").ok());
    let config = match almanac_core::config::AlmanacConfig::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) if config_path.is_none() => {
            warn!("Config load failed ({}), using defaults", e);
            almanac_core::config::AlmanacConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Commands::Add(args) => commands::add(&config, args),
        Commands::List(args) => commands::list(&config, args),
        Commands::Delete(args) => commands::delete(&config, args),
        Commands::Categories => commands::categories(&config),
        Commands::Run => daemon::run(&config).await,
    }
}
