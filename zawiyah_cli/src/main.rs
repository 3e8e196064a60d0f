mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use zawiyah_lib::{initialize_services, AdapterKind, Settings};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "zawiyah")]
#[command(about = "Query Grand Zawiyah community data")]
struct Cli {
    /// Output format: table, json or csv
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,

    /// Force an adapter (mock or http) instead of choosing by ZAWIYAH_ENV
    #[arg(long, global = true)]
    adapter: Option<AdapterKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Health,
    /// List or look up users
    Users(commands::users::UsersArgs),
    /// List or look up donations
    Donations(commands::donations::DonationsArgs),
    /// List or look up fundraising campaigns
    Campaigns(commands::campaigns::CampaignsArgs),
    /// List or look up events
    Events(commands::events::EventsArgs),
    /// List or look up lessons
    Lessons(commands::lessons::LessonsArgs),
    /// Show the dashboard summary
    Analytics,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("zawiyah=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    let services = initialize_services(&settings)?;
    if let Some(kind) = cli.adapter {
        if kind != services.adapter_kind() {
            services.switch_adapter(kind, None)?;
        }
    }

    let format = cli.output;
    match &cli.command {
        Commands::Health => commands::health::run(&services, format).await?,
        Commands::Users(args) => commands::users::run(args, &services, format).await?,
        Commands::Donations(args) => commands::donations::run(args, &services, format).await?,
        Commands::Campaigns(args) => commands::campaigns::run(args, &services, format).await?,
        Commands::Events(args) => commands::events::run(args, &services, format).await?,
        Commands::Lessons(args) => commands::lessons::run(args, &services, format).await?,
        Commands::Analytics => commands::analytics::run(&services, format).await?,
    }

    Ok(())
}
