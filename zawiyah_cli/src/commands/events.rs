use anyhow::{bail, Result};
use clap::Args;
use zawiyah_lib::ServiceFactory;

use crate::output::{print_events, OutputFormat};

#[derive(Args)]
pub struct EventsArgs {
    /// Get a single event by ID
    #[arg(long)]
    pub id: Option<String>,

    /// Filter by category (e.g. spiritual, fundraiser, education)
    #[arg(long)]
    pub category: Option<String>,

    /// Only events that have not started yet
    #[arg(long, conflicts_with = "category")]
    pub upcoming: bool,
}

pub async fn run(args: &EventsArgs, services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let events = services.events();

    if let Some(ref id) = args.id {
        return match events.get_event(id).await? {
            Some(event) => print_events(&[event], format),
            None => bail!("Event {} not found", id),
        };
    }

    let list = if args.upcoming {
        events.upcoming_events().await?
    } else {
        events.list_events(args.category.as_deref()).await?
    };
    print_events(&list, format)
}
