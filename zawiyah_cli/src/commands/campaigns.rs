use anyhow::{bail, Result};
use clap::Args;
use zawiyah_lib::ServiceFactory;

use crate::output::{print_campaigns, print_donations, OutputFormat};

#[derive(Args)]
pub struct CampaignsArgs {
    /// Get a single campaign by ID
    #[arg(long)]
    pub id: Option<String>,

    /// With --id, list the campaign's donations instead
    #[arg(long, requires = "id")]
    pub donations: bool,

    /// Only campaigns still accepting donations
    #[arg(long)]
    pub active: bool,
}

pub async fn run(args: &CampaignsArgs, services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let donations = services.donations();

    if let Some(ref id) = args.id {
        if args.donations {
            let list = donations.campaign_donations(id).await?;
            return print_donations(&list, format);
        }
        return match donations.get_campaign(id).await? {
            Some(campaign) => print_campaigns(&[campaign], format),
            None => bail!("Campaign {} not found", id),
        };
    }

    let mut campaigns = donations.list_campaigns().await?;
    if args.active {
        campaigns.retain(|c| c.active);
    }
    print_campaigns(&campaigns, format)
}
