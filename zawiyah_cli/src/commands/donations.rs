use anyhow::{bail, Result};
use clap::Args;
use zawiyah_lib::{DonationFilter, ServiceFactory};

use crate::output::{print_donations, OutputFormat};

#[derive(Args)]
pub struct DonationsArgs {
    /// Get a single donation by ID
    #[arg(long, conflicts_with_all = ["user", "campaign"])]
    pub id: Option<String>,

    /// Only donations made by this user ID
    #[arg(long)]
    pub user: Option<String>,

    /// Only donations to this campaign ID
    #[arg(long)]
    pub campaign: Option<String>,

    /// Page number (enables paging)
    #[arg(long)]
    pub page: Option<u64>,

    /// Results per page
    #[arg(long, default_value = "20")]
    pub limit: u64,
}

pub async fn run(args: &DonationsArgs, services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let donations = services.donations();

    if let Some(ref id) = args.id {
        return match donations.get_donation(id).await? {
            Some(donation) => print_donations(&[donation], format),
            None => bail!("Donation {} not found", id),
        };
    }

    let mut filter = DonationFilter::default();
    if let Some(ref user) = args.user {
        filter = filter.with_user(user);
    }
    if let Some(ref campaign) = args.campaign {
        filter = filter.with_campaign(campaign);
    }

    match args.page {
        Some(page) => {
            if page == 0 || args.limit == 0 {
                bail!("--page and --limit must be at least 1");
            }
            let page = donations.donations_page(&filter, page, args.limit).await?;
            eprintln!(
                "Page {}/{} ({} total donations)",
                page.pagination.page, page.pagination.total_pages, page.pagination.total
            );
            print_donations(&page.items, format)
        }
        None => {
            let all = donations.list_donations(&filter).await?;
            print_donations(&all, format)
        }
    }
}
