use anyhow::{bail, Result};
use clap::Args;
use zawiyah_lib::ServiceFactory;

use crate::output::{print_donations, print_users, OutputFormat};

#[derive(Args)]
pub struct UsersArgs {
    /// Get a single user by ID
    #[arg(long)]
    pub id: Option<String>,

    /// With --id, list that user's donations instead
    #[arg(long, requires = "id")]
    pub donations: bool,
}

pub async fn run(args: &UsersArgs, services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let users = services.users();

    if let Some(ref id) = args.id {
        if args.donations {
            let donations = users.user_donations(id).await?;
            return print_donations(&donations, format);
        }
        return match users.get_user(id).await? {
            Some(user) => print_users(&[user], format),
            None => bail!("User {} not found", id),
        };
    }

    let all = users.list_users().await?;
    eprintln!("{} users", all.len());
    print_users(&all, format)
}
