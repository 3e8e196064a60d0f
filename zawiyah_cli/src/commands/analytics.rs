use anyhow::Result;
use zawiyah_lib::ServiceFactory;

use crate::output::{print_analytics, OutputFormat};

pub async fn run(services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let summary = services.donations().analytics().await?;
    print_analytics(&summary, format)
}
