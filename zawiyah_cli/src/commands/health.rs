use anyhow::{bail, Result};
use serde_json::json;
use zawiyah_lib::ServiceFactory;

use crate::output::{print_json, OutputFormat};

pub async fn run(services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let healthy = services.health_check().await;
    let adapter = services.adapter_kind();
    let base_url = services.api().config().base_url;

    match format {
        OutputFormat::Json => print_json(&json!({
            "healthy": healthy,
            "adapter": adapter,
            "baseUrl": base_url,
        })),
        OutputFormat::Table | OutputFormat::Csv => {
            let status = if healthy { "ok" } else { "unreachable" };
            println!("{} ({} adapter, {})", status, adapter, base_url);
        }
    }

    if !healthy {
        bail!("Health check failed for {}", base_url);
    }
    Ok(())
}
