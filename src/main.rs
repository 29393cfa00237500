use anyhow::Context;
use tracing::{error, info};

use curation_worker::{app::ComponentRegistry, config::Config, pipeline::RunContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    // Tracing initialization is handled by Telemetry::new()
    let config = Config::from_env().context("failed to load configuration")?;
    let registry =
        ComponentRegistry::build(config).context("failed to build component registry")?;

    let run = RunContext::new();
    let artifacts = registry.run_curation(&run).await?;

    info!(
        run_id = %run.run_id,
        json = %artifacts.json_path.display(),
        markdown = %artifacts.markdown_path.display(),
        "curation run finished"
    );

    Ok(())
}
