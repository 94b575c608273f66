use anyhow::Context;
use course_planner::{AppConfig, ScheduleStore, http_api, logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing("course_planner=info,http=info");

    let config = AppConfig::from_env().context("failed to read configuration")?;
    let addr = config.socket_addr()?;
    let backend = config.open_backend().context("failed to open storage backend")?;
    let store = ScheduleStore::open(backend, config.locale).context("failed to load schedule")?;

    info!(%addr, backend = ?config.backend, locale = %config.locale, "course-planner HTTP API listening");
    http_api::serve(addr, store).await?;
    Ok(())
}
