use std::path::PathBuf;

use sprint_capacity::{
    InMemoryRepository, PlannerConfig, http_api, load_items_from_csv, load_items_from_json,
};
use tracing_subscriber::EnvFilter;

fn load_repository(
    path: Option<PathBuf>,
) -> Result<InMemoryRepository, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(InMemoryRepository::new());
    };
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let items = if is_csv {
        load_items_from_csv(&path)?
    } else {
        load_items_from_json(&path)?
    };
    tracing::info!(path = %path.display(), count = items.len(), "loaded work item snapshot");
    Ok(InMemoryRepository::from_items(items)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var_os("SPRINT_CAPACITY_CONFIG").map(PathBuf::from);
    let config = PlannerConfig::load(config_path.as_deref())?;
    let addr = config.socket_addr()?;

    let snapshot = std::env::args_os().nth(1).map(PathBuf::from);
    let repository = load_repository(snapshot)?;

    println!("sprint-capacity HTTP API listening on http://{addr}");
    let state = http_api::AppState::from_config(repository, &config);
    http_api::serve(addr, state).await?;
    Ok(())
}
