use std::sync::Arc;

use chrono::Utc;
use common::logger::{LogFormat, init_logger};
use serde_json::json;
use session::{Attributes, SessionStore, StoreConfig, spawn_reaper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("sessiond", LogFormat::from_env());

    let cfg = StoreConfig::from_env();
    tracing::info!(
        ttl_secs = cfg.ttl.num_seconds(),
        reap_every_secs = cfg.reap_interval.as_secs(),
        "starting session store"
    );

    let store = Arc::new(SessionStore::new(&cfg));
    let reaper = spawn_reaper(store.clone(), cfg.reap_interval);

    // Smoke-check the lifecycle once so a misconfigured entropy source
    // fails at startup instead of on the first login.
    let probe = store.issue(Attributes::from([(
        "username".to_string(),
        json!("sessiond-probe"),
    )]))?;
    let view = store.validate(&probe)?;
    tracing::debug!(
        session = %serde_json::to_string(&view)?,
        remaining_secs = view.remaining(Utc::now()).num_seconds(),
        "startup probe issued"
    );
    store.revoke(&probe)?;

    tokio::signal::ctrl_c().await?;
    tracing::info!(sessions = store.count(), "shutdown signal received");

    reaper.shutdown().await;

    Ok(())
}
