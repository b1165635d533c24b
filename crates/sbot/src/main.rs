use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sbot_core::config::Config;
use sbot_mongo::MongoApprovalStore;

#[tokio::main]
async fn main() -> Result<(), sbot_core::Error> {
    sbot_core::logging::init("sbot")?;

    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(
        MongoApprovalStore::connect(
            &cfg.mongodb_uri,
            &cfg.mongodb_database,
            &cfg.mongodb_collection,
        )
        .await?,
    );

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, shutting down");
                shutdown.cancel();
            }
        });
    }

    sbot_telegram::router::run_polling(cfg, store, shutdown)
        .await
        .map_err(|e| sbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
