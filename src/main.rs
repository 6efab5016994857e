use std::sync::Arc;

use ridematch::api::DynAPI;
use ridematch::config::Config;
use ridematch::coordinator::RideCoordinator;
use ridematch::error::Error;
use ridematch::notifications::{self, Notifier};
use ridematch::store::PgRideStore;
use ridematch::{db, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let (notifier, receiver) = Notifier::channel(config.notification_buffer);
    let worker = notifications::spawn_worker(receiver);

    let coordinator = RideCoordinator::new(PgRideStore::new(pool), notifier, config.store_timeout);
    let api = Arc::new(coordinator) as DynAPI;

    server::serve(api, config.bind_address).await?;

    // the router held the last notifier; let queued messages drain
    if worker.await.is_err() {
        tracing::warn!("notification worker panicked");
    }

    Ok(())
}
