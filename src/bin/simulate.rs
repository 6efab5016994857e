//! Races simulated drivers against each other on an in-memory store.
//!
//! Usage: `simulate [riders] [rides-per-rider] [drivers]`

use std::env;
use std::sync::Arc;
use std::time::Duration;

use ridematch::coordinator::RideCoordinator;
use ridematch::error::Error;
use ridematch::notifications::{self, Notifier};
use ridematch::simulation;
use ridematch::store::MemoryRideStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,simulate=info")),
        )
        .init();

    let args: Vec<usize> = env::args()
        .skip(1)
        .map(|arg| arg.parse().map_err(|_| Error::invalid_input_error(format!("not a count: {}", arg))))
        .collect::<Result<_, _>>()?;
    let arg = |i: usize, default: usize| args.get(i).copied().unwrap_or(default);

    let (notifier, receiver) = Notifier::channel(1024);
    notifications::spawn_worker(receiver);

    let coordinator = Arc::new(RideCoordinator::new(
        MemoryRideStore::new(),
        notifier,
        Duration::from_secs(5),
    ));

    let report = simulation::run(coordinator, arg(0, 10), arg(1, 20), arg(2, 25)).await?;

    tracing::info!(
        created = report.rides_created,
        claimed = report.rides_claimed,
        conflicts = report.conflicts,
        double_claims = report.double_claims,
        "done"
    );

    if report.double_claims > 0 {
        return Err(Error::inconsistent_state_error(format!(
            "{} rides claimed more than once",
            report.double_claims
        )));
    }

    Ok(())
}
