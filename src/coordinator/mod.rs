mod ride_api;

use std::future::Future;
use std::time::Duration;

use crate::{
    entities::{Ride, RideId, Transition, TransitionOutcome},
    error::Error,
    notifications::Notifier,
    store::RideStore,
};

/// Turns caller intent into ride store operations. Holds no ride state of its
/// own; every request goes straight to the store.
pub struct RideCoordinator<S> {
    store: S,
    notifier: Notifier,
    store_timeout: Duration,
}

impl<S: RideStore> RideCoordinator<S> {
    pub fn new(store: S, notifier: Notifier, store_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            store_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs a store call under the configured deadline. Expiry is reported as
    /// the retriable unavailable error, never as a conflict.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.store_timeout, "store call timed out");
                Err(Error::unavailable_error())
            }
        }
    }

    async fn fetch_ride(&self, id: RideId) -> Result<Option<Ride>, Error> {
        self.bounded("find_ride", self.store.find_ride(id)).await
    }

    /// Applies `transition` through the store's conditional primitive and
    /// re-reads the ride on success.
    #[tracing::instrument(skip(self))]
    async fn transition(&self, id: RideId, transition: Transition) -> Result<Ride, Error> {
        let outcome = self
            .bounded(transition.name(), self.store.transition(id, transition))
            .await?;

        match outcome {
            TransitionOutcome::Applied => {
                let ride = self.fetch_ride(id).await?.ok_or_else(|| {
                    Error::inconsistent_state_error(format!(
                        "ride {} missing right after {}",
                        id,
                        transition.name()
                    ))
                })?;

                if ride.driver_id != Some(transition.driver_id()) {
                    return Err(Error::inconsistent_state_error(format!(
                        "ride {} held by another driver right after {}",
                        id,
                        transition.name()
                    )));
                }

                Ok(ride)
            }
            TransitionOutcome::Missing => {
                Err(Error::not_found_error(format!("ride {} not found", id)))
            }
            TransitionOutcome::Rejected { current } => {
                tracing::warn!(ride_id = id, %current, "transition rejected");
                Err(Error::conflict_error(format!(
                    "ride {} cannot {}: it is {}",
                    id,
                    transition.name(),
                    current
                )))
            }
        }
    }
}
