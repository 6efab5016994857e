//! Durable record of rides and the single entry point allowed to change their
//! lifecycle state.

mod memory;
mod postgres;

pub use memory::MemoryRideStore;
pub use postgres::PgRideStore;

use async_trait::async_trait;

use crate::entities::{NewRide, Ride, RideId, Transition, TransitionOutcome};
use crate::error::Error;

#[async_trait]
pub trait RideStore: Send + Sync {
    /// Persists a pending ride, assigning its identifier and creation time.
    async fn insert_ride(&self, ride: NewRide) -> Result<Ride, Error>;

    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>, Error>;

    /// Snapshot of pending rides, most recently created first.
    async fn list_pending(&self) -> Result<Vec<Ride>, Error>;

    /// Conditionally applies `transition` to ride `id`. The predicate check and
    /// the write happen as one atomic operation inside the store; this is the
    /// only way `status` and `driver_id` are ever written.
    async fn transition(
        &self,
        id: RideId,
        transition: Transition,
    ) -> Result<TransitionOutcome, Error>;
}
