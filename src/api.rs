use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::User;
use crate::entities::{Coordinates, Ride, RideId};
use crate::error::Error;

#[async_trait]
pub trait RideAPI {
    /// Riders only. Validates before anything is persisted.
    async fn create_ride(
        &self,
        user: User,
        pickup: Coordinates,
        dropoff: Coordinates,
        price: f64,
    ) -> Result<Ride, Error>;

    /// Drivers only. Pending rides, newest first. A listed ride may be claimed
    /// by someone else before the caller gets to it.
    async fn list_available_rides(&self, user: User) -> Result<Vec<Ride>, Error>;

    async fn find_ride(&self, user: User, id: RideId) -> Result<Ride, Error>;

    /// Drivers only. Exactly one concurrent caller wins a pending ride; the
    /// rest get a conflict.
    async fn accept_ride(&self, user: User, id: RideId) -> Result<Ride, Error>;

    async fn complete_ride(&self, user: User, id: RideId) -> Result<Ride, Error>;
}

pub type DynAPI = Arc<dyn RideAPI + Send + Sync>;
