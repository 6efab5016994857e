use super::RideCoordinator;

use async_trait::async_trait;

use crate::{
    api::RideAPI,
    auth::{Role, User},
    entities::{Coordinates, NewRide, Ride, RideId, Transition},
    error::Error,
    store::RideStore,
};

#[async_trait]
impl<S: RideStore> RideAPI for RideCoordinator<S> {
    #[tracing::instrument(skip(self))]
    async fn create_ride(
        &self,
        user: User,
        pickup: Coordinates,
        dropoff: Coordinates,
        price: f64,
    ) -> Result<Ride, Error> {
        user.require(Role::Rider, "request rides")?;

        let new_ride = NewRide::new(user.id, pickup, dropoff, price)?;
        let ride = self
            .bounded("insert_ride", self.store.insert_ride(new_ride))
            .await?;

        tracing::info!(ride_id = ride.id, rider_id = %user.id, "ride created");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn list_available_rides(&self, user: User) -> Result<Vec<Ride>, Error> {
        user.require(Role::Driver, "browse rides")?;

        self.bounded("list_pending", self.store.list_pending()).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, user: User, id: RideId) -> Result<Ride, Error> {
        let not_found = || Error::not_found_error(format!("ride {} not found", id));

        let ride = self.fetch_ride(id).await?.ok_or_else(not_found)?;

        // existence is not leaked to callers who may not see the ride
        let visible = ride.rider_id == user.id
            || ride.driver_id == Some(user.id)
            || (ride.is_pending() && user.has_role(Role::Driver));

        if !visible {
            return Err(not_found());
        }

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_ride(&self, user: User, id: RideId) -> Result<Ride, Error> {
        user.require(Role::Driver, "accept rides")?;

        let ride = self
            .transition(id, Transition::Accept { driver_id: user.id })
            .await?;

        tracing::info!(ride_id = id, driver_id = %user.id, "ride accepted");

        self.notifier.ride_accepted(&ride);

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn complete_ride(&self, user: User, id: RideId) -> Result<Ride, Error> {
        user.require(Role::Driver, "complete rides")?;

        let ride = self
            .transition(id, Transition::Complete { driver_id: user.id })
            .await?;

        tracing::info!(ride_id = id, driver_id = %user.id, "ride completed");

        Ok(ride)
    }
}
