//! Load simulation: riders flood the service with ride requests, then drivers
//! race each other for them until none are left pending.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::api::RideAPI;
use crate::auth::User;
use crate::entities::{Coordinates, RideId};
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub rides_created: usize,
    pub rides_claimed: usize,
    pub conflicts: usize,
    /// Rides more than one driver believes they won. Anything but zero is a bug.
    pub double_claims: usize,
}

pub async fn run<A>(
    api: Arc<A>,
    riders: usize,
    rides_per_rider: usize,
    drivers: usize,
) -> Result<Report, Error>
where
    A: RideAPI + Send + Sync + 'static,
{
    let created: usize = try_join_all((0..riders).map(|_| {
        let api = api.clone();
        tokio::spawn(async move { request_rides(api.as_ref(), rides_per_rider).await })
    }))
    .await
    .map_err(|_| Error::unexpected_error())?
    .into_iter()
    .collect::<Result<Vec<usize>, Error>>()?
    .into_iter()
    .sum();

    tracing::info!(rides = created, "riders done, releasing drivers");

    let outcomes = try_join_all((0..drivers).map(|_| {
        let api = api.clone();
        tokio::spawn(async move { claim_until_empty(api.as_ref()).await })
    }))
    .await
    .map_err(|_| Error::unexpected_error())?;

    let mut winners: HashMap<RideId, usize> = HashMap::new();
    let mut conflicts = 0;

    for outcome in outcomes {
        let (won, lost) = outcome?;
        conflicts += lost;
        for ride_id in won {
            *winners.entry(ride_id).or_default() += 1;
        }
    }

    let report = Report {
        rides_created: created,
        rides_claimed: winners.len(),
        conflicts,
        double_claims: winners.values().filter(|&&count| count > 1).count(),
    };

    tracing::info!(?report, "simulation finished");

    Ok(report)
}

async fn request_rides<A: RideAPI + ?Sized>(api: &A, count: usize) -> Result<usize, Error> {
    let rider = User::rider(Uuid::new_v4());

    for _ in 0..count {
        let (pickup, dropoff, price) = {
            let mut rng = rand::thread_rng();
            (
                random_coordinates(&mut rng),
                random_coordinates(&mut rng),
                rng.gen_range(5.0..80.0),
            )
        };

        api.create_ride(rider, pickup, dropoff, price).await?;
    }

    Ok(count)
}

/// Returns the rides this driver won and how many claims it lost.
async fn claim_until_empty<A: RideAPI + ?Sized>(api: &A) -> Result<(Vec<RideId>, usize), Error> {
    let driver = User::driver(Uuid::new_v4());
    let mut won = vec![];
    let mut lost = 0;

    loop {
        let rides = api.list_available_rides(driver).await?;

        let pick = {
            let mut rng = rand::thread_rng();
            rides.choose(&mut rng).map(|ride| ride.id)
        };

        let ride_id = match pick {
            Some(ride_id) => ride_id,
            None => break,
        };

        match api.accept_ride(driver, ride_id).await {
            Ok(ride) => won.push(ride.id),
            Err(err) if err.is_conflict_error() => lost += 1,
            Err(err) => return Err(err),
        }
    }

    Ok((won, lost))
}

// Somewhere around Manhattan.
fn random_coordinates<R: Rng>(rng: &mut R) -> Coordinates {
    Coordinates::new(rng.gen_range(40.70..40.80), rng.gen_range(-74.02..-73.93))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RideCoordinator;
    use crate::notifications::Notifier;
    use crate::store::MemoryRideStore;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_ride_claimed_exactly_once() {
        let (notifier, _receiver) = Notifier::channel(1024);
        let coordinator = Arc::new(RideCoordinator::new(
            MemoryRideStore::new(),
            notifier,
            Duration::from_secs(5),
        ));

        let report = run(coordinator.clone(), 4, 10, 8).await.unwrap();

        assert_eq!(report.rides_created, 40);
        assert_eq!(report.rides_claimed, 40);
        assert_eq!(report.double_claims, 0);
        assert!(coordinator
            .list_available_rides(User::driver(Uuid::new_v4()))
            .await
            .unwrap()
            .is_empty());
    }
}
