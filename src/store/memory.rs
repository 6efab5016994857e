use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::RideStore;
use crate::entities::{NewRide, Ride, RideId, Transition, TransitionOutcome};
use crate::error::Error;

/// In-process ride store. The conditional transition is a compare-and-set
/// under one lock, which only excludes callers sharing this instance; use
/// [`super::PgRideStore`] when more than one process serves requests.
#[derive(Debug, Default)]
pub struct MemoryRideStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    last_id: RideId,
    rides: BTreeMap<RideId, Ride>,
}

impl MemoryRideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rides.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RideStore for MemoryRideStore {
    #[tracing::instrument(skip(self))]
    async fn insert_ride(&self, ride: NewRide) -> Result<Ride, Error> {
        let mut state = self.state.lock().await;

        state.last_id += 1;
        let ride = ride.into_ride(state.last_id, Utc::now());
        state.rides.insert(ride.id, ride.clone());

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>, Error> {
        Ok(self.state.lock().await.rides.get(&id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn list_pending(&self) -> Result<Vec<Ride>, Error> {
        let state = self.state.lock().await;

        let mut rides: Vec<Ride> = state
            .rides
            .values()
            .filter(|ride| ride.is_pending())
            .cloned()
            .collect();
        // ties on timestamp fall back to insertion order
        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rides)
    }

    #[tracing::instrument(skip(self))]
    async fn transition(
        &self,
        id: RideId,
        transition: Transition,
    ) -> Result<TransitionOutcome, Error> {
        let mut state = self.state.lock().await;

        let ride = match state.rides.get_mut(&id) {
            Some(ride) => ride,
            None => return Ok(TransitionOutcome::Missing),
        };

        if ride.apply(transition) {
            Ok(TransitionOutcome::Applied)
        } else {
            Ok(TransitionOutcome::Rejected {
                current: ride.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Coordinates, RideStatus};
    use std::sync::Arc;
    use uuid::Uuid;

    fn new_ride() -> NewRide {
        NewRide::new(
            Uuid::new_v4(),
            Coordinates::new(40.7128, -74.0060),
            Coordinates::new(40.7589, -73.9851),
            25.50,
        )
        .unwrap()
    }

    #[test]
    fn assigns_increasing_ids() {
        use tokio_test::block_on;

        let store = MemoryRideStore::new();

        let first = block_on(store.insert_ride(new_ride())).unwrap();
        let second = block_on(store.insert_ride(new_ride())).unwrap();

        assert!(second.id > first.id);
        assert_eq!(block_on(store.len()), 2);
    }

    #[tokio::test]
    async fn lists_newest_pending_first() {
        let store = MemoryRideStore::new();

        let oldest = store.insert_ride(new_ride()).await.unwrap();
        let claimed = store.insert_ride(new_ride()).await.unwrap();
        let newest = store.insert_ride(new_ride()).await.unwrap();

        store
            .transition(
                claimed.id,
                Transition::Accept {
                    driver_id: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        let ids: Vec<RideId> = store
            .list_pending()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec![newest.id, oldest.id]);
    }

    #[tokio::test]
    async fn reports_missing_and_rejected() {
        let store = MemoryRideStore::new();
        let ride = store.insert_ride(new_ride()).await.unwrap();
        let driver_id = Uuid::new_v4();

        let outcome = store
            .transition(ride.id + 1, Transition::Accept { driver_id })
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Missing);

        let outcome = store
            .transition(ride.id, Transition::Complete { driver_id })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Rejected {
                current: RideStatus::Pending
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_have_one_winner() {
        let store = Arc::new(MemoryRideStore::new());
        let ride_id = store.insert_ride(new_ride()).await.unwrap().id;

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let driver_id = Uuid::new_v4();
                    let outcome = store
                        .transition(ride_id, Transition::Accept { driver_id })
                        .await
                        .unwrap();
                    (driver_id, outcome)
                })
            })
            .collect();

        let mut winners = vec![];
        for handle in handles {
            let (driver_id, outcome) = handle.await.unwrap();
            if outcome == TransitionOutcome::Applied {
                winners.push(driver_id);
            }
        }

        assert_eq!(winners.len(), 1);

        let stored = store.find_ride(ride_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RideStatus::Accepted);
        assert_eq!(stored.driver_id, Some(winners[0]));
    }
}
