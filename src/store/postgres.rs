use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::RideStore;
use crate::entities::{
    Coordinates, NewRide, Ride, RideId, RideStatus, Transition, TransitionOutcome,
};
use crate::error::Error;

type Database = Postgres;

/// Ride store backed by the shared `rides` table. Claims are arbitrated by
/// Postgres row locking, so any number of server processes may share it.
#[derive(Debug, Clone)]
pub struct PgRideStore {
    pool: Pool<Database>,
}

impl PgRideStore {
    pub fn new(pool: Pool<Database>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RideRow {
    id: i64,
    rider_id: Uuid,
    driver_id: Option<Uuid>,
    pickup_lat: f64,
    pickup_lon: f64,
    dropoff_lat: f64,
    dropoff_lon: f64,
    price: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = Error;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        Ok(Ride {
            id: row.id,
            rider_id: row.rider_id,
            driver_id: row.driver_id,
            pickup: Coordinates::new(row.pickup_lat, row.pickup_lon),
            dropoff: Coordinates::new(row.dropoff_lat, row.dropoff_lon),
            price: row.price,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RideStore for PgRideStore {
    #[tracing::instrument(skip(self))]
    async fn insert_ride(&self, ride: NewRide) -> Result<Ride, Error> {
        let row: RideRow = sqlx::query_as(
            "INSERT INTO rides (rider_id, pickup_lat, pickup_lon, dropoff_lat, dropoff_lon, price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, rider_id, driver_id, pickup_lat, pickup_lon, dropoff_lat, dropoff_lon, price, status, created_at",
        )
        .bind(ride.rider_id())
        .bind(ride.pickup().lat)
        .bind(ride.pickup().lon)
        .bind(ride.dropoff().lat)
        .bind(ride.dropoff().lon)
        .bind(ride.price())
        .bind(RideStatus::Pending.name())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: RideId) -> Result<Option<Ride>, Error> {
        let maybe_row: Option<RideRow> = sqlx::query_as(
            "SELECT id, rider_id, driver_id, pickup_lat, pickup_lon, dropoff_lat, dropoff_lon, price, status, created_at
            FROM rides WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        maybe_row.map(Ride::try_from).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn list_pending(&self) -> Result<Vec<Ride>, Error> {
        let rows: Vec<RideRow> = sqlx::query_as(
            "SELECT id, rider_id, driver_id, pickup_lat, pickup_lon, dropoff_lat, dropoff_lon, price, status, created_at
            FROM rides
            WHERE status = $1
            ORDER BY created_at DESC, id DESC",
        )
        .bind(RideStatus::Pending.name())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Ride::try_from).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn transition(
        &self,
        id: RideId,
        transition: Transition,
    ) -> Result<TransitionOutcome, Error> {
        // predicate and mutation in one statement; concurrent claimers queue on
        // the row lock and re-check the predicate once the winner commits
        let query = match transition {
            Transition::Accept { driver_id } => sqlx::query(
                "UPDATE rides SET status = $3, driver_id = $2 WHERE id = $1 AND status = $4",
            )
            .bind(id)
            .bind(driver_id)
            .bind(transition.target_status().name())
            .bind(transition.required_status().name()),
            Transition::Complete { driver_id } => sqlx::query(
                "UPDATE rides SET status = $3 WHERE id = $1 AND driver_id = $2 AND status = $4",
            )
            .bind(id)
            .bind(driver_id)
            .bind(transition.target_status().name())
            .bind(transition.required_status().name()),
        };

        let rows_affected = query.execute(&self.pool).await?.rows_affected();

        match rows_affected {
            1 => Ok(TransitionOutcome::Applied),
            0 => self.diagnose(id).await,
            n => Err(Error::inconsistent_state_error(format!(
                "{} rows matched ride {}",
                n, id
            ))),
        }
    }
}

impl PgRideStore {
    /// Read-only follow-up to a transition that matched nothing.
    async fn diagnose(&self, id: RideId) -> Result<TransitionOutcome, Error> {
        let maybe_result = sqlx::query("SELECT status FROM rides WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match maybe_result {
            None => Ok(TransitionOutcome::Missing),
            Some(row) => {
                let status: String = row.try_get("status")?;
                Ok(TransitionOutcome::Rejected {
                    current: status.parse()?,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db};

    async fn connect() -> PgRideStore {
        let config = Config::from_env().unwrap();
        let pool = db::connect(&config).await.unwrap();
        db::migrate(&pool).await.unwrap();

        PgRideStore::new(pool)
    }

    fn new_ride() -> NewRide {
        NewRide::new(
            Uuid::new_v4(),
            Coordinates::new(40.7128, -74.0060),
            Coordinates::new(40.7589, -73.9851),
            25.50,
        )
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance at DATABASE_URL"]
    async fn insert_and_claim() {
        let store = connect().await;
        let ride = store.insert_ride(new_ride()).await.unwrap();

        assert_eq!(ride.status, RideStatus::Pending);
        assert!(store
            .list_pending()
            .await
            .unwrap()
            .iter()
            .any(|r| r.id == ride.id));

        let driver_id = Uuid::new_v4();
        let outcome = store
            .transition(ride.id, Transition::Accept { driver_id })
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);

        let outcome = store
            .transition(
                ride.id,
                Transition::Accept {
                    driver_id: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Rejected {
                current: RideStatus::Accepted
            }
        );

        let stored = store.find_ride(ride.id).await.unwrap().unwrap();
        assert_eq!(stored.driver_id, Some(driver_id));
        assert!(!store
            .list_pending()
            .await
            .unwrap()
            .iter()
            .any(|r| r.id == ride.id));
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance at DATABASE_URL"]
    async fn missing_ride_is_reported() {
        let store = connect().await;

        let outcome = store
            .transition(
                i64::MAX,
                Transition::Accept {
                    driver_id: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, TransitionOutcome::Missing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires a Postgres instance at DATABASE_URL"]
    async fn concurrent_claims_have_one_winner() {
        let store = connect().await;
        let ride_id = store.insert_ride(new_ride()).await.unwrap().id;

        let attempts = (0..16).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let driver_id = Uuid::new_v4();
                let outcome = store
                    .transition(ride_id, Transition::Accept { driver_id })
                    .await
                    .unwrap();
                (driver_id, outcome)
            })
        });

        let results = futures::future::join_all(attempts).await;
        let winners: Vec<Uuid> = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|(_, outcome)| *outcome == TransitionOutcome::Applied)
            .map(|(driver_id, _)| driver_id)
            .collect();

        assert_eq!(winners.len(), 1);

        let stored = store.find_ride(ride_id).await.unwrap().unwrap();
        assert_eq!(stored.driver_id, Some(winners[0]));
    }
}
