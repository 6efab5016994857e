use sqlx::{postgres::PgPoolOptions, Executor, Pool, Postgres};

use crate::config::Config;
use crate::error::Error;

pub type PgPool = Pool<Postgres>;

#[tracing::instrument(skip_all, fields(max_connections = config.max_connections))]
pub async fn connect(config: &Config) -> Result<PgPool, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.store_timeout)
        .connect(&config.database_url)
        .await?;

    Ok(pool)
}

/// Creates the ride table if it is missing. Rides are never dropped here.
#[tracing::instrument(skip_all)]
pub async fn migrate(pool: &PgPool) -> Result<(), Error> {
    pool.execute(
        "CREATE TABLE IF NOT EXISTS rides (
            id BIGSERIAL PRIMARY KEY,
            rider_id UUID NOT NULL,
            driver_id UUID,
            pickup_lat DOUBLE PRECISION NOT NULL CHECK (pickup_lat BETWEEN -90 AND 90),
            pickup_lon DOUBLE PRECISION NOT NULL CHECK (pickup_lon BETWEEN -180 AND 180),
            dropoff_lat DOUBLE PRECISION NOT NULL CHECK (dropoff_lat BETWEEN -90 AND 90),
            dropoff_lon DOUBLE PRECISION NOT NULL CHECK (dropoff_lon BETWEEN -180 AND 180),
            price DOUBLE PRECISION NOT NULL CHECK (price > 0),
            status VARCHAR NOT NULL CHECK (status IN ('pending', 'accepted', 'completed')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CHECK ((status = 'pending') = (driver_id IS NULL))
        )",
    )
    .await?;

    pool.execute(
        "CREATE INDEX IF NOT EXISTS rides_status_created_at ON rides (status, created_at DESC)",
    )
    .await?;

    tracing::info!("ride table ready");

    Ok(())
}
