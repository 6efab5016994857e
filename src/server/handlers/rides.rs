use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::{Coordinates, Ride, RideId};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    pickup: Coordinates,
    dropoff: Coordinates,
    price: f64,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    params: Result<Json<CreateParams>, JsonRejection>,
) -> Result<(StatusCode, Json<Ride>), Error> {
    let Json(params) =
        params.map_err(|rejection| Error::invalid_input_error(rejection.to_string()))?;

    let ride = api
        .create_ride(user, params.pickup, params.dropoff, params.price)
        .await?;

    Ok((StatusCode::CREATED, ride.into()))
}

pub async fn list_available(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.list_available_rides(user).await?;

    Ok(rides.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<Json<Ride>, Error> {
    let ride = api.accept_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn complete(
    Extension(api): Extension<DynAPI>,
    user: User,
    Path(id): Path<RideId>,
) -> Result<Json<Ride>, Error> {
    let ride = api.complete_ride(user, id).await?;

    Ok(ride.into())
}
