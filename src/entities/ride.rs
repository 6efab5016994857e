use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Coordinates;
use crate::error::Error;

pub type RideId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub price: f64,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

/// Ride lifecycle. Only ever advances `Pending -> Accepted -> Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
    Completed,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            other => Err(Error::inconsistent_state_error(format!(
                "unknown ride status {:?}",
                other
            ))),
        }
    }
}

/// Validated parameters for a new ride. Holding one means the coordinates and
/// price already passed [`NewRide::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct NewRide {
    rider_id: Uuid,
    pickup: Coordinates,
    dropoff: Coordinates,
    price: f64,
}

impl NewRide {
    pub fn new(
        rider_id: Uuid,
        pickup: Coordinates,
        dropoff: Coordinates,
        price: f64,
    ) -> Result<Self, Error> {
        pickup.validate("pickup")?;
        dropoff.validate("dropoff")?;

        // also rejects NaN
        if !(price > 0.0 && price.is_finite()) {
            return Err(Error::invalid_input_error("price must be positive"));
        }

        Ok(Self {
            rider_id,
            pickup,
            dropoff,
            price,
        })
    }

    pub fn rider_id(&self) -> Uuid {
        self.rider_id
    }

    pub fn pickup(&self) -> Coordinates {
        self.pickup
    }

    pub fn dropoff(&self) -> Coordinates {
        self.dropoff
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Materializes the ride once the store has assigned identity and time.
    pub fn into_ride(self, id: RideId, created_at: DateTime<Utc>) -> Ride {
        Ride {
            id,
            rider_id: self.rider_id,
            driver_id: None,
            pickup: self.pickup,
            dropoff: self.dropoff,
            price: self.price,
            status: Status::Pending,
            created_at,
        }
    }
}

/// A conditional state change. Each variant pairs a predicate over the current
/// record with the mutation applied when it holds; stores must evaluate both as
/// one indivisible operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// `pending` -> `accepted`, claiming the ride for `driver_id`.
    Accept { driver_id: Uuid },
    /// `accepted` -> `completed`, only by the driver holding the ride.
    Complete { driver_id: Uuid },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accept",
            Self::Complete { .. } => "complete",
        }
    }

    pub fn required_status(&self) -> Status {
        match self {
            Self::Accept { .. } => Status::Pending,
            Self::Complete { .. } => Status::Accepted,
        }
    }

    pub fn target_status(&self) -> Status {
        match self {
            Self::Accept { .. } => Status::Accepted,
            Self::Complete { .. } => Status::Completed,
        }
    }

    pub fn driver_id(&self) -> Uuid {
        match self {
            Self::Accept { driver_id } | Self::Complete { driver_id } => *driver_id,
        }
    }

    pub fn applies_to(&self, ride: &Ride) -> bool {
        match self {
            Self::Accept { .. } => ride.status == Status::Pending,
            Self::Complete { driver_id } => {
                ride.status == Status::Accepted && ride.driver_id == Some(*driver_id)
            }
        }
    }
}

/// Result of a conditional transition as reported by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Predicate held and exactly one record was updated.
    Applied,
    /// No ride with that identifier exists.
    Missing,
    /// The ride exists but the predicate did not hold.
    Rejected { current: Status },
}

impl Ride {
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    /// Applies `transition` if its predicate holds, returning whether it did.
    pub fn apply(&mut self, transition: Transition) -> bool {
        if !transition.applies_to(self) {
            return false;
        }

        self.status = transition.target_status();
        self.driver_id = Some(transition.driver_id());

        true
    }

    /// Whether the claiming party is set exactly when the ride left `pending`.
    pub fn is_consistent(&self) -> bool {
        self.driver_id.is_some() != self.is_pending()
    }
}
