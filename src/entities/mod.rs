mod coordinates;
mod ride;

pub use coordinates::Coordinates;
pub use ride::{NewRide, Ride, RideId, Status as RideStatus, Transition, TransitionOutcome};
