use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Checks latitude is within [-90, 90] and longitude within [-180, 180].
    /// `label` names the point in the error message, e.g. "pickup".
    pub fn validate(&self, label: &str) -> Result<(), Error> {
        // NaN fails both range checks
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::invalid_input_error(format!(
                "{} latitude must be between -90 and 90",
                label
            )));
        }

        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::invalid_input_error(format!(
                "{} longitude must be between -180 and 180",
                label
            )));
        }

        Ok(())
    }
}

#[test]
fn accepts_boundaries() {
    assert!(Coordinates::new(90.0, 180.0).validate("pickup").is_ok());
    assert!(Coordinates::new(-90.0, -180.0).validate("pickup").is_ok());
    assert!(Coordinates::new(40.7128, -74.0060).validate("pickup").is_ok());
}

#[test]
fn rejects_out_of_range() {
    let err = Coordinates::new(91.0, 0.0).validate("pickup").unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(err.message, "pickup latitude must be between -90 and 90");

    let err = Coordinates::new(0.0, -200.0).validate("dropoff").unwrap_err();
    assert_eq!(err.message, "dropoff longitude must be between -180 and 180");

    assert!(Coordinates::new(f64::NAN, 0.0).validate("pickup").is_err());
}
