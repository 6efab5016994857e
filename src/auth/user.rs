use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Verified caller identity handed over by the authentication layer. Trusted
/// as-is; no credential checks happen past this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Rider,
    Driver,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rider" => Ok(Self::Rider),
            "driver" => Ok(Self::Driver),
            _ => Err(Error::unauthenticated_error()),
        }
    }
}

impl User {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn rider(id: Uuid) -> Self {
        Self::new(id, Role::Rider)
    }

    pub fn driver(id: Uuid) -> Self {
        Self::new(id, Role::Driver)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Capability check: fails unless the caller holds `role`.
    pub fn require(&self, role: Role, action: &str) -> Result<(), Error> {
        if self.has_role(role) {
            return Ok(());
        }

        Err(Error::role_not_permitted_error(format!(
            "only {}s can {}",
            role, action
        )))
    }
}

#[test]
fn rider_cannot_act_as_driver() {
    let rider = User::rider(Uuid::new_v4());

    assert!(rider.require(Role::Rider, "create rides").is_ok());

    let err = rider.require(Role::Driver, "accept rides").unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(err.message, "only drivers can accept rides");
}

#[test]
fn parses_roles_leniently() {
    assert_eq!("Driver".parse::<Role>().unwrap(), Role::Driver);
    assert_eq!(" rider ".parse::<Role>().unwrap(), Role::Rider);
    assert!("admin".parse::<Role>().is_err());
}
