//! Role vocabulary.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller role, as carried in a verified token.
///
/// This is a *closed* set on purpose: a token minted with a role outside this
/// list fails deserialization at the boundary, and therefore authorizes
/// nothing. Permission decisions live in the workflow gate, keyed on these
/// variants, never on ad hoc string comparison at call sites.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// School domain: an enrolled pupil acting for themselves.
    Student,
    /// School domain: a parent or guardian acting for a dependent.
    Parent,
    /// School domain: teaching staff.
    Teacher,
    /// School domain: administrative office staff.
    SchoolAdmin,
    /// Health domain: a patient acting for themselves.
    Patient,
    /// Health domain: a licensed physician.
    Doctor,
    /// Health domain: nursing staff.
    Nurse,
    /// Health domain: administrative office staff.
    HealthAdmin,
    /// Cross-domain platform operator; may drive any transition on any kind.
    Admin,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Student,
        Role::Parent,
        Role::Teacher,
        Role::SchoolAdmin,
        Role::Patient,
        Role::Doctor,
        Role::Nurse,
        Role::HealthAdmin,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Teacher => "teacher",
            Role::SchoolAdmin => "school_admin",
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::HealthAdmin => "health_admin",
            Role::Admin => "admin",
        }
    }

    /// The platform operator override.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a role string outside the closed set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_role_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::SchoolAdmin).unwrap();
        assert_eq!(json, "\"school_admin\"");
        assert!(serde_json::from_str::<Role>("\"warlock\"").is_err());
    }
}
