//! Closed status and entity-kind vocabulary.

use serde::{Deserialize, Serialize};

/// Every status any workflow entity can be in, across both domains.
///
/// Which of these a given entity may actually hold, and which moves between
/// them are legal, is defined per kind in [`crate::machine`]. Statuses are
/// tagged variants, never compared as ad hoc strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
    Completed,
    Confirmed,
    Cancelled,
    Processing,
    Issued,
    Active,
    Used,
    Expired,
}

impl Status {
    pub const ALL: [Status; 11] = [
        Status::Pending,
        Status::Approved,
        Status::Rejected,
        Status::Completed,
        Status::Confirmed,
        Status::Cancelled,
        Status::Processing,
        Status::Issued,
        Status::Active,
        Status::Used,
        Status::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
            Status::Completed => "completed",
            Status::Confirmed => "confirmed",
            Status::Cancelled => "cancelled",
            Status::Processing => "processing",
            Status::Issued => "issued",
            Status::Active => "active",
            Status::Used => "used",
            Status::Expired => "expired",
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six transitionable entity kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Enrollment,
    Absence,
    SchoolAppointment,
    HealthAppointment,
    HealthCardRequest,
    Prescription,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Enrollment,
        EntityKind::Absence,
        EntityKind::SchoolAppointment,
        EntityKind::HealthAppointment,
        EntityKind::HealthCardRequest,
        EntityKind::Prescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Enrollment => "enrollment",
            EntityKind::Absence => "absence",
            EntityKind::SchoolAppointment => "school_appointment",
            EntityKind::HealthAppointment => "health_appointment",
            EntityKind::HealthCardRequest => "health_card_request",
            EntityKind::Prescription => "prescription",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
