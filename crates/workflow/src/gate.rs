//! Role-permission table.
//!
//! Every "who may do what" question is answered here or by the edge tables in
//! [`crate::machine`]; call sites never compare role literals themselves.

use civica_auth::Role;

use crate::machine::workflow;
use crate::status::{EntityKind, Status};

/// Per-kind creation and visibility policy.
///
/// `requesters` may create entities of the kind; `self_viewers` see their own
/// records (usually the same set, but e.g. patients read prescriptions a
/// doctor filed for them); `reviewers` see the domain-wide list. Transition
/// permissions are carried on the edges themselves.
#[derive(Debug, Clone, Copy)]
pub struct KindPolicy {
    pub kind: EntityKind,
    pub requesters: &'static [Role],
    pub self_viewers: &'static [Role],
    pub reviewers: &'static [Role],
}

const fn policy(
    kind: EntityKind,
    requesters: &'static [Role],
    self_viewers: &'static [Role],
    reviewers: &'static [Role],
) -> KindPolicy {
    KindPolicy {
        kind,
        requesters,
        self_viewers,
        reviewers,
    }
}

static ENROLLMENT: KindPolicy = policy(
    EntityKind::Enrollment,
    &[Role::Parent],
    &[Role::Parent],
    &[Role::SchoolAdmin],
);

static ABSENCE: KindPolicy = policy(
    EntityKind::Absence,
    &[Role::Student, Role::Parent],
    &[Role::Student, Role::Parent],
    &[Role::Teacher, Role::SchoolAdmin],
);

static SCHOOL_APPOINTMENT: KindPolicy = policy(
    EntityKind::SchoolAppointment,
    &[Role::Student, Role::Parent],
    &[Role::Student, Role::Parent],
    &[Role::Teacher, Role::SchoolAdmin],
);

static HEALTH_APPOINTMENT: KindPolicy = policy(
    EntityKind::HealthAppointment,
    &[Role::Patient],
    &[Role::Patient],
    &[Role::Doctor, Role::Nurse, Role::HealthAdmin],
);

static HEALTH_CARD_REQUEST: KindPolicy = policy(
    EntityKind::HealthCardRequest,
    &[Role::Patient],
    &[Role::Patient],
    &[Role::Nurse, Role::HealthAdmin],
);

// Prescriptions are issued by doctors and read by their patients.
static PRESCRIPTION: KindPolicy = policy(
    EntityKind::Prescription,
    &[Role::Doctor],
    &[Role::Patient],
    &[Role::Doctor, Role::Nurse, Role::HealthAdmin],
);

/// Pure (role, kind, operation) → permitted/denied lookups.
///
/// Stateless; the tables are the single source of truth.
pub struct AccessGate;

impl AccessGate {
    pub fn policy(kind: EntityKind) -> &'static KindPolicy {
        match kind {
            EntityKind::Enrollment => &ENROLLMENT,
            EntityKind::Absence => &ABSENCE,
            EntityKind::SchoolAppointment => &SCHOOL_APPOINTMENT,
            EntityKind::HealthAppointment => &HEALTH_APPOINTMENT,
            EntityKind::HealthCardRequest => &HEALTH_CARD_REQUEST,
            EntityKind::Prescription => &PRESCRIPTION,
        }
    }

    /// May `role` create entities of `kind`?
    pub fn may_request(role: Role, kind: EntityKind) -> bool {
        Self::policy(kind).requesters.contains(&role)
    }

    /// May `role` drive some `requested`-targeted transition on `kind`?
    ///
    /// This is deliberately independent of any entity's current state so that
    /// a denial carries no state information. The concrete edge is validated
    /// separately against the machine.
    pub fn may_transition(role: Role, kind: EntityKind, requested: Status) -> bool {
        if role.is_admin() {
            // The override still cannot invent transitions the kind lacks.
            return workflow(kind).edges.iter().any(|e| e.to == requested);
        }
        workflow(kind)
            .edges
            .iter()
            .any(|e| e.to == requested && e.approvers.contains(&role))
    }

    /// May `role` see the domain-wide list of `kind`?
    pub fn may_view_all(role: Role, kind: EntityKind) -> bool {
        role.is_admin() || Self::policy(kind).reviewers.contains(&role)
    }

    /// May `role` see this kind at all (own records included)?
    pub fn may_view(role: Role, kind: EntityKind) -> bool {
        Self::may_view_all(role, kind) || Self::policy(kind).self_viewers.contains(&role)
    }

    // Directory (non-workflow) resources are staff-gated with the same
    // centralized predicates rather than per-call-site role literals.

    /// Teaching or office staff of the school domain.
    pub fn is_school_staff(role: Role) -> bool {
        matches!(role, Role::Teacher | Role::SchoolAdmin | Role::Admin)
    }

    /// School office staff (student/class/course administration).
    pub fn is_school_office(role: Role) -> bool {
        matches!(role, Role::SchoolAdmin | Role::Admin)
    }

    /// Any school-domain role.
    pub fn is_school_domain(role: Role) -> bool {
        matches!(
            role,
            Role::Student | Role::Parent | Role::Teacher | Role::SchoolAdmin | Role::Admin
        )
    }

    /// Clinical staff of the health domain.
    pub fn is_clinical(role: Role) -> bool {
        matches!(
            role,
            Role::Doctor | Role::Nurse | Role::HealthAdmin | Role::Admin
        )
    }

    /// Health office staff (directory administration).
    pub fn is_health_office(role: Role) -> bool {
        matches!(role, Role::HealthAdmin | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table_is_keyed_consistently() {
        for kind in EntityKind::ALL {
            assert_eq!(AccessGate::policy(kind).kind, kind);
        }
    }

    #[test]
    fn requesters_are_not_reviewers() {
        for kind in EntityKind::ALL {
            if kind == EntityKind::Prescription {
                // Doctors both issue and review prescriptions.
                continue;
            }
            let p = AccessGate::policy(kind);
            for r in p.requesters {
                assert!(
                    !p.reviewers.contains(r),
                    "{kind}: {r} is both requester and reviewer"
                );
            }
        }
    }

    #[test]
    fn only_school_admin_approves_enrollments() {
        for role in Role::ALL {
            let allowed =
                AccessGate::may_transition(role, EntityKind::Enrollment, Status::Approved);
            assert_eq!(
                allowed,
                matches!(role, Role::SchoolAdmin | Role::Admin),
                "{role}"
            );
        }
    }

    #[test]
    fn teachers_may_approve_absences_but_not_enrollments() {
        assert!(AccessGate::may_transition(
            Role::Teacher,
            EntityKind::Absence,
            Status::Approved
        ));
        assert!(!AccessGate::may_transition(
            Role::Teacher,
            EntityKind::Enrollment,
            Status::Approved
        ));
    }

    #[test]
    fn clinical_roles_drive_health_appointments() {
        for role in [Role::Doctor, Role::Nurse, Role::HealthAdmin] {
            assert!(AccessGate::may_transition(
                role,
                EntityKind::HealthAppointment,
                Status::Confirmed
            ));
        }
        assert!(!AccessGate::may_transition(
            Role::Patient,
            EntityKind::HealthAppointment,
            Status::Confirmed
        ));
    }

    #[test]
    fn admin_override_covers_defined_targets_only() {
        assert!(AccessGate::may_transition(
            Role::Admin,
            EntityKind::Enrollment,
            Status::Approved
        ));
        // `issued` is not in the enrollment graph at all.
        assert!(!AccessGate::may_transition(
            Role::Admin,
            EntityKind::Enrollment,
            Status::Issued
        ));
        // Prescriptions have no edges, so even admin is denied.
        assert!(!AccessGate::may_transition(
            Role::Admin,
            EntityKind::Prescription,
            Status::Used
        ));
    }

    #[test]
    fn list_scoping_per_role() {
        assert!(AccessGate::may_view_all(Role::SchoolAdmin, EntityKind::Enrollment));
        assert!(!AccessGate::may_view_all(Role::Parent, EntityKind::Enrollment));
        assert!(AccessGate::may_view(Role::Parent, EntityKind::Enrollment));
        // A doctor has no standing on school enrollments at all.
        assert!(!AccessGate::may_view(Role::Doctor, EntityKind::Enrollment));
    }

    #[test]
    fn patients_request_health_cards_admins_process_them() {
        assert!(AccessGate::may_request(Role::Patient, EntityKind::HealthCardRequest));
        assert!(!AccessGate::may_request(Role::Doctor, EntityKind::HealthCardRequest));
        assert!(AccessGate::may_transition(
            Role::HealthAdmin,
            EntityKind::HealthCardRequest,
            Status::Processing
        ));
        assert!(!AccessGate::may_transition(
            Role::Nurse,
            EntityKind::HealthCardRequest,
            Status::Processing
        ));
    }
}
