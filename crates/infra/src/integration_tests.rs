//! Cross-service integration tests: the full enrollment/absence flows with
//! real stores and a real certificate resolver.

use std::sync::Arc;

use chrono::{Duration, Utc};

use civica_auth::{IdentityClaim, Role};
use civica_core::{CertificateId, DomainError, SubjectId, VerificationFailure};
use civica_health::MedicalCertificate;
use civica_workflow::{
    CertificateResolver, CertificateSnapshot, ResolveError, Status, VerificationOutcome,
};

use crate::certificates::CertificateStore;
use crate::services::school::NewEnrollment;
use crate::services::{HealthService, SchoolService};

fn claim(role: Role) -> IdentityClaim {
    IdentityClaim {
        subject_id: SubjectId::new(),
        role,
        email: format!("{role}@example.com"),
        first_name: "Test".to_string(),
        last_name: role.as_str().to_string(),
    }
}

fn enrollment_request(child: SubjectId, certificate_id: Option<CertificateId>) -> NewEnrollment {
    NewEnrollment {
        student_subject_id: child,
        first_name: "Iva".to_string(),
        last_name: "Novak".to_string(),
        date_of_birth: (Utc::now() - Duration::days(7 * 365)).date_naive(),
        school_year: "2026/2027".to_string(),
        certificate_id,
        notes: None,
    }
}

fn issue_cert(
    store: &CertificateStore,
    subject: SubjectId,
    valid_days_from_now: i64,
) -> MedicalCertificate {
    let now = Utc::now();
    let cert = MedicalCertificate::issue(
        civica_core::PatientId::new(),
        subject,
        "enrollment",
        (now - Duration::days(30)).date_naive(),
        (now + Duration::days(valid_days_from_now)).date_naive(),
        civica_core::DoctorId::new(),
        None,
        now,
    )
    .unwrap();
    store.insert(cert.clone()).unwrap();
    cert
}

#[test]
fn enrollment_with_valid_certificate_approves_and_provisions_once() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates.clone());

    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);
    let child = SubjectId::new();
    let cert = issue_cert(&certificates, child, 180);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(child, Some(cert.id)))
        .unwrap();

    let decision = school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap();

    assert_eq!(
        decision.enrollment.lifecycle().current(),
        Status::Approved
    );
    let student_id = decision.student_id.expect("student provisioned");
    assert_eq!(
        decision.enrollment.verification().unwrap().outcome,
        VerificationOutcome::Valid
    );

    // Approving again is a no-op that reports the same student.
    let replay = school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap();
    assert_eq!(replay.student_id, Some(student_id));
    assert_eq!(
        replay.enrollment.lifecycle().last_transition_at(),
        decision.enrollment.lifecycle().last_transition_at()
    );

    // Exactly one log entry, exactly one student.
    assert_eq!(
        school
            .enrollment_transitions(&admin, enrollment.id())
            .unwrap()
            .len(),
        1
    );
    assert_eq!(school.list_students(&admin).unwrap().len(), 1);
}

#[test]
fn expired_certificate_blocks_approval_and_is_recorded() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates.clone());

    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);
    let child = SubjectId::new();
    let cert = issue_cert(&certificates, child, -1);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(child, Some(cert.id)))
        .unwrap();

    let err = school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::VerificationFailed(VerificationFailure::Expired)
    );

    // Still pending, no student, but the failed check is on record.
    let reloaded = school.get_enrollment(&admin, enrollment.id()).unwrap();
    assert_eq!(reloaded.lifecycle().current(), Status::Pending);
    assert_eq!(
        reloaded.verification().unwrap().outcome,
        VerificationOutcome::Expired
    );
    assert!(school
        .student_for_enrollment(enrollment.id())
        .unwrap()
        .is_none());
}

#[test]
fn foreign_certificate_blocks_approval() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates.clone());

    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);
    let child = SubjectId::new();
    let somebody_else = SubjectId::new();
    let cert = issue_cert(&certificates, somebody_else, 180);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(child, Some(cert.id)))
        .unwrap();

    let err = school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::VerificationFailed(VerificationFailure::OwnerMismatch)
    );
}

#[test]
fn enrollment_without_certificate_cannot_be_approved_but_can_be_rejected() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates);

    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(SubjectId::new(), None))
        .unwrap();

    let err = school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let decision = school
        .transition_enrollment(&admin, enrollment.id(), Status::Rejected, None)
        .unwrap();
    assert_eq!(decision.enrollment.lifecycle().current(), Status::Rejected);
    assert!(decision.student_id.is_none());
}

#[test]
fn absence_without_certificate_approves_unconditionally() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates.clone());

    let admin = claim(Role::SchoolAdmin);
    let teacher = claim(Role::Teacher);
    let student_claim = claim(Role::Student);

    let student = school
        .register_student(
            &admin,
            student_claim.subject_id,
            "Iva".to_string(),
            "Novak".to_string(),
            (Utc::now() - Duration::days(8 * 365)).date_naive(),
            None,
            None,
        )
        .unwrap();

    let now = Utc::now();
    let absence = school
        .submit_absence(
            &student_claim,
            Some(student.id),
            now.date_naive() - Duration::days(2),
            now.date_naive() - Duration::days(1),
            "flu".to_string(),
            None,
        )
        .unwrap();

    let approved = school
        .transition_absence(&teacher, absence.id(), Status::Approved)
        .unwrap();
    assert_eq!(approved.lifecycle().current(), Status::Approved);
    assert!(approved.verification().is_none());
}

#[test]
fn absence_with_certificate_verifies_against_the_student() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates.clone());

    let admin = claim(Role::SchoolAdmin);
    let teacher = claim(Role::Teacher);
    let student_claim = claim(Role::Student);

    let student = school
        .register_student(
            &admin,
            student_claim.subject_id,
            "Iva".to_string(),
            "Novak".to_string(),
            (Utc::now() - Duration::days(8 * 365)).date_naive(),
            None,
            None,
        )
        .unwrap();

    let cert = issue_cert(&certificates, student_claim.subject_id, 30);

    let now = Utc::now();
    let absence = school
        .submit_absence(
            &student_claim,
            Some(student.id),
            now.date_naive() - Duration::days(2),
            now.date_naive() - Duration::days(1),
            "flu".to_string(),
            Some(cert.id),
        )
        .unwrap();

    let approved = school
        .transition_absence(&teacher, absence.id(), Status::Approved)
        .unwrap();
    assert_eq!(approved.lifecycle().current(), Status::Approved);
    assert_eq!(
        approved.verification().unwrap().outcome,
        VerificationOutcome::Valid
    );
}

#[test]
fn unreachable_resolver_is_retryable_and_leaves_no_verdict() {
    struct DownResolver;
    impl CertificateResolver for DownResolver {
        fn resolve(
            &self,
            _id: civica_core::CertificateId,
        ) -> Result<Option<CertificateSnapshot>, ResolveError> {
            Err(ResolveError::Unavailable("timeout".to_string()))
        }
    }

    let school = SchoolService::new(Arc::new(DownResolver));
    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);

    let enrollment = school
        .submit_enrollment(
            &parent,
            enrollment_request(SubjectId::new(), Some(CertificateId::new())),
        )
        .unwrap();

    let err = school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap_err();
    assert!(matches!(err, DomainError::VerificationUnavailable(_)));
    assert!(err.is_retryable());

    // No verdict was produced, so nothing was attached.
    let reloaded = school.get_enrollment(&admin, enrollment.id()).unwrap();
    assert_eq!(reloaded.lifecycle().current(), Status::Pending);
    assert!(reloaded.verification().is_none());
}

#[test]
fn concurrent_decisions_have_exactly_one_winner() {
    let certificates = Arc::new(CertificateStore::new());
    let school = Arc::new(SchoolService::new(certificates.clone()));

    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);
    let child = SubjectId::new();
    let cert = issue_cert(&certificates, child, 180);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(child, Some(cert.id)))
        .unwrap();
    let id = enrollment.id();

    let handles: Vec<_> = [Status::Approved, Status::Rejected, Status::Rejected]
        .into_iter()
        .map(|to| {
            let school = Arc::clone(&school);
            let admin = admin.clone();
            std::thread::spawn(move || school.transition_enrollment(&admin, id, to, None))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for r in &results {
        if let Err(e) = r {
            assert!(
                matches!(
                    e,
                    DomainError::InvalidTransition { .. } | DomainError::Conflict(_)
                ),
                "loser saw {e:?}"
            );
        }
    }
    assert_eq!(
        school.enrollment_transitions(&admin, id).unwrap().len(),
        1
    );
}

#[test]
fn cross_domain_flow_through_both_services() {
    // Health side issues the certificate; school side verifies it.
    let certificates = Arc::new(CertificateStore::new());
    let health = HealthService::new(certificates.clone());
    let school = SchoolService::new(certificates);

    let health_admin = claim(Role::HealthAdmin);
    let doctor_claim = claim(Role::Doctor);
    let parent = claim(Role::Parent);
    let school_admin = claim(Role::SchoolAdmin);
    let child = SubjectId::new();

    health
        .register_doctor(
            &health_admin,
            doctor_claim.subject_id,
            "Dunja".to_string(),
            "Ilic".to_string(),
            Some("pediatrics".to_string()),
        )
        .unwrap();

    let child_patient = health
        .register_patient(
            &doctor_claim,
            Some(child),
            "Iva".to_string(),
            "Novak".to_string(),
            None,
        )
        .unwrap();

    let now = Utc::now();
    let cert = health
        .issue_certificate(
            &doctor_claim,
            child_patient.id,
            "enrollment".to_string(),
            now.date_naive(),
            (now + Duration::days(365)).date_naive(),
            None,
        )
        .unwrap();

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(child, Some(cert.id)))
        .unwrap();
    let decision = school
        .transition_enrollment(&school_admin, enrollment.id(), Status::Approved, None)
        .unwrap();

    assert_eq!(decision.enrollment.lifecycle().current(), Status::Approved);
    assert!(decision.student_id.is_some());
}

#[test]
fn revocation_after_commit_does_not_reopen_the_approval() {
    // The verification record is a snapshot: certificates expiring later do
    // not retroactively invalidate a committed approval.
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates.clone());

    let parent = claim(Role::Parent);
    let admin = claim(Role::SchoolAdmin);
    let child = SubjectId::new();
    let cert = issue_cert(&certificates, child, 1);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(child, Some(cert.id)))
        .unwrap();
    school
        .transition_enrollment(&admin, enrollment.id(), Status::Approved, None)
        .unwrap();

    // The certificate window ends tomorrow; the committed record still reads
    // `valid` and is never revisited.
    let reloaded = school.get_enrollment(&admin, enrollment.id()).unwrap();
    let record = reloaded.verification().unwrap();
    assert_eq!(record.outcome, VerificationOutcome::Valid);
    assert_eq!(reloaded.lifecycle().current(), Status::Approved);
}

#[test]
fn unauthorized_roles_cannot_probe_entity_existence() {
    let certificates = Arc::new(CertificateStore::new());
    let school = SchoolService::new(certificates);

    let parent = claim(Role::Parent);
    let patient = claim(Role::Patient);

    let enrollment = school
        .submit_enrollment(&parent, enrollment_request(SubjectId::new(), None))
        .unwrap();

    // A health-domain patient gets the same answer for a real id and a
    // made-up one.
    let real = school
        .transition_enrollment(&patient, enrollment.id(), Status::Approved, None)
        .unwrap_err();
    let fake = school
        .transition_enrollment(&patient, civica_core::EntityId::new(), Status::Approved, None)
        .unwrap_err();
    assert_eq!(real, DomainError::Unauthorized);
    assert_eq!(real, fake);

    // A foreign parent cannot tell the entity from a missing one either.
    let other_parent = claim(Role::Parent);
    let foreign = school
        .get_enrollment(&other_parent, enrollment.id())
        .unwrap_err();
    assert_eq!(foreign, DomainError::NotFound);
}
