//! Cross-domain certificate verification.
//!
//! The school domain never inspects health-domain storage directly: it asks a
//! [`CertificateResolver`] for a point-in-time snapshot and records the verdict
//! as a [`VerificationRecord`] on the dependent entity. The record is written
//! once and never revised: a certificate revoked or expiring after an approval
//! has committed does not reopen the approval.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use civica_core::{CertificateId, DomainError, DomainResult, SubjectId, VerificationFailure};

/// What the health domain discloses about a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSnapshot {
    pub id: CertificateId,
    /// The subject (citizen) the certificate was issued for.
    pub patient_subject_id: SubjectId,
    /// Free-form certificate type ("enrollment", "sick_leave", ...).
    pub kind: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

/// Infrastructure failure while resolving; never a verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("health-domain resolver unavailable: {0}")]
    Unavailable(String),
}

/// Read-only window into the health domain's certificate store.
///
/// A missing certificate is a typed `None`, not an error: "the resolver
/// answered and there is no such certificate" and "the resolver could not be
/// reached" lead to very different caller behavior.
pub trait CertificateResolver: Send + Sync {
    fn resolve(&self, id: CertificateId) -> Result<Option<CertificateSnapshot>, ResolveError>;
}

/// Verdict of a completed verification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Valid,
    Expired,
    NotFound,
    OwnerMismatch,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }

    /// The corresponding domain failure, if negative.
    pub fn failure(&self) -> Option<VerificationFailure> {
        match self {
            VerificationOutcome::Valid => None,
            VerificationOutcome::Expired => Some(VerificationFailure::Expired),
            VerificationOutcome::NotFound => Some(VerificationFailure::NotFound),
            VerificationOutcome::OwnerMismatch => Some(VerificationFailure::OwnerMismatch),
        }
    }
}

/// Immutable evidence snapshot attached to the dependent entity.
///
/// Attached whether the verdict was positive or negative: "evidence was
/// checked and found wanting" must stay distinguishable from "evidence was
/// never checked" when a dispute surfaces later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub certificate_id: CertificateId,
    /// Owner as reported by the health domain; absent when the certificate
    /// was not found.
    pub certificate_owner: Option<SubjectId>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub verified_at: DateTime<Utc>,
    pub outcome: VerificationOutcome,
}

/// Cross-domain verifier.
///
/// Resolution happens *before* any entity lock is taken; callers commit the
/// resulting record together with the transition under an optimistic version
/// check.
#[derive(Clone)]
pub struct CertificateLinker {
    resolver: Arc<dyn CertificateResolver>,
}

impl CertificateLinker {
    pub fn new(resolver: Arc<dyn CertificateResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve and judge a certificate reference on behalf of
    /// `expected_owner`.
    ///
    /// Returns `Err(VerificationUnavailable)` only when the resolver itself
    /// failed; every completed verification returns `Ok` with the verdict in
    /// the record, decided in order: not found, owner mismatch, expired,
    /// valid. Ownership is matched on the patient's subject identity, not on
    /// who filed the dependent entity, since a guardian files on behalf of a
    /// dependent.
    pub fn verify(
        &self,
        certificate_id: CertificateId,
        expected_owner: SubjectId,
        now: DateTime<Utc>,
    ) -> DomainResult<VerificationRecord> {
        let snapshot = self
            .resolver
            .resolve(certificate_id)
            .map_err(|ResolveError::Unavailable(msg)| DomainError::verification_unavailable(msg))?;

        let record = match snapshot {
            None => VerificationRecord {
                certificate_id,
                certificate_owner: None,
                valid_from: None,
                valid_to: None,
                verified_at: now,
                outcome: VerificationOutcome::NotFound,
            },
            Some(cert) => {
                let outcome = if cert.patient_subject_id != expected_owner {
                    VerificationOutcome::OwnerMismatch
                } else if cert.valid_to < now.date_naive() {
                    VerificationOutcome::Expired
                } else {
                    VerificationOutcome::Valid
                };
                VerificationRecord {
                    certificate_id,
                    certificate_owner: Some(cert.patient_subject_id),
                    valid_from: Some(cert.valid_from),
                    valid_to: Some(cert.valid_to),
                    verified_at: now,
                    outcome,
                }
            }
        };

        tracing::info!(
            certificate_id = %certificate_id,
            outcome = ?record.outcome,
            "certificate verified"
        );

        Ok(record)
    }
}
