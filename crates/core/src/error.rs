//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Why a certificate verification did not come back `valid`.
///
/// These are *completed* negative verdicts. Infrastructure failure while
/// resolving a certificate is `DomainError::VerificationUnavailable`, never one
/// of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    /// No certificate exists under the referenced id.
    NotFound,
    /// The certificate belongs to a different subject than the one the
    /// dependent entity was filed for.
    OwnerMismatch,
    /// The certificate's validity window ended before the verification time.
    Expired,
}

impl core::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            VerificationFailure::NotFound => f.write_str("not_found"),
            VerificationFailure::OwnerMismatch => f.write_str("owner_mismatch"),
            VerificationFailure::Expired => f.write_str("expired"),
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// role denials, illegal transitions, conflicts). Infrastructure concerns
/// belong elsewhere, with the single exception of `VerificationUnavailable`,
/// which exists precisely so a failed cross-domain call is never mistaken for
/// a negative verification verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller's role does not permit the operation.
    ///
    /// Callers lacking any permission on a resource must not be able to tell
    /// this apart from `NotFound`; the HTTP layer renders both identically for
    /// entity-scoped operations.
    #[error("unauthorized")]
    Unauthorized,

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// The requested status change has no edge from the entity's current
    /// state in its kind's workflow.
    #[error("invalid transition: {from} -> {requested}")]
    InvalidTransition { from: String, requested: String },

    /// Certificate verification completed and came back negative.
    #[error("certificate verification failed: {0}")]
    VerificationFailed(VerificationFailure),

    /// The health-domain resolver could not be reached or timed out.
    /// Retryable; no verdict was produced.
    #[error("certificate verification unavailable: {0}")]
    VerificationUnavailable(String),

    /// An at-most-once provisioning guard tripped.
    #[error("duplicate provisioning: {0}")]
    DuplicateProvisioning(String),

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(from: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            requested: requested.into(),
        }
    }

    pub fn verification_unavailable(msg: impl Into<String>) -> Self {
        Self::VerificationUnavailable(msg.into())
    }

    pub fn duplicate_provisioning(msg: impl Into<String>) -> Self {
        Self::DuplicateProvisioning(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether retrying the same call without new evidence can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::VerificationUnavailable(_) | DomainError::Conflict(_)
        )
    }
}
