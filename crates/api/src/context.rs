use civica_auth::IdentityClaim;

/// Authenticated caller context for a request.
///
/// Immutable and present on every protected route; handlers pass the claim
/// down to the services explicitly; there is no ambient session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    claim: IdentityClaim,
}

impl CallerContext {
    pub fn new(claim: IdentityClaim) -> Self {
        Self { claim }
    }

    pub fn claim(&self) -> &IdentityClaim {
        &self.claim
    }
}
