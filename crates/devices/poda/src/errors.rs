use thiserror::Error;

/// Parse-time failures from the Options Parser (`spec.md` §4.1). Fatal:
/// propagated straight to the host, never turned into an outbox item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("process is missing a Quorum tag")]
    MissingQuorum,

    #[error("Quorum tag value {0:?} is not a valid base-10 integer")]
    InvalidQuorum(String),

    #[error("process declares no Authority tags")]
    EmptyAuthoritySet,

    #[error("Authority tag value {0:?} is not a valid address")]
    InvalidAuthority(String),
}

/// Validation failures from the Attestation Verifier (`spec.md` §4.3, §7).
/// Carries the exact reason strings the error-skip outbox item uses.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Required PoDA messages missing")]
    MalformedBundle,

    #[error("Invalid attestations")]
    BadSignature,

    #[error("Not enough validations")]
    QuorumUnmet,
}

impl VerifyError {
    /// The reason bytes carried in the signed error-skip outbox item.
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::MalformedBundle => "Required PoDA messages missing",
            VerifyError::BadSignature => "Invalid attestations",
            VerifyError::QuorumUnmet => "Not enough validations",
        }
    }
}
