use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("invalid base64url encoding")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("expected a {expected}-byte key, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid ed25519 key material")]
    InvalidKeyMaterial,

    #[error("invalid ed25519 signature")]
    InvalidSignature,
}
