use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;

use crate::{address::Address, errors::WalletError, signature::Signature};

/// A local signing key. Every `ExecState` carries exactly one: the node's own
/// identity for signing the local attestation and the error-skip outbox item.
#[derive(Clone, Debug)]
pub struct Wallet {
    signing_key: SigningKey,
}

impl Wallet {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let bytes: [u8; 32] =
            bytes
                .try_into()
                .map_err(|_| WalletError::InvalidKeyLength {
                    expected: 32,
                    actual: bytes.len(),
                })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    pub fn to_address(&self) -> Address {
        Address::from_bytes(self.signing_key.verifying_key().to_bytes().to_vec())
    }

    /// The raw 32-byte seed, for a host that wants to persist the identity
    /// across restarts. Round-trips through [`Wallet::from_bytes`].
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

/// Checks a signature against the raw public key bytes carried by an item,
/// mirroring the bundle library's `verify_item` collaborator contract.
pub fn verify(owner: &[u8], message: &[u8], signature: &Signature) -> bool {
    let Ok(owner): Result<[u8; 32], _> = owner.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&owner) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &signature).is_ok()
}
