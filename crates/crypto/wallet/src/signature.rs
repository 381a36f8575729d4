use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::WalletError;

/// A raw ed25519 signature, kept as bytes rather than the `ed25519_dalek`
/// type so it can flow through `Item` without pulling the signing crate into
/// every consumer of the bundle model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    pub fn decode(value: &str) -> Result<Self, WalletError> {
        let bytes = URL_SAFE_NO_PAD.decode(value)?;
        let bytes: [u8; 64] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| WalletError::InvalidKeyLength {
                    expected: 64,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        Signature::decode(&encoded).map_err(serde::de::Error::custom)
    }
}
