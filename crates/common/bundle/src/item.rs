use std::collections::BTreeMap;

use poda_wallet::{Address, Signature, Wallet, verify};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The payload carried by an item: either an opaque byte string, or a
/// mapping from string keys to nested items. `BTreeMap` gives us a
/// lexicographically-sorted iteration order for free, which is exactly the
/// canonicalization `normalize` needs for nested maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemData {
    Bytes(Vec<u8>),
    Map(BTreeMap<String, Item>),
}

impl ItemData {
    pub fn as_map(&self) -> Option<&BTreeMap<String, Item>> {
        match self {
            ItemData::Map(map) => Some(map),
            ItemData::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ItemData::Bytes(bytes) => Some(bytes),
            ItemData::Map(_) => None,
        }
    }

    pub fn empty() -> Self {
        ItemData::Bytes(Vec::new())
    }
}

/// The universal transport envelope. See `spec.md` §3 for the field
/// semantics; this type is the Rust rendering of "Bundle / Item (`tx`)".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Address>,
    #[serde(default)]
    pub tags: Vec<(String, String)>,
    pub data: ItemData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

/// Selects which of the two content hashes `id` computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Hash over the canonical form with `owner`/`signature` cleared — the
    /// content identity, stable across signing.
    Unsigned,
    /// Hash over the canonical form as-is, including `owner`/`signature`.
    Signed,
}

#[derive(Serialize)]
struct Canonical<'a> {
    target: &'a Option<Address>,
    tags: &'a Vec<(String, String)>,
    data: &'a ItemData,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<&'a Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<&'a Signature>,
}

impl Item {
    pub fn new(data: ItemData) -> Self {
        Self {
            target: None,
            tags: Vec::new(),
            data,
            owner: None,
            signature: None,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn with_target(mut self, target: Address) -> Self {
        self.target = Some(target);
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn tag_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.tags
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn canonical_bytes(&self, kind: IdKind) -> Vec<u8> {
        let canonical = Canonical {
            target: &self.target,
            tags: &self.tags,
            data: &self.data,
            owner: match kind {
                IdKind::Signed => self.owner.as_ref(),
                IdKind::Unsigned => None,
            },
            signature: match kind {
                IdKind::Signed => self.signature.as_ref(),
                IdKind::Unsigned => None,
            },
        };
        serde_json::to_vec(&canonical).expect("canonical item always serializes")
    }

    /// Content hash of the item's canonical form. See `IdKind` for what
    /// "unsigned" vs "signed" strips.
    pub fn id(&self, kind: IdKind) -> [u8; 32] {
        let bytes = self.canonical_bytes(kind);
        Sha256::digest(bytes).into()
    }

    pub fn unsigned_id(&self) -> [u8; 32] {
        self.id(IdKind::Unsigned)
    }

    pub fn signed_id(&self) -> [u8; 32] {
        self.id(IdKind::Signed)
    }

    /// The address of the signer, derived from `owner`. `None` for an
    /// unsigned item.
    pub fn signer(&self) -> Option<Address> {
        self.owner
            .as_ref()
            .map(|owner| Address::from_bytes(owner.clone()))
    }

    /// Validates the signature over the unsigned canonical form using the
    /// embedded `owner` public key.
    pub fn verify_item(&self) -> bool {
        let (Some(owner), Some(signature)) = (&self.owner, &self.signature) else {
            return false;
        };
        verify(owner, &self.canonical_bytes(IdKind::Unsigned), signature)
    }

    /// Signs the item's unsigned canonical form with `wallet`, setting
    /// `owner` and `signature`.
    pub fn sign_item(&mut self, wallet: &Wallet) {
        self.owner = Some(wallet.to_address().as_bytes().to_vec());
        let message = self.canonical_bytes(IdKind::Unsigned);
        self.signature = Some(wallet.sign(&message));
    }

    /// Canonicalizes nested maps recursively. `BTreeMap` already iterates in
    /// sorted key order, so this mainly exists to give nested items the same
    /// treatment and to match the bundle library's documented contract.
    pub fn normalize(&self) -> Item {
        let data = match &self.data {
            ItemData::Bytes(bytes) => ItemData::Bytes(bytes.clone()),
            ItemData::Map(map) => {
                ItemData::Map(map.iter().map(|(k, v)| (k.clone(), v.normalize())).collect())
            }
        };
        Item {
            target: self.target.clone(),
            tags: self.tags.clone(),
            data,
            owner: self.owner.clone(),
            signature: self.signature.clone(),
        }
    }

    /// True if `id` appears as the unsigned ID of `self` or any item nested
    /// (transitively) in `self.data`.
    pub fn member(&self, id: &[u8; 32]) -> bool {
        if &self.unsigned_id() == id {
            return true;
        }
        match &self.data {
            ItemData::Bytes(_) => false,
            ItemData::Map(map) => map.values().any(|item| item.member(id)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use poda_wallet::Wallet;

    use super::*;

    #[test]
    fn unsigned_id_is_stable_across_signing() {
        let item = Item::new(ItemData::Bytes(b"hello".to_vec())).with_tag("Foo", "Bar");
        let before = item.unsigned_id();

        let mut signed = item.clone();
        signed.sign_item(&Wallet::generate());

        assert_eq!(before, signed.unsigned_id());
        assert_ne!(item.signed_id(), signed.signed_id());
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let wallet = Wallet::generate();
        let mut item = Item::new(ItemData::Bytes(b"payload".to_vec()));
        item.sign_item(&wallet);

        assert!(item.verify_item());
        assert_eq!(item.signer(), Some(wallet.to_address()));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let wallet = Wallet::generate();
        let mut item = Item::new(ItemData::Bytes(b"payload".to_vec()));
        item.sign_item(&wallet);

        let other = Wallet::generate();
        item.signature = Some(other.sign(b"different"));
        assert!(!item.verify_item());
    }

    #[test]
    fn unsigned_item_never_verifies() {
        let item = Item::new(ItemData::Bytes(b"payload".to_vec()));
        assert!(!item.verify_item());
    }

    #[test]
    fn member_finds_nested_unsigned_id() {
        let inner = Item::new(ItemData::Bytes(b"inner".to_vec()));
        let inner_id = inner.unsigned_id();

        let mut map = BTreeMap::new();
        map.insert("Message".to_string(), inner);
        let outer = Item::new(ItemData::Map(map));

        assert!(outer.member(&inner_id));
        assert!(!outer.member(&[0u8; 32]));
    }

    #[test]
    fn normalize_is_idempotent() {
        let inner = Item::new(ItemData::Bytes(b"inner".to_vec()));
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), inner);
        let outer = Item::new(ItemData::Map(map));

        assert_eq!(outer.normalize(), outer.normalize().normalize());
    }
}
