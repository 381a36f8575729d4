pub mod attestation;
pub mod codec;
pub mod item;
pub mod tags;

pub use attestation::{AttestationSet, attests_for, index_attestations};
pub use item::{IdKind, Item, ItemData};
pub use poda_wallet::Address;
