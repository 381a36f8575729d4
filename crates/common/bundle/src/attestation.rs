use std::collections::BTreeMap;

use crate::{item::Item, tags};

/// A mapping from opaque string keys (typically decimal indices) to
/// attestation items. Keys carry no meaning; only the values do.
pub type AttestationSet = BTreeMap<String, Item>;

/// Builds the canonical `AttestationSet` encoding used by the aggregator:
/// `["1", "2", ...]` zipped with `attestations` in order.
pub fn index_attestations(attestations: Vec<Item>) -> AttestationSet {
    attestations
        .into_iter()
        .enumerate()
        .map(|(index, attestation)| ((index + 1).to_string(), attestation))
        .collect()
}

/// Implements the three binding forms from `spec.md` §3 ("Attestation"): the
/// attestation's unsigned ID equals `target_unsigned_id`, or it carries an
/// `Attestation-For` tag naming it, or it transitively contains an item with
/// that unsigned ID.
pub fn attests_for(attestation: &Item, target_unsigned_id: &[u8; 32]) -> bool {
    if &attestation.unsigned_id() == target_unsigned_id {
        return true;
    }
    let encoded_target = poda_wallet::Address::from_bytes(target_unsigned_id.to_vec()).encode();
    if attestation
        .tag(tags::ATTESTATION_FOR)
        .is_some_and(|value| value == encoded_target)
    {
        return true;
    }
    attestation.member(target_unsigned_id)
}
