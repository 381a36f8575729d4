use std::collections::HashSet;

use poda_bundle::{Address, AttestationSet, Item, ItemData, attests_for, codec};
use tracing::debug;

use crate::{errors::VerifyError, options::DeviceOptions};

/// What Stage 1 extracted, handed back so the gate doesn't have to
/// re-parse the message it just validated.
#[derive(Debug)]
pub struct VerifiedMessage {
    pub attestations: AttestationSet,
    pub content: Item,
}

/// Three-stage validator from `spec.md` §4.3, short-circuited on first
/// failure: structural shape, cryptographic validity, then authority
/// membership + quorum.
pub fn verify(message: &Item, options: &DeviceOptions) -> Result<VerifiedMessage, VerifyError> {
    let (attestations, content) = structural_stage(message)?;
    cryptographic_stage(&attestations)?;
    authority_and_quorum_stage(&attestations, &content, options)?;

    Ok(VerifiedMessage {
        attestations,
        content,
    })
}

/// Stage 1: unwrap to `data`, require both `"Attestations"` and `"Message"`.
///
/// The `"Attestations"` value is itself an item; ordinarily its `data` is
/// already the flat `AttestationSet` (keys `"1"`, `"2"`, ... mapping to
/// attestation items). If it instead carries one more layer of wrapping — a
/// single `"Attestations"` key pointing at the real set, mirroring the
/// doubly-wrapped `MessageBundle` shape in `spec.md` §3 — that layer is
/// stripped too.
fn structural_stage(message: &Item) -> Result<(AttestationSet, Item), VerifyError> {
    let map = message.data.as_map().ok_or(VerifyError::MalformedBundle)?;

    let attestations_item = map
        .get("Attestations")
        .ok_or(VerifyError::MalformedBundle)?;
    let content = map.get("Message").ok_or(VerifyError::MalformedBundle)?;

    let attestations = match &attestations_item.data {
        ItemData::Map(set) => match set.get("Attestations") {
            Some(nested) if set.len() == 1 => match &nested.data {
                ItemData::Map(inner) => inner.clone(),
                ItemData::Bytes(_) => return Err(VerifyError::MalformedBundle),
            },
            _ => set.clone(),
        },
        ItemData::Bytes(_) => return Err(VerifyError::MalformedBundle),
    };

    Ok((attestations, content.clone()))
}

/// Stage 2: every attestation must carry a valid signature.
fn cryptographic_stage(attestations: &AttestationSet) -> Result<(), VerifyError> {
    for attestation in attestations.values() {
        if !codec::verify_item(attestation) {
            return Err(VerifyError::BadSignature);
        }
    }
    Ok(())
}

/// Stage 3: count attestations that are in-authority, relevant to
/// `content`, and (redundantly, per `spec.md` §4.3's defense-in-depth note)
/// cryptographically valid — deduplicated by signer, so a single authority
/// replaying one attestation under several keys can't satisfy quorum alone.
fn authority_and_quorum_stage(
    attestations: &AttestationSet,
    content: &Item,
    options: &DeviceOptions,
) -> Result<(), VerifyError> {
    let content_id = content.unsigned_id();
    let mut valid_signers: HashSet<Address> = HashSet::new();

    for attestation in attestations.values() {
        let Some(signer) = codec::signer(attestation) else {
            continue;
        };
        let valid_signer = options.authorities.contains(&signer);
        let relevant_msg = attests_for(attestation, &content_id);
        let valid_signature = codec::verify_item(attestation);

        debug!(
            signer = %signer,
            valid_signer,
            relevant_msg,
            valid_signature,
            "evaluated attestation"
        );

        if valid_signer && relevant_msg && valid_signature {
            valid_signers.insert(signer);
        }
    }

    if valid_signers.len() as u32 >= options.quorum {
        Ok(())
    } else {
        Err(VerifyError::QuorumUnmet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use poda_bundle::{ItemData, index_attestations, tags};
    use poda_wallet::Wallet;
    use rstest::rstest;

    use super::*;

    fn content_item() -> Item {
        Item::new(ItemData::Bytes(b"do the thing".to_vec()))
    }

    fn attestation_for(content: &Item, wallet: &Wallet) -> Item {
        let encoded = Address::from_bytes(content.unsigned_id().to_vec()).encode();
        let mut attestation =
            Item::new(ItemData::empty()).with_tag(tags::ATTESTATION_FOR, encoded);
        attestation.sign_item(wallet);
        attestation
    }

    fn bundle(content: Item, attestations: Vec<Item>) -> Item {
        let mut map = BTreeMap::new();
        let attestation_set = index_attestations(attestations);
        map.insert(
            "Attestations".to_string(),
            Item::new(ItemData::Map(attestation_set)),
        );
        map.insert("Message".to_string(), content);
        Item::new(ItemData::Map(map))
    }

    fn options_for(authorities: Vec<Address>, quorum: u32) -> DeviceOptions {
        DeviceOptions {
            authorities,
            quorum,
        }
    }

    #[test]
    fn missing_attestations_key_is_malformed() {
        let mut map = BTreeMap::new();
        map.insert("Message".to_string(), content_item());
        let message = Item::new(ItemData::Map(map));

        let err = verify(&message, &options_for(vec![], 1)).unwrap_err();
        assert_eq!(err, VerifyError::MalformedBundle);
    }

    #[test]
    fn raw_bytes_payload_is_malformed() {
        let message = Item::new(ItemData::Bytes(b"not a mapping".to_vec()));
        let err = verify(&message, &options_for(vec![], 1)).unwrap_err();
        assert_eq!(err, VerifyError::MalformedBundle);
    }

    #[test]
    fn s1_quorum_met_succeeds() {
        let content = content_item();
        let a = Wallet::generate();
        let b = Wallet::generate();
        let att_a = attestation_for(&content, &a);
        let att_b = attestation_for(&content, &b);

        let options = options_for(vec![a.to_address(), b.to_address()], 2);
        let message = bundle(content, vec![att_a, att_b]);

        let verified = verify(&message, &options).unwrap();
        assert_eq!(verified.attestations.len(), 2);
    }

    #[test]
    fn s2_quorum_unmet_with_insufficient_valid_attestations() {
        let content = content_item();
        let a = Wallet::generate();
        let b = Wallet::generate();
        let att_a = attestation_for(&content, &a);
        let att_b = attestation_for(&content, &b);

        // quorum requires 3, only two authorities supplied.
        let options = options_for(vec![a.to_address(), b.to_address()], 3);
        let message = bundle(content, vec![att_a, att_b]);

        let err = verify(&message, &options).unwrap_err();
        assert_eq!(err, VerifyError::QuorumUnmet);
    }

    #[test]
    fn s3_tampered_signature_fails_regardless_of_quorum() {
        let content = content_item();
        let a = Wallet::generate();
        let b = Wallet::generate();
        let c = Wallet::generate();
        let att_a = attestation_for(&content, &a);
        let att_b = attestation_for(&content, &b);
        let mut att_c = attestation_for(&content, &c);
        att_c.signature = Some(Wallet::generate().sign(b"tampered"));

        let options = options_for(
            vec![a.to_address(), b.to_address(), c.to_address()],
            1,
        );
        let message = bundle(content, vec![att_a, att_b, att_c]);

        let err = verify(&message, &options).unwrap_err();
        assert_eq!(err, VerifyError::BadSignature);
    }

    #[test]
    fn s4_non_authority_signer_does_not_count() {
        let content = content_item();
        let authority = Wallet::generate();
        let outsider = Wallet::generate();
        let att_authority = attestation_for(&content, &authority);
        let att_outsider = attestation_for(&content, &outsider);

        let options = options_for(vec![authority.to_address()], 2);
        let message = bundle(content, vec![att_authority, att_outsider]);

        let err = verify(&message, &options).unwrap_err();
        assert_eq!(err, VerifyError::QuorumUnmet);
    }

    #[test]
    fn duplicate_signer_counts_once() {
        let content = content_item();
        let a = Wallet::generate();
        let att_a1 = attestation_for(&content, &a);
        let att_a2 = attestation_for(&content, &a);

        let options = options_for(vec![a.to_address()], 2);
        let message = bundle(content, vec![att_a1, att_a2]);

        let err = verify(&message, &options).unwrap_err();
        assert_eq!(err, VerifyError::QuorumUnmet);
    }

    #[rstest]
    #[case(1, 1, true)]
    #[case(1, 2, false)]
    #[case(3, 2, true)]
    fn quorum_boundary(
        #[case] valid_attestations: u32,
        #[case] quorum: u32,
        #[case] expect_success: bool,
    ) {
        let content = content_item();
        let wallets: Vec<Wallet> = (0..valid_attestations).map(|_| Wallet::generate()).collect();
        let attestations: Vec<Item> = wallets
            .iter()
            .map(|wallet| attestation_for(&content, wallet))
            .collect();
        let authorities = wallets.iter().map(Wallet::to_address).collect();

        let options = options_for(authorities, quorum);
        let message = bundle(content, attestations);

        assert_eq!(verify(&message, &options).is_ok(), expect_success);
    }
}
