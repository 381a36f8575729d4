use poda_bundle::{Item, ItemData, codec, tags};
use poda_exec_state::ExecState;
use tracing::{info, warn};

use crate::{
    discriminator::is_user_signed,
    errors::VerifyError,
    options::DeviceOptions,
    verifier::{self, VerifiedMessage},
};

/// Whether the host should proceed with normal execution or bypass it in
/// favor of the error item already placed in `results["/Outbox"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Skip,
}

/// The Pre-Execution Gate, `spec.md` §4.4. Only meaningful on
/// `Pass::PreExecution`; every other pass is the caller's responsibility
/// (`Device::execute` handles the dispatch on `pass`).
pub fn run(outer: &Item, mut state: ExecState, options: &DeviceOptions) -> (Outcome, ExecState) {
    let Some(message) = outer.data.as_map().and_then(|map| map.get("Message")) else {
        return (Outcome::Ok, state);
    };

    if is_user_signed(message) {
        info!("user-signed message, bypassing validation");
        return (Outcome::Ok, state);
    }

    match verifier::verify(message, options) {
        Err(err) => {
            warn!(reason = err.reason(), "pre-exec validation failed");
            error_skip(&mut state, err);
            (Outcome::Skip, state)
        }
        Ok(verified) => {
            publish_attestations(&mut state, &verified);
            state.arg_prefix = vec![unwrap_outer(outer, verified.content)];
            info!("validated process message, quorum met");
            (Outcome::Ok, state)
        }
    }
}

/// Writes `/Attestations/<EncodedSigner>` for every attestation in the
/// verified set. Later signers with the same encoded address overwrite
/// earlier ones — ordering is deliberately irrelevant.
fn publish_attestations(state: &mut ExecState, verified: &VerifiedMessage) {
    for attestation in verified.attestations.values() {
        let Some(signer) = codec::signer(attestation) else {
            continue;
        };
        let path = format!("/Attestations/{}", signer.encode());
        let payload = match &attestation.data {
            ItemData::Bytes(bytes) => bytes.clone(),
            ItemData::Map(_) => serde_json_bytes(attestation),
        };
        state.vfs.insert(path, payload);
    }
}

fn serde_json_bytes(attestation: &Item) -> Vec<u8> {
    serde_json::to_vec(attestation).unwrap_or_default()
}

/// Strips one layer of wrapping: the same `OuterItem`, but with
/// `data["Message"]` replaced by the verified `Content` item, so the
/// executor sees the actual message instead of the PoDA envelope.
fn unwrap_outer(outer: &Item, content: Item) -> Item {
    let mut unwrapped = outer.clone();
    if let ItemData::Map(map) = &mut unwrapped.data {
        map.insert("Message".to_string(), content);
    }
    unwrapped
}

/// Builds the signed error-skip outbox item (`spec.md` §4.5) and installs
/// it at `results["/Outbox"]`, replacing whatever was there. Deliberately
/// has no debug delay — the source's 10-second sleep here was a development
/// artifact the spec explicitly says must not ship.
fn error_skip(state: &mut ExecState, err: VerifyError) {
    let mut outbox_item = Item::new(ItemData::Bytes(err.reason().as_bytes().to_vec()))
        .with_tag(tags::ERROR, tags::ERROR_PODA);
    outbox_item.sign_item(&state.wallet);
    state.set_result("/Outbox", outbox_item);
}
