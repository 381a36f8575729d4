use std::{collections::BTreeMap, time::Duration};

use poda_bundle::{Address, Item, ItemData, index_attestations, tags};
use poda_exec_state::ExecState;
use poda_executor::{PodaExecutor, poller::poll_all};
use poda_router::{ComputeClient, Router};
use tracing::{info, warn};

use crate::options::parse_options;

/// Per-peer deadline for the Parallel Peer Poller (`spec.md` §5 "SHOULD
/// impose a per-peer deadline"). The source has no timeout at all; an
/// unbounded join is the liveness bug this guards against.
const PEER_POLL_DEADLINE: Duration = Duration::from_secs(5);

/// Bundles the two collaborator handles the aggregator needs to reach
/// peers. Cheaply `Clone` — both wrap an `mpsc::Sender`.
#[derive(Clone)]
pub struct PeerTransport {
    pub router: Router,
    pub compute_client: ComputeClient,
}

/// The Attestation Aggregator, `spec.md` §4.6. Walks `/Outbox` and
/// `/Spawn`, wrapping every outbound message whose target process declares
/// itself PoDA-governed.
pub async fn push(
    item: &Item,
    mut state: ExecState,
    executor: &PodaExecutor,
    transport: &PeerTransport,
) -> ExecState {
    info!(message_id = ?item.unsigned_id(), "running push");

    let Some(results_map) = state.results.data.as_map().cloned() else {
        return state;
    };
    let mut updated = results_map.clone();

    for key in ["/Outbox", "/Spawn"] {
        let Some(entry) = results_map.get(key) else {
            continue;
        };
        let Some(inner_map) = entry.data.as_map().cloned() else {
            // Not shaped as sub-keyed messages (e.g. an error-skip outbox
            // item) — pass through unmodified.
            continue;
        };

        let mut new_inner = BTreeMap::new();
        for (sub_key, message) in inner_map {
            let wrapped = add_attestations(&message, &state, executor, transport).await;
            new_inner.insert(sub_key, wrapped);
        }

        let mut new_entry = entry.clone();
        new_entry.data = ItemData::Map(new_inner);
        updated.insert(key.to_string(), new_entry);
    }

    state.results.data = ItemData::Map(updated);
    state
}

/// Wraps `new_msg` in an attestation bundle if its target process declares
/// `Device = PODA`; otherwise returns it unchanged.
async fn add_attestations(
    new_msg: &Item,
    state: &ExecState,
    executor: &PodaExecutor,
    transport: &PeerTransport,
) -> Item {
    let Some(process) = find_process(new_msg, state).await else {
        return new_msg.clone();
    };
    if !process
        .tags
        .iter()
        .any(|(k, v)| k == tags::DEVICE && v == tags::DEVICE_PODA)
    {
        return new_msg.clone();
    }

    let options = match parse_options(&process.tags, &state.wallet) {
        Ok(options) => options,
        Err(err) => {
            warn!(%err, "process declares PODA device but has invalid options, skipping");
            return new_msg.clone();
        }
    };

    let peer_attestations =
        poll_peer_attestations(&process, state, executor, transport, &options.authorities).await;

    let new_msg_id = new_msg.unsigned_id();
    let mut local_attestation = Item::new(ItemData::empty())
        .with_tag(tags::ATTESTATION_FOR, Address::from_bytes(new_msg_id.to_vec()).encode());
    local_attestation.sign_item(&state.wallet);

    let mut all_attestations = vec![local_attestation];
    all_attestations.extend(peer_attestations);

    let mut complete_attestations =
        Item::new(ItemData::Map(index_attestations(all_attestations))).normalize();
    complete_attestations.sign_item(&state.wallet);

    let mut bundle_map = BTreeMap::new();
    bundle_map.insert("Attestations".to_string(), complete_attestations);
    bundle_map.insert("Message".to_string(), new_msg.clone());
    let mut bundle = Item::new(ItemData::Map(bundle_map)).normalize();
    if let Some(target) = &new_msg.target {
        bundle.target = Some(target.clone());
    }
    bundle.sign_item(&state.wallet);

    bundle
}

/// Fans out to peer compute nodes for every authority but the local node
/// itself (§9 open question 2 — the source double-counts without this
/// filter, since the local node would both sign locally and answer its own
/// poll).
async fn poll_peer_attestations(
    process: &Item,
    state: &ExecState,
    executor: &PodaExecutor,
    transport: &PeerTransport,
    authorities: &[Address],
) -> Vec<Item> {
    let Some(assignment) = &state.assignment else {
        warn!("no assignment in ExecState, skipping peer poll");
        return Vec::new();
    };

    let local_address = state.wallet.to_address();
    let process_id = process.unsigned_id();
    let assignment_id = assignment.unsigned_id();

    let peers: Vec<Address> = authorities
        .iter()
        .filter(|authority| **authority != local_address)
        .cloned()
        .collect();

    let transport = transport.clone();
    poll_all(executor, peers, PEER_POLL_DEADLINE, move |authority| {
        let transport = transport.clone();
        async move {
            let node = transport.router.find(process_id, authority).await?;
            transport
                .compute_client
                .compute(node, process_id, assignment_id)
                .await
                .inspect_err(|err| warn!(%err, "peer compute failed, dropping"))
                .ok()
        }
    })
    .await
}

/// Resolves the process definition for `item`, `spec.md` §4.7. A cache miss
/// or an item with no target and no `Type: Process` tag both resolve to
/// "not a process" (`None`) — the caller treats that as a no-op.
pub async fn find_process(item: &Item, state: &ExecState) -> Option<Item> {
    if let Some(target) = &item.target {
        let id: [u8; 32] = target.as_bytes().try_into().ok()?;
        return state.store.read_message(&id).await;
    }
    if item
        .tags
        .iter()
        .any(|(k, v)| k == tags::TYPE && v == tags::TYPE_PROCESS)
    {
        return Some(item.clone());
    }
    None
}
