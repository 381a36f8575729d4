use poda_bundle::Address;
use tokio::sync::{mpsc, oneshot};

use crate::node_handle::NodeHandle;

/// Request/response over a channel, the same shape the teacher's
/// `NetworkChannel` uses for talking to the networking task: the caller owns
/// a cheap, cloneable sender and never touches the receiving actor's state
/// directly.
#[derive(Debug)]
pub enum RouterRequest {
    FindComputeNode {
        process_id: [u8; 32],
        authority: Address,
        reply: oneshot::Sender<Option<NodeHandle>>,
    },
}

/// Resolves `(process_id, authority)` pairs to a peer handle responsible for
/// computing that authority's attestation, per `spec.md` §6 `Router::find`.
#[derive(Clone)]
pub struct Router {
    sender: mpsc::Sender<RouterRequest>,
}

impl Router {
    pub fn new(sender: mpsc::Sender<RouterRequest>) -> Self {
        Self { sender }
    }

    /// Returns `None` on any routing failure — missing route, closed
    /// channel, disconnected reply — per the "collaborator failures degrade
    /// gracefully" policy in `spec.md` §7.
    pub async fn find(&self, process_id: [u8; 32], authority: Address) -> Option<NodeHandle> {
        let (reply, response) = oneshot::channel();
        if self
            .sender
            .send(RouterRequest::FindComputeNode {
                process_id,
                authority,
                reply,
            })
            .await
            .is_err()
        {
            return None;
        }
        response.await.ok().flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn returns_none_when_no_actor_is_listening() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let router = Router::new(sender);

        let found = router
            .find([0u8; 32], Address::from_bytes(vec![1, 2, 3]))
            .await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn forwards_actor_response() {
        let (sender, mut receiver) = mpsc::channel(1);
        tokio::spawn(async move {
            if let Some(RouterRequest::FindComputeNode { reply, .. }) = receiver.recv().await {
                let _ = reply.send(Some(NodeHandle("peer-1".to_string())));
            }
        });

        let router = Router::new(sender);
        let found = router
            .find([0u8; 32], Address::from_bytes(vec![1, 2, 3]))
            .await;
        assert_eq!(found, Some(NodeHandle("peer-1".to_string())));
    }
}
