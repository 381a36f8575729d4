use poda_bundle::Item;
use tokio::sync::{mpsc, oneshot};

use crate::{errors::ComputeError, node_handle::NodeHandle};

#[derive(Debug)]
pub enum ComputeRequest {
    Compute {
        node: NodeHandle,
        process_id: [u8; 32],
        assignment_id: [u8; 32],
        reply: oneshot::Sender<Result<Item, ComputeError>>,
    },
}

/// Asks a peer compute node to validate and attest to a message, per
/// `spec.md` §6 `compute(node_handle, process_id, assignment_id)`.
#[derive(Clone)]
pub struct ComputeClient {
    sender: mpsc::Sender<ComputeRequest>,
}

impl ComputeClient {
    pub fn new(sender: mpsc::Sender<ComputeRequest>) -> Self {
        Self { sender }
    }

    pub async fn compute(
        &self,
        node: NodeHandle,
        process_id: [u8; 32],
        assignment_id: [u8; 32],
    ) -> Result<Item, ComputeError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ComputeRequest::Compute {
                node,
                process_id,
                assignment_id,
                reply,
            })
            .await
            .map_err(|_| ComputeError::Unreachable)?;
        response.await.map_err(|_| ComputeError::Unreachable)?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use poda_bundle::ItemData;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn forwards_successful_response() {
        let (sender, mut receiver) = mpsc::channel(1);
        tokio::spawn(async move {
            if let Some(ComputeRequest::Compute { reply, .. }) = receiver.recv().await {
                let _ = reply.send(Ok(Item::new(ItemData::empty())));
            }
        });

        let client = ComputeClient::new(sender);
        let result = client
            .compute(NodeHandle("peer-1".to_string()), [0u8; 32], [1u8; 32])
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn closed_channel_is_unreachable() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let client = ComputeClient::new(sender);

        let err = client
            .compute(NodeHandle("peer-1".to_string()), [0u8; 32], [1u8; 32])
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::Unreachable));
    }
}
