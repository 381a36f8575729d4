use std::{future::Future, sync::Arc, time::Duration};

use tracing::warn;

use crate::PodaExecutor;

/// Evaluates `predicate` against every item in `inputs` concurrently, one
/// task per item, each in its own failure domain: a panic, a timeout, or a
/// `None` result from one input never affects another. Implements the
/// Parallel Peer Poller from `spec.md` §4.8 — the generic helper the
/// aggregator uses to fan out across authorities.
///
/// The output preserves input order restricted to the truthy results,
/// regardless of which task finishes first.
pub async fn poll_all<I, Y, F, Fut>(
    executor: &PodaExecutor,
    inputs: Vec<I>,
    deadline: Duration,
    predicate: F,
) -> Vec<Y>
where
    I: Send + 'static,
    Y: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Y>> + Send + 'static,
{
    let predicate = Arc::new(predicate);

    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| {
            let predicate = Arc::clone(&predicate);
            executor.spawn(async move {
                match tokio::time::timeout(deadline, predicate(input)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("peer evaluation timed out");
                        None
                    }
                }
            })
        })
        .collect();

    let mut output = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Some(value)) => output.push(value),
            Ok(None) => {}
            Err(join_error) => warn!(%join_error, "peer evaluation task panicked"),
        }
    }
    output
}
