//! Live queries: re-deliver a query result every time a relevant table changes.

use crate::domain::events::StoreEvent;
use crate::error::StoreResult;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Emits the current result first, then a fresh result after each relevant change.
pub type LiveStream<T> = BoxStream<'static, StoreResult<T>>;

struct LiveState<I, F> {
    events: broadcast::Receiver<StoreEvent>,
    interest: I,
    fetch: F,
    primed: bool,
}

/// `events` must be subscribed before the first fetch runs so no change is missed.
pub(crate) fn live_query<T, I, F, Fut>(events: broadcast::Receiver<StoreEvent>, interest: I, fetch: F) -> LiveStream<T>
where
    T: Send + 'static,
    I: Fn(&StoreEvent) -> bool + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<T>> + Send + 'static,
{
    let state = LiveState { events, interest, fetch, primed: false };
    stream::unfold(state, |mut state| async move {
        if state.primed && !wait_for_change(&mut state.events, &state.interest).await {
            return None;
        }
        state.primed = true;
        let result = (state.fetch)().await;
        Some((result, state))
    })
    .boxed()
}

/// Returns `false` once the bus is gone.
async fn wait_for_change<I>(events: &mut broadcast::Receiver<StoreEvent>, interest: &I) -> bool
where
    I: Fn(&StoreEvent) -> bool,
{
    loop {
        match events.recv().await {
            Ok(event) if interest(&event) => break,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Live query fell behind; re-running");
                break;
            }
            Err(RecvError::Closed) => return false,
        }
    }
    // A checkout fires several events at once; one re-run covers them all.
    while let Ok(_) | Err(TryRecvError::Lagged(_)) = events.try_recv() {}
    true
}
