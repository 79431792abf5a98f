// ── Drift-detecting poller ──
//
// One poller task per read channel (current, target), each with its own
// previous-value cache and its own timer. Scheduling is long-poll style:
// the next fetch is armed only after the previous fetch's result has
// been handled, so a slow endpoint can never pile up in-flight requests.
// A failed fetch is reported and polling continues -- errors never stop
// a poller. Shutdown is a clean cancellation, not process exit.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::reader::ReadOutcome;

/// Notification emitted by a poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The fetched value differs from the previously emitted one.
    /// The very first successful fetch always counts as a change.
    Changed(i64),
    /// The fetch failed; polling continues.
    Failed(String),
}

/// Spawn a poll loop for one state channel.
///
/// `fetch` is invoked, its outcome compared against the channel's
/// previous value, and `notify` called on change or error; only then is
/// the interval timer armed for the next cycle. Cancelling the token
/// stops the loop at the next wait point.
pub fn spawn<F, Fut, N>(
    channel: &'static str,
    interval: Duration,
    fetch: F,
    mut notify: N,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<ReadOutcome, CoreError>> + Send,
    N: FnMut(PollEvent) + Send + 'static,
{
    tokio::spawn(async move {
        debug!(channel, interval_ms = interval.as_millis(), "poller started");
        let mut previous: Option<i64> = None;

        loop {
            match fetch().await {
                Ok(ReadOutcome::Code(code)) => {
                    // previous == None on the first cycle, so the first
                    // read always registers as a change.
                    if previous != Some(code) {
                        info!(channel, previous = ?previous, code, "poll detected state change");
                        notify(PollEvent::Changed(code));
                    }
                    previous = Some(code);
                }
                Ok(ReadOutcome::Invalid) => {
                    warn!(channel, "poll produced an invalid state; ignored");
                }
                Ok(ReadOutcome::Skipped) => {
                    // Channel lost its endpoint -- nothing left to poll.
                    debug!(channel, "poll channel unconfigured, poller exiting");
                    break;
                }
                Err(e) => {
                    warn!(channel, error = %e, "poll fetch failed; will retry");
                    notify(PollEvent::Failed(e.to_string()));
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        debug!(channel, "poller stopped");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn first_fetch_always_emits_a_change() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let handle = spawn(
            "current",
            Duration::from_millis(5),
            || async { Ok(ReadOutcome::Code(3)) },
            move |event| {
                let _ = tx.send(event);
            },
            cancel.clone(),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event, PollEvent::Changed(3));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn unchanged_values_are_not_re_emitted() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let fetch_counter = Arc::clone(&counter);

        let handle = spawn(
            "current",
            Duration::from_millis(1),
            move || {
                let n = fetch_counter.fetch_add(1, Ordering::SeqCst);
                // same value twice, then a new one
                async move { Ok(ReadOutcome::Code(if n < 2 { 1 } else { 2 })) }
            },
            move |event| {
                let _ = tx.send(event);
            },
            cancel.clone(),
        );

        assert_eq!(rx.recv().await.unwrap(), PollEvent::Changed(1));
        assert_eq!(rx.recv().await.unwrap(), PollEvent::Changed(2));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn errors_are_reported_and_polling_continues() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let fetch_counter = Arc::clone(&counter);

        let handle = spawn(
            "target",
            Duration::from_millis(1),
            move || {
                let n = fetch_counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(CoreError::Mapper {
                            message: "boom".into(),
                        })
                    } else {
                        Ok(ReadOutcome::Code(0))
                    }
                }
            },
            move |event| {
                let _ = tx.send(event);
            },
            cancel.clone(),
        );

        assert!(matches!(rx.recv().await.unwrap(), PollEvent::Failed(_)));
        assert_eq!(rx.recv().await.unwrap(), PollEvent::Changed(0));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn fetches_never_overlap_even_when_slow() {
        // Fetch latency (20ms) far exceeds the interval (1ms); the N+1-th
        // fetch must still wait for the N-th to complete.
        let cancel = CancellationToken::new();
        let in_flight = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicU32::new(0));

        let fetch_in_flight = Arc::clone(&in_flight);
        let fetch_overlapped = Arc::clone(&overlapped);
        let fetch_completed = Arc::clone(&completed);

        let handle = spawn(
            "current",
            Duration::from_millis(1),
            move || {
                let in_flight = Arc::clone(&fetch_in_flight);
                let overlapped = Arc::clone(&fetch_overlapped);
                let completed = Arc::clone(&fetch_completed);
                async move {
                    if in_flight.swap(true, Ordering::SeqCst) {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.store(false, Ordering::SeqCst);
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(ReadOutcome::Code(1))
                }
            },
            |_| {},
            cancel.clone(),
        );

        // Long enough for several cycles.
        tokio::time::sleep(Duration::from_millis(120)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(completed.load(Ordering::SeqCst) >= 2, "expected several cycles");
        assert!(!overlapped.load(Ordering::SeqCst), "fetches overlapped");
    }

    #[tokio::test]
    async fn unconfigured_channel_stops_the_poller() {
        let cancel = CancellationToken::new();
        let handle = spawn(
            "target",
            Duration::from_millis(1),
            || async { Ok(ReadOutcome::Skipped) },
            |_| {},
            cancel.clone(),
        );

        // Exits on its own, no cancellation needed.
        handle.await.unwrap();
    }
}
