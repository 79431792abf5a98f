// ── Accessory façade ──
//
// Wires the hub-facing get/set hooks to the reader and writer, owns the
// previous-state caches used for change logging, and manages the poller
// lifecycle. The hub's device-object model is abstracted behind the
// `StateSink` trait and injected at construction time -- the core never
// reaches for process-wide handles.

use std::sync::{Arc, Mutex};

use guardlink_api::HttpClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AccessoryConfig;
use crate::endpoint::ActionUrls;
use crate::error::CoreError;
use crate::mapper::MapperPipeline;
use crate::poller::{self, PollEvent};
use crate::reader::{ReadOutcome, StateReader};
use crate::state::{CurrentState, TargetState};
use crate::writer::{StateWriter, WriteOutcome};

/// The hub-side notification boundary.
///
/// The core calls this exactly one way: to push an updated current-state
/// value after a write's refresh or after a poll-detected change.
pub trait StateSink: Send + Sync {
    fn push_current_state(&self, code: i64);
}

/// The virtual security-system device.
///
/// Cheaply cloneable via `Arc`. Construct with [`new`](Self::new), call
/// [`start_polling`](Self::start_polling) if drift detection is wanted,
/// and [`shutdown`](Self::shutdown) to cancel background tasks cleanly.
#[derive(Clone)]
pub struct SecuritySystemAccessory {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    urls: ActionUrls,
    reader: StateReader,
    writer: StateWriter,
    sink: Arc<dyn StateSink>,
    polling: crate::config::PollerConfig,
    // Nullable so the very first observation always logs as a change.
    prev_current: Mutex<Option<i64>>,
    prev_target: Mutex<Option<i64>>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SecuritySystemAccessory {
    /// Build the accessory from runtime configuration.
    ///
    /// Compiles the mapper pipeline and validates the HTTP method here,
    /// so configuration mistakes fail at startup.
    pub fn new(config: AccessoryConfig, sink: Arc<dyn StateSink>) -> Result<Self, CoreError> {
        let client = Arc::new(HttpClient::new(
            &config.http_method,
            config.auth.clone(),
            &config.transport,
        )?);
        let pipeline = MapperPipeline::build(&config.mappers, config.debug)?;

        Ok(Self {
            inner: Arc::new(Inner {
                name: config.name,
                reader: StateReader::new(Arc::clone(&client), pipeline),
                writer: StateWriter::new(client, config.urls.clone()),
                urls: config.urls,
                sink,
                polling: config.polling,
                prev_current: Mutex::new(None),
                prev_target: Mutex::new(None),
                cancel: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // ── Hub get/set hooks ────────────────────────────────────────────

    /// Get hook for the CurrentState characteristic.
    pub async fn current_state(&self) -> Result<ReadOutcome, CoreError> {
        debug!("getting current state");
        let outcome = self
            .inner
            .reader
            .read(self.inner.urls.read_current_state.as_ref())
            .await?;
        if let ReadOutcome::Code(code) = outcome {
            self.note_current(code);
        }
        Ok(outcome)
    }

    /// Get hook for the TargetState characteristic.
    pub async fn target_state(&self) -> Result<ReadOutcome, CoreError> {
        debug!("getting target state");
        let outcome = self
            .inner
            .reader
            .read(self.inner.urls.read_target_state.as_ref())
            .await?;
        if let ReadOutcome::Code(code) = outcome {
            self.note_target(code);
        }
        Ok(outcome)
    }

    /// Set hook for the TargetState characteristic.
    ///
    /// Dispatches the configured write fan-out, then refreshes current
    /// state and pushes the result to the hub -- on the error path too,
    /// since some endpoints may have succeeded and changed the system.
    pub async fn set_target_state(&self, target: TargetState) -> Result<(), CoreError> {
        info!(%target, code = target.wire_code(), "setting target state");

        let result = self.inner.writer.write(target).await;
        match &result {
            Ok(WriteOutcome::Skipped) => debug!(%target, "no write endpoint configured"),
            Ok(WriteOutcome::Completed { responses }) => {
                info!(%target, responses, "state write completed");
            }
            Err(e) => warn!(%target, error = %e, "state write reported an error"),
        }

        self.note_target(target.wire_code());
        // Best-effort refresh regardless of the write outcome.
        self.refresh_current_state().await;

        result.map(|_| ())
    }

    /// Identify hook: a trivial acknowledgment, no device logic.
    pub fn identify(&self) {
        info!(name = %self.inner.name, "identify requested");
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Re-read current state and push a valid result to the hub.
    ///
    /// Failures are logged and swallowed: a refresh is a best-effort
    /// side effect, never a reason to fail the operation that caused it.
    pub async fn refresh_current_state(&self) {
        match self
            .inner
            .reader
            .read(self.inner.urls.read_current_state.as_ref())
            .await
        {
            Ok(ReadOutcome::Code(code)) => {
                self.note_current(code);
                self.inner.sink.push_current_state(code);
            }
            Ok(ReadOutcome::Invalid) => {
                warn!("refreshed current state is not a valid code; not propagated");
            }
            Ok(ReadOutcome::Skipped) => {}
            Err(e) => warn!(error = %e, "current-state refresh failed"),
        }
    }

    // ── Polling lifecycle ────────────────────────────────────────────

    /// Spawn one poller per configured read channel.
    ///
    /// With polling disabled this creates no background activity at all.
    pub fn start_polling(&self) {
        if !self.inner.polling.enabled {
            debug!("polling disabled");
            return;
        }

        let interval = self.inner.polling.interval;
        let mut tasks = self.inner.tasks.lock().expect("task list lock poisoned");

        if self.inner.urls.read_current_state.is_some() {
            let fetch_acc = self.clone();
            let notify_acc = self.clone();
            tasks.push(poller::spawn(
                "current",
                interval,
                move || {
                    let acc = fetch_acc.clone();
                    async move {
                        acc.inner
                            .reader
                            .read(acc.inner.urls.read_current_state.as_ref())
                            .await
                    }
                },
                move |event| {
                    if let PollEvent::Changed(code) = event {
                        notify_acc.note_current(code);
                        notify_acc.inner.sink.push_current_state(code);
                    }
                },
                self.inner.cancel.child_token(),
            ));
        }

        if self.inner.urls.read_target_state.is_some() {
            let fetch_acc = self.clone();
            let notify_acc = self.clone();
            tasks.push(poller::spawn(
                "target",
                interval,
                move || {
                    let acc = fetch_acc.clone();
                    async move {
                        acc.inner
                            .reader
                            .read(acc.inner.urls.read_target_state.as_ref())
                            .await
                    }
                },
                // Target drift is cached and logged, but only CurrentState
                // is ever pushed through the sink.
                move |event| {
                    if let PollEvent::Changed(code) = event {
                        notify_acc.note_target(code);
                    }
                },
                self.inner.cancel.child_token(),
            ));
        }
    }

    /// Cancel poller tasks and wait for them to stop.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.inner.tasks.lock().expect("task list lock poisoned");
            guard.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }
        debug!("accessory shut down");
    }

    // ── Change accounting ────────────────────────────────────────────

    fn note_current(&self, code: i64) {
        let mut prev = self.inner.prev_current.lock().expect("state cache lock poisoned");
        if *prev != Some(code) {
            info!(
                previous = ?*prev,
                code,
                state = %describe_current(code),
                "current state changed"
            );
        }
        *prev = Some(code);
    }

    fn note_target(&self, code: i64) {
        let mut prev = self.inner.prev_target.lock().expect("state cache lock poisoned");
        if *prev != Some(code) {
            info!(previous = ?*prev, code, "target state changed");
        }
        *prev = Some(code);
    }
}

fn describe_current(code: i64) -> String {
    CurrentState::from_wire(code)
        .map_or_else(|| format!("unknown({code})"), |s| s.to_string())
}
