//! The dispatch pipeline: worker pool, retry loop, and receipt reporting.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex as SyncMutex;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinSet,
};
use tracing::{debug, error, info, warn};

use crate::{
    email::Email,
    error::{DispatchError, SendError, SettingsError},
    message::MessageBuilder,
    policy::RetryPolicy,
    receipt::Receipt,
    settings::Settings,
    transport::{SmtpSender, Transport},
};

/// A success or failure handler invoked with the terminal receipt.
pub type Callback = Arc<dyn Fn(&Receipt) + Send + Sync>;

/// State shared by every worker.
struct Shared {
    builder: MessageBuilder,
    transport: Arc<dyn Transport>,
    policy: Option<RetryPolicy>,
    on_success: Option<Callback>,
    on_failure: Option<Callback>,
}

/// Accepts emails and drives each one through build, send, retry, and
/// reporting on a bounded pool of workers.
///
/// [`send`](Self::send) enqueues work and returns immediately; outcomes are
/// observable only through the callbacks registered at construction time. A
/// caller that registers no failure callback has no way to learn of delivery
/// failure - receipts without a matching callback are silently dropped.
///
/// Each email is processed start-to-finish by exactly one worker, and retry
/// waits sleep on that worker. Receipts for different emails may arrive in
/// any order; within one email's lifecycle the order is always build, send,
/// retry, report.
pub struct Dispatcher {
    sender: SyncMutex<Option<mpsc::UnboundedSender<Email>>>,
    workers: Mutex<JoinSet<()>>,
}

impl Dispatcher {
    /// A dispatcher sending over SMTP as described by `settings`, with no
    /// callbacks registered.
    ///
    /// Must be called from within a tokio runtime: the worker pool is
    /// spawned here.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings fail validation or the SMTP
    /// transport cannot be constructed.
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        Self::builder().build(settings)
    }

    /// Start configuring a dispatcher with callbacks or a custom transport.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Enqueue an email for dispatch. Non-blocking; returns as soon as the
    /// email is queued.
    ///
    /// Once submitted, a send cannot be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] when called after [`close`](Self::close).
    /// This is the only way `send` fails; delivery failures surface through
    /// the failure callback.
    pub fn send(&self, email: Email) -> Result<(), DispatchError> {
        let guard = self.sender.lock();
        match guard.as_ref() {
            Some(tx) => tx.send(email).map_err(|_| DispatchError::Closed),
            None => Err(DispatchError::Closed),
        }
    }

    /// Stop accepting new work and wait for in-flight sends to finish.
    ///
    /// Idempotent: later calls (and concurrent `send`s) observe the closed
    /// state and return immediately.
    pub async fn close(&self) {
        self.shutdown(None).await;
    }

    /// Stop accepting new work and wait up to `timeout` for in-flight sends.
    ///
    /// Workers still running when the timeout expires are aborted, and
    /// their receipts are dropped - callbacks for those sends never fire.
    pub async fn close_with_timeout(&self, timeout: Duration) {
        self.shutdown(Some(timeout)).await;
    }

    async fn shutdown(&self, timeout: Option<Duration>) {
        // Dropping the sender closes the channel; workers drain what is
        // already queued and then exit.
        drop(self.sender.lock().take());

        let mut workers = self.workers.lock().await;
        match timeout {
            None => drain(&mut workers).await,
            Some(timeout) => {
                if tokio::time::timeout(timeout, drain(&mut workers))
                    .await
                    .is_err()
                {
                    warn!("Shutdown timeout expired; abandoning in-flight sends");
                    workers.abort_all();
                    drain(&mut workers).await;
                }
            }
        }
    }
}

async fn drain(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            if !e.is_cancelled() {
                error!(error = %e, "Dispatch worker panicked");
            }
        }
    }
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    transport: Option<Arc<dyn Transport>>,
    on_success: Option<Callback>,
    on_failure: Option<Callback>,
}

impl DispatcherBuilder {
    /// Use a custom transport instead of SMTP derived from the settings.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Invoke `callback` with every success receipt.
    ///
    /// Callbacks run synchronously on the worker that produced the receipt;
    /// a callback that blocks indefinitely starves the pool.
    #[must_use]
    pub fn on_success(mut self, callback: impl Fn(&Receipt) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Invoke `callback` with every failure receipt. Fires exactly once per
    /// failed send, after retries are exhausted - never per attempt.
    #[must_use]
    pub fn on_failure(mut self, callback: impl Fn(&Receipt) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Arc::new(callback));
        self
    }

    /// Validate the settings, spawn the worker pool, and return the
    /// dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings fail validation or the SMTP
    /// transport cannot be constructed.
    pub fn build(self, settings: Settings) -> Result<Dispatcher, SettingsError> {
        settings.validate()?;
        let settings = Arc::new(settings);

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(SmtpSender::new(&settings)?),
        };

        let shared = Arc::new(Shared {
            builder: MessageBuilder::new(Arc::clone(&settings)),
            transport,
            policy: RetryPolicy::from_settings(&settings),
            on_success: self.on_success,
            on_failure: self.on_failure,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..settings.worker_count {
            let shared = Arc::clone(&shared);
            let rx = Arc::clone(&rx);
            workers.spawn(worker_loop(worker_id, shared, rx));
        }

        info!(
            workers = settings.worker_count,
            transport = shared.transport.name(),
            retries = shared.policy.as_ref().map_or(0, |p| p.max_retries),
            "Dispatcher started"
        );

        Ok(Dispatcher {
            sender: SyncMutex::new(Some(tx)),
            workers: Mutex::new(workers),
        })
    }
}

async fn worker_loop(
    worker_id: usize,
    shared: Arc<Shared>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Email>>>,
) {
    loop {
        // Only one idle worker holds the lock at a time; it is released
        // before the email is processed.
        let email = { rx.lock().await.recv().await };
        let Some(email) = email else {
            break;
        };
        process(worker_id, &shared, email).await;
    }

    debug!(worker_id, "Dispatch worker exiting");
}

/// Drive one email from build through its terminal receipt.
async fn process(worker_id: usize, shared: &Shared, email: Email) {
    debug!(worker_id, subject = %email.subject(), "Building message");

    let message = match shared.builder.build(&email).await {
        Ok(message) => message,
        Err(e) => {
            // Bad input, not a transport condition: report immediately,
            // bypassing the retry policy.
            error!(worker_id, error = %e, "Failed to build message");
            report(shared, &Receipt::failed(email, SendError::Build(e)));
            return;
        }
    };

    let receipt = match &shared.policy {
        Some(policy) => send_with_retry(shared, policy, &message, email).await,
        None => match shared.transport.send(&message).await {
            Ok(message_id) => {
                info!(worker_id, message_id = %message_id, "Email sent");
                Receipt::delivered(email, message_id)
            }
            Err(e) => {
                error!(worker_id, error = %e, "Unable to send email");
                Receipt::failed(email, SendError::Transport(e))
            }
        },
    };

    report(shared, &receipt);
}

/// Attempt the send under the retry policy. The worker sleeps for the
/// policy's delay between attempts; any successful attempt wins, and
/// exhaustion yields a single failure receipt with the last error.
async fn send_with_retry(
    shared: &Shared,
    policy: &RetryPolicy,
    message: &lettre::Message,
    email: Email,
) -> Receipt {
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match shared.transport.send(message).await {
            Ok(message_id) => {
                info!(attempts, message_id = %message_id, "Email sent");
                return Receipt::delivered(email, message_id);
            }
            Err(e) => {
                if policy.should_retry(&e, attempts - 1) {
                    warn!(
                        attempt = attempts,
                        error = %e,
                        delay_secs = policy.delay_secs,
                        "Send attempt failed; retrying"
                    );
                    tokio::time::sleep(policy.delay()).await;
                } else {
                    error!(attempts, error = %e, "Unable to send email; giving up");
                    return Receipt::failed(email, SendError::Transport(e));
                }
            }
        }
    }
}

/// Hand the receipt to the matching callback, exactly once. A missing
/// callback drops the receipt silently.
fn report(shared: &Shared, receipt: &Receipt) {
    let callback = if receipt.success() {
        &shared.on_success
    } else {
        &shared.on_failure
    };

    if let Some(callback) = callback {
        callback(receipt);
    }
}
