//! Registration lifecycle controller.
//!
//! Owns the remote notification registration for the lifetime of the agent:
//!
//! - requests notification authorization when started
//! - registers once authorization is granted and re-registers periodically
//!   (every 4 hours by default)
//! - forces a fresh registration after a registration failure
//! - syncs every new registration token to the backend in a detached task
//! - dispatches delivered remote notifications in a detached task
//!
//! Detached work reports its outcome to the injected
//! [`MetricsCollector`] and the log; failures never reach the event source.
//! Stopping the controller ends event intake and the timer but does not
//! abort syncs already in flight.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pushsync_core::event_channel;
//! use pushsync_domain::RegistrationConfig;
//! use pushsync_infra::observability::InMemoryMetrics;
//! use pushsync_infra::registration::RegistrationController;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let registrar = todo!();
//! # let sync = todo!();
//! # let dispatcher = todo!();
//! let (events_tx, events_rx) = event_channel();
//! let mut controller = RegistrationController::new(
//!     registrar,
//!     sync,
//!     dispatcher,
//!     Arc::new(InMemoryMetrics::new()),
//!     RegistrationConfig::default(),
//!     events_rx,
//! );
//!
//! controller.start().await?;
//! // ... feed events through `events_tx` ...
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use pushsync_common::MetricsCollector;
use pushsync_core::{
    EventReceiver, PushDispatchService, PushTokenSync, RegistrationEvent,
    RemoteNotificationRegistrar,
};
use pushsync_domain::{RegistrationConfig, RegistrationToken};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::registration::error::{ControllerError, ControllerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<EventReceiver>>>>;

/// Shared state for the event loop and the tasks it spawns
struct LoopContext {
    registrar: Arc<dyn RemoteNotificationRegistrar>,
    sync: Arc<dyn PushTokenSync>,
    dispatcher: PushDispatchService,
    metrics: Arc<dyn MetricsCollector>,
    config: RegistrationConfig,
}

/// Drives remote notification registration from platform events
pub struct RegistrationController {
    context: Arc<LoopContext>,
    events: Option<EventReceiver>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl RegistrationController {
    /// Create a new controller consuming `events`
    pub fn new(
        registrar: Arc<dyn RemoteNotificationRegistrar>,
        sync: Arc<dyn PushTokenSync>,
        dispatcher: PushDispatchService,
        metrics: Arc<dyn MetricsCollector>,
        config: RegistrationConfig,
        events: EventReceiver,
    ) -> Self {
        Self {
            context: Arc::new(LoopContext { registrar, sync, dispatcher, metrics, config }),
            events: Some(events),
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the controller
    ///
    /// Spawns the event loop, which first requests notification
    /// authorization.
    ///
    /// # Errors
    ///
    /// Returns error if the controller is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> ControllerResult<()> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }

        // A loop that ended on its own still holds the receiver.
        if let Some(handle) = self.task_handle.lock().await.take() {
            let events = handle.await.map_err(|e| ControllerError::TaskJoinFailed(e.to_string()))?;
            self.events = Some(events);
        }

        let events = self.events.take().ok_or(ControllerError::ChannelUnavailable)?;

        info!("Starting registration controller");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let context = Arc::clone(&self.context);
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move { Self::event_loop(context, events, cancel).await });

        *self.task_handle.lock().await = Some(handle);

        info!("Registration controller started");
        Ok(())
    }

    /// Stop the controller gracefully
    ///
    /// Cancels the event loop and the re-registration timer and awaits
    /// completion. In-flight syncs keep running.
    ///
    /// # Errors
    ///
    /// Returns error if the controller is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> ControllerResult<()> {
        if !self.is_running() {
            return Err(ControllerError::NotRunning);
        }

        info!("Stopping registration controller");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            let events = tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| ControllerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|e| ControllerError::TaskJoinFailed(e.to_string()))?;
            self.events = Some(events);
        }

        info!("Registration controller stopped");
        Ok(())
    }

    /// Check if the controller is running
    ///
    /// Running means the event loop task exists and has not finished; the
    /// loop finishes on its own when every event sender is dropped.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn event_loop(
        context: Arc<LoopContext>,
        mut events: EventReceiver,
        cancel: CancellationToken,
    ) -> EventReceiver {
        info!("Requesting notification authorization");
        if let Err(e) = context.registrar.request_authorization().await {
            error!(error = %e, "Failed to request notification authorization");
            context.metrics.increment_counter("registration.authorization_request_failed", &[]);
        }

        let mut reregister_timer: Option<Interval> = None;
        let mut pending_register: Option<Pin<Box<Sleep>>> = None;

        loop {
            let step = tokio::select! {
                _ = cancel.cancelled() => LoopStep::Cancelled,
                _ = next_tick(&mut reregister_timer) => LoopStep::Tick,
                _ = next_deadline(&mut pending_register) => LoopStep::DelayedRegister,
                event = events.recv() => LoopStep::Event(event),
            };

            match step {
                LoopStep::Cancelled => {
                    debug!("Registration event loop cancelled");
                    break;
                }
                LoopStep::Tick => {
                    info!("Periodic re-registration");
                    Self::begin_refresh(&context, &mut pending_register).await;
                }
                LoopStep::DelayedRegister => {
                    pending_register = None;
                    Self::register(&context).await;
                    context.metrics.increment_counter("registration.refreshed", &[]);
                }
                LoopStep::Event(Some(event)) => {
                    Self::handle_event(&context, event, &mut reregister_timer, &mut pending_register)
                        .await;
                }
                LoopStep::Event(None) => {
                    info!("Registration event channel closed");
                    break;
                }
            }
        }

        events
    }

    async fn handle_event(
        context: &Arc<LoopContext>,
        event: RegistrationEvent,
        reregister_timer: &mut Option<Interval>,
        pending_register: &mut Option<Pin<Box<Sleep>>>,
    ) {
        context.metrics.increment_counter("registration.events", &[("event", event.name())]);

        match event {
            RegistrationEvent::AuthorizationResolved { granted: true } => {
                info!("Notification authorization granted");
                Self::register(context).await;

                let period = context.config.reregister_interval();
                let mut timer = tokio::time::interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *reregister_timer = Some(timer);
            }
            RegistrationEvent::AuthorizationResolved { granted: false } => {
                warn!("Notification authorization denied by user");
            }
            RegistrationEvent::AuthorizationFailed { reason } => {
                error!(%reason, "Notification authorization error");
            }
            RegistrationEvent::DeviceTokenRegistered(token) => {
                info!(token = %token.to_hex(), "APNs token registered");
            }
            RegistrationEvent::RegistrationFailed { reason } => {
                error!(%reason, "Failed to register for remote notifications");
                Self::begin_refresh(context, pending_register).await;
            }
            RegistrationEvent::RegistrationTokenReceived(token) => {
                info!(token = %token.redacted(), "Registration token received");
                Self::spawn_sync(context, token);
            }
            RegistrationEvent::RemoteNotification(payload) => {
                Self::spawn_dispatch(context, payload);
            }
            RegistrationEvent::NotificationPresented(payload) => {
                info!(%payload, "Notification presented in foreground");
            }
            RegistrationEvent::NotificationOpened(payload) => {
                info!(%payload, "Notification opened");
            }
        }
    }

    async fn register(context: &LoopContext) {
        info!("Registering for remote notifications");
        if let Err(e) = context.registrar.register().await {
            error!(error = %e, "Register command failed");
            context.metrics.increment_counter("registration.command_failed", &[("command", "register")]);
        }
    }

    /// Unregister now and arm the delayed register.
    ///
    /// The delay runs inside the loop's `select!`, so events keep flowing
    /// while it is pending. A second refresh re-arms it.
    async fn begin_refresh(context: &LoopContext, pending_register: &mut Option<Pin<Box<Sleep>>>) {
        info!("Forcing remote notification re-registration");
        if let Err(e) = context.registrar.unregister().await {
            error!(error = %e, "Unregister command failed");
            context
                .metrics
                .increment_counter("registration.command_failed", &[("command", "unregister")]);
        }

        let delay = context.config.reregister_delay();
        debug!(delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "Register scheduled");
        *pending_register = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn spawn_sync(context: &Arc<LoopContext>, token: RegistrationToken) {
        let sync = Arc::clone(&context.sync);
        let metrics = Arc::clone(&context.metrics);

        tokio::spawn(async move {
            let started = Instant::now();
            match sync.sync_push_token(&token).await {
                Ok(()) => {
                    info!(token = %token.redacted(), "Token sync succeeded");
                    metrics.increment_counter("sync.success", &[]);
                }
                Err(e) => {
                    error!(token = %token.redacted(), error = %e, "Token sync failed");
                    metrics.increment_counter("sync.failure", &[("error", e.label())]);
                }
            }
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            metrics.record_timing("sync.duration_ms", elapsed_ms, &[]);
        });
    }

    fn spawn_dispatch(context: &Arc<LoopContext>, payload: Value) {
        let dispatcher = context.dispatcher.clone();
        let metrics = Arc::clone(&context.metrics);

        tokio::spawn(async move {
            match dispatcher.dispatch(&payload).await {
                Ok(_) => metrics.increment_counter("dispatch.success", &[]),
                Err(e) => {
                    error!(error = %e, "Remote notification dispatch failed");
                    metrics.increment_counter("dispatch.failure", &[("error", e.label())]);
                }
            }
        });
    }
}

enum LoopStep {
    Cancelled,
    Tick,
    DelayedRegister,
    Event(Option<RegistrationEvent>),
}

/// Wait for the next timer tick, or forever when no timer is armed.
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Wait for the pending register delay, or forever when none is armed.
async fn next_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use pushsync_core::{event_channel, EventSender, HelperLauncher};
    use pushsync_domain::{BackgroundCommand, DeviceToken, PushSyncError, Result};
    use serde_json::json;

    use super::*;
    use crate::observability::InMemoryMetrics;

    #[derive(Default)]
    struct RecordingRegistrar {
        calls: SyncMutex<Vec<(&'static str, Instant)>>,
    }

    impl RecordingRegistrar {
        fn names(&self) -> Vec<&'static str> {
            self.calls.lock().iter().map(|(name, _)| *name).collect()
        }
    }

    #[async_trait]
    impl RemoteNotificationRegistrar for RecordingRegistrar {
        async fn request_authorization(&self) -> Result<()> {
            self.calls.lock().push(("request_authorization", Instant::now()));
            Ok(())
        }

        async fn register(&self) -> Result<()> {
            self.calls.lock().push(("register", Instant::now()));
            Ok(())
        }

        async fn unregister(&self) -> Result<()> {
            self.calls.lock().push(("unregister", Instant::now()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSync {
        tokens: SyncMutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl PushTokenSync for RecordingSync {
        async fn sync_push_token(&self, token: &RegistrationToken) -> Result<()> {
            self.tokens.lock().push(token.as_str().to_string());
            if self.fail {
                Err(PushSyncError::Http { status: 401 })
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingLauncher {
        kinds: SyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl HelperLauncher for RecordingLauncher {
        async fn launch(&self, command: &BackgroundCommand) -> Result<()> {
            self.kinds.lock().push(command.kind.clone());
            Ok(())
        }
    }

    struct Harness {
        controller: RegistrationController,
        events: EventSender,
        registrar: Arc<RecordingRegistrar>,
        sync: Arc<RecordingSync>,
        launcher: Arc<RecordingLauncher>,
        metrics: Arc<InMemoryMetrics>,
    }

    fn harness(sync: RecordingSync) -> Harness {
        let (events, receiver) = event_channel();
        let registrar = Arc::new(RecordingRegistrar::default());
        let sync = Arc::new(sync);
        let launcher = Arc::new(RecordingLauncher::default());
        let metrics = Arc::new(InMemoryMetrics::new());
        let controller = RegistrationController::new(
            registrar.clone(),
            sync.clone(),
            PushDispatchService::new(launcher.clone()),
            metrics.clone(),
            RegistrationConfig::default(),
            receiver,
        );
        Harness { controller, events, registrar, sync, launcher, metrics }
    }

    /// Let spawned tasks run; paused time auto-advances while they are idle.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_requests_authorization_and_grant_registers() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();
        settle().await;
        assert_eq!(h.registrar.names(), vec!["request_authorization"]);

        h.events.send(RegistrationEvent::AuthorizationResolved { granted: true });
        settle().await;

        assert_eq!(h.registrar.names(), vec!["request_authorization", "register"]);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn denied_or_failed_authorization_does_not_register() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        h.events.send(RegistrationEvent::AuthorizationResolved { granted: false });
        h.events.send(RegistrationEvent::AuthorizationFailed { reason: "boom".into() });
        h.events.send(RegistrationEvent::DeviceTokenRegistered(DeviceToken::from_bytes(vec![1, 2])));
        settle().await;

        assert_eq!(h.registrar.names(), vec!["request_authorization"]);
        assert_eq!(h.metrics.counter("registration.events"), 3);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn registration_failure_forces_unregister_then_register() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        h.events.send(RegistrationEvent::RegistrationFailed { reason: "offline".into() });
        tokio::time::sleep(Duration::from_secs(2)).await;

        let calls = h.registrar.calls.lock().clone();
        let names: Vec<_> = calls.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["request_authorization", "unregister", "register"]);
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_secs(1));
        assert_eq!(h.metrics.counter("registration.refreshed"), 1);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn events_are_handled_while_register_delay_is_pending() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        h.events.send(RegistrationEvent::RegistrationFailed { reason: "offline".into() });
        h.events.token_refreshed(Some("tok-during-delay"));
        settle().await;

        // the sync ran well before the 1s register delay elapsed
        assert_eq!(h.sync.tokens.lock().as_slice(), &["tok-during-delay".to_string()]);
        assert_eq!(h.registrar.names(), vec!["request_authorization", "unregister"]);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.registrar.names(), vec!["request_authorization", "unregister", "register"]);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_register_delay_skips_the_register() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        h.events.send(RegistrationEvent::RegistrationFailed { reason: "offline".into() });
        settle().await;
        h.controller.stop().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(h.registrar.names(), vec!["request_authorization", "unregister"]);
        assert_eq!(h.metrics.counter("registration.refreshed"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_timer_reregisters_after_interval() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();
        h.events.send(RegistrationEvent::AuthorizationResolved { granted: true });
        settle().await;

        tokio::time::sleep(Duration::from_secs(4 * 60 * 60 - 60)).await;
        assert_eq!(h.registrar.names(), vec!["request_authorization", "register"]);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(
            h.registrar.names(),
            vec!["request_authorization", "register", "unregister", "register"]
        );
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn received_token_triggers_exactly_one_sync() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        assert!(h.events.token_refreshed(Some("tok-xyz")));
        settle().await;

        assert_eq!(h.sync.tokens.lock().as_slice(), &["tok-xyz".to_string()]);
        assert_eq!(h.metrics.counter("sync.success"), 1);
        assert_eq!(h.metrics.samples("sync.duration_ms", &[]).len(), 1);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sync_failure_is_recorded_and_not_propagated() {
        let mut h = harness(RecordingSync { fail: true, ..Default::default() });
        h.controller.start().await.unwrap();

        h.events.token_refreshed(Some("tok-1"));
        settle().await;
        h.events.token_refreshed(Some("tok-2"));
        settle().await;

        assert_eq!(h.sync.tokens.lock().len(), 2);
        assert_eq!(h.metrics.counter_with("sync.failure", &[("error", "http")]), 2);
        assert!(h.controller.is_running());
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn remote_notification_is_dispatched() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        h.events.send(RegistrationEvent::RemoteNotification(json!({
            "aps": { "content-available": 1 },
            "data": { "type": "approve" }
        })));
        h.events.send(RegistrationEvent::NotificationOpened(json!({ "id": 1 })));
        settle().await;

        assert_eq!(h.launcher.kinds.lock().as_slice(), &["approve".to_string()]);
        assert_eq!(h.metrics.counter("dispatch.success"), 1);
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_errors_and_restart() {
        let mut h = harness(RecordingSync::default());

        assert!(matches!(h.controller.stop().await, Err(ControllerError::NotRunning)));

        h.controller.start().await.unwrap();
        assert!(matches!(h.controller.start().await, Err(ControllerError::AlreadyRunning)));
        h.controller.stop().await.unwrap();
        assert!(!h.controller.is_running());
        assert!(matches!(h.controller.stop().await, Err(ControllerError::NotRunning)));

        h.controller.start().await.unwrap();
        h.events.token_refreshed(Some("after-restart"));
        settle().await;

        assert_eq!(h.sync.tokens.lock().as_slice(), &["after-restart".to_string()]);
        assert_eq!(
            h.registrar.names(),
            vec!["request_authorization", "request_authorization"]
        );
        h.controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ends_when_senders_are_dropped() {
        let mut h = harness(RecordingSync::default());
        h.controller.start().await.unwrap();

        drop(h.events);
        settle().await;

        assert!(!h.controller.is_running());
        assert!(matches!(h.controller.stop().await, Err(ControllerError::NotRunning)));
    }
}
