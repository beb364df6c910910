//! Application context - dependency injection container

use std::future::Future;
use std::sync::Arc;

use pushsync_common::MetricsCollector;
use pushsync_core::{
    event_channel, HelperLauncher, PushDispatchService, PushTokenSync, RemoteNotificationRegistrar,
};
use pushsync_domain::{AgentConfig, Credentials, Result};
use pushsync_infra::http::retry_config_from_settings;
use pushsync_infra::platform::run_event_reader;
use pushsync_infra::{
    ClientCredentialsFetcher, HostBridge, HttpTransport, InMemoryMetrics, ProcessHelperLauncher,
    RegistrationController, ReqwestTransport, RetryingTransport, TokenSyncService,
};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AgentConfig,
    pub credentials: Arc<Credentials>,
    /// Retrying transport shared by every backend call
    pub transport: Arc<dyn HttpTransport>,
    pub token_sync: Arc<TokenSyncService>,
    pub dispatcher: PushDispatchService,
    pub metrics: Arc<InMemoryMetrics>,
}

impl AppContext {
    /// Build the context from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` when the configuration is invalid, or the HTTP
    /// client cannot be created.
    pub fn new_with_config(config: AgentConfig) -> Result<Self> {
        config.validate()?;

        let credentials = Arc::new(config.credentials.clone());

        let reqwest = Arc::new(ReqwestTransport::from_config(&config.transport)?);
        let transport: Arc<dyn HttpTransport> =
            Arc::new(RetryingTransport::new(reqwest, retry_config_from_settings(&config.retry)?));

        let fetcher = Arc::new(ClientCredentialsFetcher::new(
            Arc::clone(&transport),
            Arc::clone(&credentials),
        ));
        let token_sync = Arc::new(TokenSyncService::new(
            fetcher,
            Arc::clone(&transport),
            Arc::clone(&credentials),
        ));

        let dispatcher = if config.helper.enabled {
            let launcher: Arc<dyn HelperLauncher> =
                Arc::new(ProcessHelperLauncher::new(&config.helper.path));
            PushDispatchService::new(launcher)
        } else {
            info!("Helper disabled; background pushes will only be logged");
            PushDispatchService::without_helper()
        };

        info!(
            tenant = %credentials.tenant_base(),
            app_id = %credentials.app_id,
            helper_enabled = dispatcher.helper_enabled(),
            "Application context initialized"
        );

        Ok(Self {
            config,
            credentials,
            transport,
            token_sync,
            dispatcher,
            metrics: Arc::new(InMemoryMetrics::with_tracing()),
        })
    }

    /// Run the agent until `shutdown` resolves or the host closes `input`.
    ///
    /// Host events are read from `input` and registrar commands are written
    /// to `output`.
    pub async fn run<R, W, S>(&self, input: R, output: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let (events_tx, events_rx) = event_channel();
        let cancel = CancellationToken::new();

        let registrar: Arc<dyn RemoteNotificationRegistrar> = Arc::new(HostBridge::new(output));
        let sync: Arc<dyn PushTokenSync> = Arc::<TokenSyncService>::clone(&self.token_sync);
        let metrics: Arc<dyn MetricsCollector> = Arc::<InMemoryMetrics>::clone(&self.metrics);

        let mut controller = RegistrationController::new(
            registrar,
            sync,
            self.dispatcher.clone(),
            metrics,
            self.config.registration.clone(),
            events_rx,
        );

        let mut reader = tokio::spawn(run_event_reader(input, events_tx, cancel.clone()));
        controller.start().await?;

        tokio::select! {
            _ = shutdown => info!("Shutdown requested"),
            result = &mut reader => {
                match result {
                    Ok(Ok(count)) => info!(events = count, "Host event stream ended"),
                    Ok(Err(e)) => warn!(error = %e, "Host event reader failed"),
                    Err(e) => warn!(error = %e, "Host event reader task failed"),
                }
            }
        }

        cancel.cancel();
        if controller.is_running() {
            controller.stop().await?;
        }

        for (name, value) in self.metrics.counters() {
            info!(metric = %name, value, "Shutdown summary");
        }

        Ok(())
    }
}
