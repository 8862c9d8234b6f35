//! Web server for the portal.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::{Config, ReconcileConfig};
use crate::file::{reconcile, PortalService};
use crate::{PortalError, Result};

use super::handlers::AppState;
use super::middleware::JwtState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Reconciliation schedule.
    reconcile: ReconcileConfig,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, service: PortalService) -> Result<Self> {
        let addr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .map_err(|e| PortalError::Config(format!("invalid web server address: {e}")))?;

        let jwt_state = Arc::new(JwtState::new(
            &config.web.jwt_secret,
            config.web.access_token_expiry_secs,
        ));
        let app_state =
            AppState::new(service, jwt_state).with_portal_name(&config.portal.name);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: config.web.cors_origins.clone(),
            reconcile: config.reconcile.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the reconciliation background task.
    ///
    /// Every `interval_secs` the blob store and the access records are
    /// compared. Orphans are logged, and removed when `repair` is set. Blobs
    /// younger than `grace_secs` are left alone.
    fn start_reconcile_task(service: PortalService, config: ReconcileConfig) {
        if config.interval_secs == 0 {
            tracing::info!("Reconciliation task disabled");
            return;
        }

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
            let grace = Duration::from_secs(config.grace_secs);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let blobs = service.blobs().as_ref();
                let report = match reconcile::scan(service.database(), blobs, grace).await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!(error = %e, "Reconciliation scan failed");
                        continue;
                    }
                };

                if report.is_clean() {
                    tracing::debug!("Blob store and access records agree");
                    continue;
                }

                tracing::warn!(
                    blobs_without_record = report.blobs_without_record.len(),
                    records_without_blob = report.records_without_blob.len(),
                    "Orphans found"
                );

                if config.repair {
                    let summary = reconcile::repair(service.database(), blobs, &report).await;
                    tracing::info!(
                        blobs_removed = summary.blobs_removed,
                        records_removed = summary.records_removed,
                        failed = summary.failed,
                        "Orphans repaired"
                    );
                }
            }
        });

        tracing::info!(
            interval_secs = config.interval_secs,
            repair = config.repair,
            grace_secs = config.grace_secs,
            "Reconciliation task started"
        );
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router)> {
        let service = self.app_state.service.clone();
        let router = create_router(self.app_state, &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;

        // Start background work after successful bind
        Self::start_reconcile_task(service, self.reconcile);

        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
