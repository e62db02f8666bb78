//! Server runtime
//!
//! [`ServerHandle`] owns the full lifecycle: database, migrations, bootstrap
//! admin, session store, services, REST API and graceful shutdown. The CLI
//! binary drives it; tests and embedders can too.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{ConversationService, IdentityService};
use crate::config::AppConfig;
use crate::domain::{ConversationSession, RepositoryProvider, SessionStore};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
use crate::infrastructure::{build_session_store, init_database, DatabaseConfig};
use crate::interfaces::http::{create_api_router, ApiContext};
use crate::shared::{ShutdownCoordinator, ShutdownSignal};

pub type BoxError = Box<dyn Error + Send + Sync>;

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true)
    pub auto_migrate: bool,
    /// Create the configured admin when no users exist (default: true)
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server
///
/// ```rust,no_run
/// use realty_admin::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), realty_admin::server::BoxError> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: AppConfig,
    /// Address the API is bound to
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global recorder can only be installed once per process; a restart
/// within the same process reuses it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Metrics disabled, failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .clone()
}

/// Connect to the configured database, optionally migrating it.
pub async fn connect_database(
    config: &AppConfig,
    auto_migrate: bool,
) -> Result<DatabaseConnection, BoxError> {
    let db = init_database(&DatabaseConfig::from(&config.database)).await?;
    if auto_migrate {
        info!("Running database migrations...");
        Migrator::up(&db, None).await?;
        info!("Migrations completed");
    }
    Ok(db)
}

impl ServerHandle {
    /// Start the server:
    ///
    /// 1. Install the Prometheus recorder
    /// 2. Connect to the database and run migrations
    /// 3. Create the bootstrap admin (if enabled)
    /// 4. Open the session store
    /// 5. Bind and serve the REST API (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, BoxError> {
        let config = opts.config;
        config.validate()?;

        info!("Starting Realty Admin service...");
        let metrics = prometheus_handle();

        let db = connect_database(&config, opts.auto_migrate).await?;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let jwt_config = JwtConfig::from(&config.security);
        info!("JWT configured with {}h token expiration", jwt_config.expiration_hours);

        if opts.create_default_admin {
            let identity = IdentityService::new(repos.clone(), jwt_config.clone());
            match identity.ensure_default_admin(&config.admin).await {
                Ok(Some(admin)) => {
                    info!(username = %admin.username, "Default admin created");
                    warn!("Change the default admin password immediately");
                }
                Ok(None) => {}
                Err(e) => error!("Failed to create default admin: {}", e),
            }
        }

        let sessions = build_session_store(&config.session)?;
        if let Err(e) = sessions.ping().await {
            warn!(backend = sessions.backend_name(), "Session store not reachable yet: {}", e);
        }

        let mut ctx = ApiContext::new(
            db.clone(),
            repos.clone(),
            sessions.clone(),
            jwt_config,
            config.pagination,
        );
        if let Some(handle) = metrics {
            ctx = ctx.with_metrics(handle);
        }
        let router = create_api_router(ctx);

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();

        let api_addr = config.api_address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_task = tokio::spawn(async move {
            let server = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API server received shutdown signal");
            });
            if let Err(e) = server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            sessions,
            config,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT/SIGTERM
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API to drain (bounded by `server.shutdown_timeout`),
    /// then close the database.
    pub async fn wait(self) {
        info!("Waiting for in-flight requests to complete...");

        match tokio::time::timeout(self.shutdown.timeout(), self.api_task).await {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server task panicked: {}", e),
            Err(_) => warn!(
                "REST API did not stop within {}s, abandoning in-flight requests",
                self.shutdown.timeout().as_secs()
            ),
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }
        info!("Realty Admin shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Maintenance ────────────────────────────────────────────────────

/// Force the conversation and session for `phone` back to active.
///
/// Used by the CLI; no server needs to be running.
pub async fn reset_session(config: &AppConfig, phone: &str) -> Result<ConversationSession, BoxError> {
    config.validate()?;
    let db = connect_database(config, false).await?;
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    let sessions = build_session_store(&config.session)?;

    let result = ConversationService::new(repos, sessions)
        .reset_session_by_phone(phone)
        .await;
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    }
    Ok(result?)
}

/// Initialize tracing from the config. `RUST_LOG` overrides `logging.level`.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
