//! Server initialization and routing

use crate::api;
use crate::config::{Config, SessionBackend};
use crate::form::{Catalog, Locale};
use crate::middleware::{
    identity_middleware, session_middleware, HttpMetricsLayer, SanitizedMakeSpan,
};
use crate::migration;
use crate::repository::{access_token::AccessTokenRepositoryImpl, user::UserRepositoryImpl};
use crate::service::IdentityResolver;
use crate::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::state::{HasIdentity, Readiness};
use anyhow::{Context, Result};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Delay between attempts of the database bootstrap
const BOOTSTRAP_RETRY: Duration = Duration::from_secs(5);

/// Interval of the in-memory session sweep
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub user_repo: Arc<UserRepositoryImpl>,
    pub token_repo: Arc<AccessTokenRepositoryImpl>,
    pub identity_resolver: Arc<IdentityResolver<UserRepositoryImpl, AccessTokenRepositoryImpl>>,
    pub session_store: Arc<dyn SessionStore>,
    pub locale: Arc<Catalog>,
    pub readiness: Readiness,
}

impl HasIdentity for AppState {
    type UserRepo = UserRepositoryImpl;
    type TokenRepo = AccessTokenRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn identity_resolver(&self) -> &IdentityResolver<Self::UserRepo, Self::TokenRepo> {
        &self.identity_resolver
    }

    fn user_repo(&self) -> &Self::UserRepo {
        &self.user_repo
    }

    fn token_repo(&self) -> &Self::TokenRepo {
        &self.token_repo
    }

    fn session_store(&self) -> Arc<dyn SessionStore> {
        self.session_store.clone()
    }

    fn locale(&self) -> &dyn Locale {
        self.locale.as_ref()
    }

    fn readiness(&self) -> &Readiness {
        &self.readiness
    }
}

/// Bring the database up, then open the resolver to traffic.
///
/// Retries until it succeeds; requests are served anonymously meanwhile.
async fn bootstrap(
    config: Arc<Config>,
    pool: MySqlPool,
    redis: Option<RedisSessionStore>,
    readiness: Readiness,
) {
    loop {
        let result = async {
            if config.database.run_migrations {
                migration::run_migrations(&config.database, &pool).await?;
            } else {
                sqlx::query("SELECT 1")
                    .execute(&pool)
                    .await
                    .context("Failed to reach database")?;
            }
            if let Some(redis) = &redis {
                redis.ping().await.context("Failed to reach Redis")?;
            }
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                readiness.mark_ready();
                info!("Backing store ready, identity resolution enabled");
                return;
            }
            Err(e) => {
                warn!(
                    "Bootstrap failed, retrying in {}s: {:#}",
                    BOOTSTRAP_RETRY.as_secs(),
                    e
                );
                tokio::time::sleep(BOOTSTRAP_RETRY).await;
            }
        }
    }
}

/// Run the server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    // The pool connects on first use so the listener comes up before MySQL
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_lazy(&config.database.url)
        .context("Invalid DATABASE_URL")?;

    let (session_store, redis): (Arc<dyn SessionStore>, Option<RedisSessionStore>) =
        match config.session.backend {
            SessionBackend::Redis => {
                let store = RedisSessionStore::new(&config.session).await?;
                info!("Using Redis session store");
                (Arc::new(store.clone()), Some(store))
            }
            SessionBackend::Memory => {
                let store = Arc::new(MemorySessionStore::new(Duration::from_secs(
                    config.session.ttl_secs,
                )));
                let sweeper = store.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
                    loop {
                        interval.tick().await;
                        let purged = sweeper.purge_expired().await;
                        if purged > 0 {
                            tracing::debug!("Purged {} expired sessions", purged);
                        }
                    }
                });
                info!("Using in-memory session store");
                (store, None)
            }
        };

    let config = Arc::new(config);
    let readiness = Readiness::pending();
    let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
    let token_repo = Arc::new(AccessTokenRepositoryImpl::new(db_pool.clone()));

    let identity_resolver = Arc::new(IdentityResolver::new(
        user_repo.clone(),
        token_repo.clone(),
        config.auth.clone(),
        readiness.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        db_pool: db_pool.clone(),
        user_repo,
        token_repo,
        identity_resolver,
        session_store,
        locale: Arc::new(Catalog::en_us()),
        readiness: readiness.clone(),
    };

    tokio::spawn(bootstrap(config.clone(), db_pool, redis, readiness));

    let app = build_router(state, prometheus_handle);

    let http_addr = config.http_addr();
    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Build the HTTP router
///
/// Middleware order, outermost first: metrics, tracing, session, identity.
pub fn build_router<S: HasIdentity>(
    state: S,
    prometheus_handle: Option<PrometheusHandle>,
) -> Router {
    let metrics = Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(prometheus_handle));

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // User pages
        .route("/user/login", post(api::user::login::<S>))
        .route("/user/logout", post(api::user::logout::<S>))
        .route("/user/sign_up", post(api::user::sign_up::<S>))
        .route(
            "/user/settings/applications",
            post(api::user::create_access_token::<S>),
        )
        // API
        .route("/api/v1/user", get(api::user::me))
        .layer(from_fn_with_state(state.clone(), identity_middleware::<S>))
        .layer(from_fn_with_state(state.clone(), session_middleware::<S>))
        .with_state(state)
        .merge(metrics)
        .layer(TraceLayer::new_for_http().make_span_with(SanitizedMakeSpan))
        .layer(HttpMetricsLayer)
}
