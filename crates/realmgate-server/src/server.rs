use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use realmgate_auth::discovery::{DISCOVERY_PATH, JWKS_PATH, TOKEN_ENDPOINT_PATH};
use realmgate_auth::{
    JwksState, MemoryCredentialStore, RealmRegistry, SigningKeyHolder, SigningKeyPair,
    TokenIssuer, TokenState, jwks_handler, openid_configuration_handler, token_handler,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers, metrics, middleware as app_middleware};

/// Shared state of the router.
#[derive(Clone)]
pub struct AppState {
    pub issuer: TokenIssuer,
    pub conceal_unknown_realm: bool,
}

impl AppState {
    /// Builds the issuance stack described by `cfg`.
    ///
    /// Principals declared in configuration are seeded into an in-process
    /// credential store.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryCredentialStore::from_config(&cfg.auth));
        let registry = RealmRegistry::from_config(&cfg.auth, store)
            .context("failed to build realm registry")?;

        let key = SigningKeyPair::from_config(&cfg.auth.signing)
            .context("failed to initialize signing key")?;
        let keys = SigningKeyHolder::new(key);

        tracing::info!(
            realms = ?registry.names(),
            kid = %keys.key_id(),
            issuer = %cfg.auth.issuer,
            "Token issuer initialized"
        );

        Ok(Self {
            issuer: TokenIssuer::new(Arc::new(registry), Arc::new(keys), &cfg.auth.issuer),
            conceal_unknown_realm: cfg.auth.conceal_unknown_realm,
        })
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(state: &AppState) -> Self {
        TokenState::new(state.issuer.clone())
            .with_conceal_unknown_realm(state.conceal_unknown_realm)
    }
}

impl FromRef<AppState> for JwksState {
    fn from_ref(state: &AppState) -> Self {
        JwksState::new(state.issuer.keys().clone())
    }
}

pub struct RealmgateServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the router from configuration.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    if cfg.metrics.enabled {
        metrics::init_metrics();
    }
    let state = AppState::from_config(cfg)?;
    Ok(build_router(state, cfg))
}

/// Builds the router around an existing state.
pub fn build_router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(TOKEN_ENDPOINT_PATH, post(token_handler))
        .route(JWKS_PATH, get(jwks_handler))
        .route(DISCOVERY_PATH, get(openid_configuration_handler));

    if cfg.metrics.enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .route_layer(middleware::from_fn(app_middleware::track_metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<RealmgateServer> {
        self.config.validate().map_err(anyhow::Error::msg)?;
        let app = build_app(&self.config).await?;

        Ok(RealmgateServer {
            addr: self.addr,
            app,
        })
    }
}

impl RealmgateServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
