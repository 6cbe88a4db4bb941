//! HTTP gateway server.

use crate::error::GatewayError;
use crate::handlers;
use crate::Result;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use parley_agent::{
    ChatRuntime, ContextManager, HistoryCompactor, ProviderSummarizer, RuntimeConfig,
    SessionStore, Summarizer, UnavailableSummarizer,
};
use parley_core::config::{Config, GatewayConfig};
use parley_providers::{DeepSeekProvider, Provider};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared handler state.
pub struct AppState {
    /// Conversation runtime.
    pub runtime: Arc<ChatRuntime>,

    /// Server start time.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state around a runtime.
    pub fn new(runtime: Arc<ChatRuntime>) -> Self {
        Self {
            runtime,
            started_at: Utc::now(),
        }
    }

    /// Context manager behind the runtime.
    pub fn manager(&self) -> &Arc<ContextManager> {
        self.runtime.manager()
    }
}

/// Build the router: API routes, optional static files, CORS, and tracing.
pub fn build_router(state: Arc<AppState>, config: &GatewayConfig) -> Router {
    let mut router = Router::new()
        .route("/api/test", get(handlers::health::test))
        .route("/api/chat", post(handlers::chat::chat))
        .route(
            "/api/session/:id",
            get(handlers::sessions::status).delete(handlers::sessions::delete),
        )
        .route(
            "/api/sessions/:id",
            get(handlers::sessions::status).delete(handlers::sessions::delete),
        )
        .with_state(state);

    if let Some(dir) = &config.static_dir {
        if dir.is_dir() {
            debug!("Serving static files from {:?}", dir);
            router = router.fallback_service(ServeDir::new(dir));
        } else {
            debug!("Static directory {:?} not found; not serving files", dir);
        }
    }

    if config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http())
}

/// Periodically evict idle sessions.
pub fn spawn_session_sweeper(manager: Arc<ContextManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = manager.evict_idle();
            if evicted > 0 {
                debug!(evicted, "Session sweep finished");
            }
        }
    })
}

/// The HTTP gateway.
pub struct Gateway {
    config: Config,
    state: Arc<AppState>,
}

impl Gateway {
    /// Assemble the gateway from configuration.
    ///
    /// A missing API key is not fatal: the server starts and chat requests
    /// fail with a configuration error until a key is provided.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider: Option<Arc<dyn Provider>> =
            match DeepSeekProvider::from_config(&config.provider) {
                Ok(provider) => Some(Arc::new(provider) as Arc<dyn Provider>),
                Err(e) => {
                    warn!("Completion provider unavailable: {}", e);
                    None
                }
            };

        let persona = config
            .persona_prompt()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(Self::with_provider(config, provider, persona))
    }

    /// Assemble the gateway around an explicit provider.
    pub fn with_provider(
        config: Config,
        provider: Option<Arc<dyn Provider>>,
        persona: Option<String>,
    ) -> Self {
        let summarizer: Arc<dyn Summarizer> = match &provider {
            Some(provider) => Arc::new(ProviderSummarizer::from_config(
                provider.clone(),
                &config.summarizer,
            )),
            None => Arc::new(UnavailableSummarizer),
        };

        let store = SessionStore::new()
            .with_idle_ttl(config.sessions.idle_ttl())
            .with_capacity(config.sessions.capacity());
        let compactor =
            HistoryCompactor::from_config(summarizer, &config.context, &config.summarizer);
        let manager = Arc::new(ContextManager::new(Arc::new(store), compactor));

        let runtime = ChatRuntime::new(manager, provider)
            .with_config(RuntimeConfig::from_provider(&config.provider, persona));

        Self {
            config,
            state: Arc::new(AppState::new(Arc::new(runtime))),
        }
    }

    /// Shared handler state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The router for this gateway.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config.gateway)
    }

    /// Get the bind address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);
        addr.parse()
            .map_err(|e| GatewayError::Internal(format!("Invalid bind address '{}': {}", addr, e)))
    }

    /// Run the server until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        let addr = self.bind_address()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let sweeper = self.config.sessions.idle_ttl().map(|_| {
            spawn_session_sweeper(
                self.state.manager().clone(),
                self.config.sessions.sweep_interval(),
            )
        });

        info!(
            model = %self.config.provider.model,
            provider_ready = self.state.runtime.has_provider(),
            "Gateway listening on http://{}",
            addr
        );

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        served?;

        info!("Gateway stopped");
        Ok(())
    }
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
