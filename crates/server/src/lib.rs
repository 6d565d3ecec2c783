//! Sandboxed filesystem server for the hearth dashboard.
//!
//! All operations are restricted to a set of allowed directories fixed at
//! server startup. Exposes nine filesystem tools over a JSON-RPC 2.0 subset
//! on `POST /` and `POST /mcp`, plus a REST facade under `/api/filesystem`
//! for the dashboard frontend.

use axum::{Json, Router, routing::get, routing::post};
use hearth_axum::auth::{AuthLayer, BearerAuth, Validator};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod rest;
pub mod rpc;
pub mod sandbox;
pub mod tools;
pub mod walk;

use config::Config;
use sandbox::Sandbox;

/// Filesystem server with directory-level access control.
///
/// Holds the immutable configuration and sandbox shared by every request.
#[derive(Debug, Clone)]
pub struct FsServer {
    pub(crate) config: Config,
    pub(crate) sandbox: Sandbox,
}

impl FsServer {
    /// Build the server: normalizes the allowed directories and creates any
    /// that are missing.
    pub fn new(config: Config) -> std::io::Result<Self> {
        let sandbox = Sandbox::new(&config.root_dir, config.allowed_dirs.clone())?;
        Ok(Self { config, sandbox })
    }

    /// The normalized allowed directories.
    pub fn allowed_dirs(&self) -> &[std::path::PathBuf] {
        self.sandbox.allowed()
    }
}

/// Static bearer key check for the `API_KEY` gate.
#[derive(Clone)]
struct ApiKey(String);

impl Validator for ApiKey {
    type Claims = ();
    type Error = String;

    async fn validate(&self, credential: &str) -> Result<(), String> {
        if credential == self.0 {
            Ok(())
        } else {
            Err("Invalid API key".into())
        }
    }
}

/// Assemble the HTTP router.
///
/// `/health` stays public; the JSON-RPC endpoints and the REST facade sit
/// behind the bearer-token gate when an API key is configured.
pub fn router(server: Arc<FsServer>) -> Router {
    let cors = match &server.config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let mut protected = Router::new()
        .route("/", post(rpc::handle))
        .route("/mcp", post(rpc::handle))
        .nest("/api/filesystem", rest::router());

    if let Some(key) = &server.config.api_key {
        protected = protected.layer(AuthLayer::new(BearerAuth::new(ApiKey(key.clone()))));
    }

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(server)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
