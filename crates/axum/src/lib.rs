//! # hearth-axum
//!
//! Tower extensions shared by the hearth servers, built on
//! [axum](https://docs.rs/axum).
//!
//! ## Auth Middleware
//!
//! Provides a pluggable [`auth::Authenticator`] trait and tower middleware
//! for validating requests before they reach the protected routes.
//!
//! ```rust,ignore
//! use hearth_axum::auth::{AuthLayer, BearerAuth, Validator};
//!
//! #[derive(Clone)]
//! struct KeyStore;
//!
//! impl Validator for KeyStore {
//!     type Claims = ();
//!     type Error = String;
//!
//!     async fn validate(&self, key: &str) -> Result<(), String> {
//!         if key == "secret" { Ok(()) } else { Err("invalid key".into()) }
//!     }
//! }
//!
//! let app = axum::Router::new()
//!     .route("/mcp", axum::routing::post(handler))
//!     .layer(AuthLayer::new(BearerAuth::new(KeyStore)));
//! ```

pub use axum;

pub mod auth;
