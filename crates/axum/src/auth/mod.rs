//! Authentication middleware for hearth HTTP services.
//!
//! Provides a tower middleware that validates incoming requests using a
//! user-defined [`Authenticator`] trait. On success, the authenticated
//! claims are inserted into HTTP extensions and become accessible in axum
//! handlers via `Extension`. On failure, the request is answered with
//! HTTP 401 and a JSON `{ "error": <message> }` body, without ever reaching
//! the inner service.
//!
//! # Example
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

mod bearer;

pub use bearer::BearerAuth;

use futures::future::BoxFuture;
use http::{Request, Response, StatusCode};
use std::task::{Context, Poll};

/// Trait for validating incoming requests.
///
/// Implement this with your auth logic (API key lookup, token validation,
/// etc.). On success, `Claims` is inserted into `http::Extensions`.
pub trait Authenticator: Clone + Send + Sync + 'static {
    /// The claims type produced on successful authentication.
    type Claims: Clone + Send + Sync + 'static;

    /// The error type returned on authentication failure.
    type Error: std::fmt::Display + Send;

    /// Validate the request and return claims, or an error.
    fn authenticate(
        &self,
        parts: &http::request::Parts,
    ) -> impl Future<Output = Result<Self::Claims, Self::Error>> + Send;
}

/// Trait for validating a credential string (e.g., a Bearer token).
///
/// Users implement this to provide their validation logic, then wrap it
/// in [`BearerAuth`] which handles credential extraction from the
/// `Authorization` header.
pub trait Validator: Clone + Send + Sync + 'static {
    /// The claims type produced on successful validation.
    type Claims: Clone + Send + Sync + 'static;

    /// The error type returned on validation failure.
    type Error: std::fmt::Display + Send;

    /// Validate the credential string and return claims, or an error.
    fn validate(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<Self::Claims, Self::Error>> + Send;
}

/// Tower [`Layer`](tower::Layer) that applies [`AuthService`].
#[derive(Clone)]
pub struct AuthLayer<A> {
    authenticator: A,
}

impl<A> AuthLayer<A> {
    pub fn new(authenticator: A) -> Self {
        Self { authenticator }
    }
}

impl<A, S> tower::Layer<S> for AuthLayer<A>
where
    A: Clone,
{
    type Service = AuthService<A, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            authenticator: self.authenticator.clone(),
            inner,
        }
    }
}

/// Tower service that authenticates requests before forwarding them.
#[derive(Clone)]
pub struct AuthService<A, S> {
    authenticator: A,
    inner: S,
}

impl<A, S, B> tower::Service<Request<B>> for AuthService<A, S>
where
    A: Authenticator,
    S: tower::Service<Request<B>, Response = Response<axum::body::Body>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let authenticator = self.authenticator.clone();
        let mut inner = self.inner.clone();
        // swap to ensure poll_ready state is preserved
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            let (parts, body) = req.into_parts();

            match authenticator.authenticate(&parts).await {
                Ok(claims) => {
                    let mut req = Request::from_parts(parts, body);
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(err) => {
                    let payload = serde_json::json!({
                        "error": format!("Unauthorized: {err}"),
                    });
                    let response = Response::builder()
                        .status(StatusCode::UNAUTHORIZED)
                        .header(http::header::CONTENT_TYPE, "application/json")
                        .body(axum::body::Body::from(payload.to_string()))
                        .expect("valid response");
                    Ok(response)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use tower::ServiceExt;

    #[derive(Clone)]
    struct FixedKey(&'static str);

    impl Validator for FixedKey {
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

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(AuthLayer::new(BearerAuth::new(FixedKey("secret"))))
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let res = app()
            .oneshot(Request::get("/").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_wrong_token() {
        let res = app()
            .oneshot(
                Request::get("/")
                    .header("authorization", "Bearer nope")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let res = app()
            .oneshot(
                Request::get("/")
                    .header("authorization", "Bearer secret")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
