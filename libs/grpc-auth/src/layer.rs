use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use token_core::{AccessClaims, TokenManager};
use tonic::body::{empty_body, BoxBody};
use tonic::Status;
use tower::{Layer, Service};
use tracing::warn;

const BEARER_PREFIX: &str = "Bearer ";

/// Tower layer that authenticates every call except the exempt methods.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenManager>,
    open_methods: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// `open_methods` are matched against the final path segment of the
    /// invoked method (the RPC name without its service prefix).
    pub fn new(tokens: Arc<TokenManager>, open_methods: &[&str]) -> Self {
        Self {
            tokens,
            open_methods: Arc::new(open_methods.iter().map(|m| (*m).to_string()).collect()),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGate {
            inner,
            tokens: self.tokens.clone(),
            open_methods: self.open_methods.clone(),
        }
    }
}

/// Per-call authentication gate. Two states per call: exempt methods pass
/// through unauthenticated, everything else requires a valid bearer token.
/// A failed validation is terminal for the call; the caller must log in
/// again for a fresh token.
#[derive(Clone)]
pub struct AuthGate<S> {
    inner: S,
    tokens: Arc<TokenManager>,
    open_methods: Arc<HashSet<String>>,
}

impl<S> AuthGate<S> {
    /// Decide pass-through vs. rejection for one call.
    ///
    /// Returns the validated claims for protected methods, `None` for
    /// exempt ones. The rejection message names the failure category
    /// only; the underlying detail is logged, not echoed to the caller.
    fn authorize<B>(&self, req: &http::Request<B>) -> Result<Option<AccessClaims>, Status> {
        let method = req.uri().path().split('/').last().unwrap_or_default();
        if self.open_methods.contains(method) {
            return Ok(None);
        }

        let mut values = req.headers().get_all(AUTHORIZATION).iter();
        let value = match (values.next(), values.next()) {
            (Some(value), None) => value,
            (None, _) => {
                warn!(method, "rejected call without authorization metadata");
                return Err(Status::unauthenticated("missing authorization metadata"));
            }
            (Some(_), Some(_)) => {
                warn!(method, "rejected call with multiple authorization values");
                return Err(Status::unauthenticated("malformed authorization metadata"));
            }
        };

        let value = value.to_str().map_err(|_| {
            warn!(method, "rejected call with a non-ascii authorization value");
            Status::unauthenticated("malformed authorization metadata")
        })?;

        let token = value.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
            warn!(method, "rejected call without a bearer prefix");
            Status::unauthenticated("malformed authorization metadata")
        })?;

        match self.tokens.validate(token) {
            Ok(claims) => Ok(Some(claims)),
            Err(err) => {
                warn!(method, error = %err, "rejected call with an invalid token");
                Err(Status::unauthenticated("invalid authentication token"))
            }
        }
    }
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuthGate<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        match self.authorize(&req) {
            Ok(Some(claims)) => {
                req.extensions_mut().insert(claims);
            }
            Ok(None) => {}
            Err(status) => {
                let response = rejection(status);
                return Box::pin(async move { Ok(response) });
            }
        }

        // Swap with a fresh clone so the polled-ready instance is the one
        // that handles the call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(req).await })
    }
}

/// Trailers-only gRPC response for a rejected call.
fn rejection(status: Status) -> http::Response<BoxBody> {
    let mut response = http::Response::new(empty_body());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));

    match status.add_header(response.headers_mut()) {
        Ok(()) => {}
        Err(_) => {
            // UNAUTHENTICATED, in case the message cannot be encoded.
            response
                .headers_mut()
                .insert("grpc-status", HeaderValue::from_static("16"));
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use token_core::Clock;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-key";
    const PROTECTED: &str = "/chorepoints.v1.ChoreService/ListUsers";
    const LOGIN: &str = "/chorepoints.v1.ChoreService/Login";

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Inner service standing in for the tonic router. Counts invocations
    /// and reflects the authenticated username into a response header.
    #[derive(Clone)]
    struct Handler {
        hits: Arc<AtomicUsize>,
    }

    impl Service<http::Request<BoxBody>> for Handler {
        type Response = http::Response<BoxBody>;
        type Error = Infallible;
        type Future =
            Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<BoxBody>) -> Self::Future {
            self.hits.fetch_add(1, Ordering::SeqCst);
            let username = req
                .extensions()
                .get::<AccessClaims>()
                .map(|claims| claims.username.clone());

            Box::pin(async move {
                let mut response = http::Response::new(empty_body());
                if let Some(username) = username {
                    response.headers_mut().insert(
                        "x-username",
                        HeaderValue::from_str(&username).expect("ascii username"),
                    );
                }
                Ok(response)
            })
        }
    }

    fn gate(tokens: Arc<TokenManager>) -> (AuthGate<Handler>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = Handler { hits: hits.clone() };
        let service = AuthLayer::new(tokens, &["Login"]).layer(handler);
        (service, hits)
    }

    fn manager() -> Arc<TokenManager> {
        Arc::new(TokenManager::new(TEST_SECRET).expect("manager should build"))
    }

    fn request(path: &str) -> http::request::Builder {
        http::Request::builder().uri(path)
    }

    fn grpc_status(response: &http::Response<BoxBody>) -> Option<String> {
        response
            .headers()
            .get("grpc-status")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    #[tokio::test]
    async fn login_passes_through_without_metadata() {
        let (service, hits) = gate(manager());

        let response = service
            .oneshot(request(LOGIN).body(empty_body()).unwrap())
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(grpc_status(&response), None);
    }

    #[tokio::test]
    async fn protected_method_requires_metadata() {
        let (service, hits) = gate(manager());

        let response = service
            .oneshot(request(PROTECTED).body(empty_body()).unwrap())
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(grpc_status(&response).as_deref(), Some("16"));
    }

    #[tokio::test]
    async fn duplicate_authorization_values_are_rejected() {
        let tokens = manager();
        let token = tokens.issue("alice").expect("issue should succeed");
        let (service, hits) = gate(tokens);

        let response = service
            .oneshot(
                request(PROTECTED)
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(empty_body())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(grpc_status(&response).as_deref(), Some("16"));
    }

    #[tokio::test]
    async fn bearer_prefix_is_mandatory() {
        let tokens = manager();
        let token = tokens.issue("alice").expect("issue should succeed");
        let (service, hits) = gate(tokens);

        // A perfectly valid token, but presented raw.
        let response = service
            .oneshot(
                request(PROTECTED)
                    .header(AUTHORIZATION, token)
                    .body(empty_body())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(grpc_status(&response).as_deref(), Some("16"));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let (service, hits) = gate(manager());

        let response = service
            .oneshot(
                request(PROTECTED)
                    .header(AUTHORIZATION, "Bearer aaaaa")
                    .body(empty_body())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(grpc_status(&response).as_deref(), Some("16"));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let issued_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let stale = TokenManager::with_clock(
            TEST_SECRET,
            Arc::new(FixedClock(issued_at - Duration::minutes(31))),
        )
        .expect("manager should build");
        let token = stale.issue("alice").expect("issue should succeed");

        let gate_tokens = Arc::new(
            TokenManager::with_clock(TEST_SECRET, Arc::new(FixedClock(issued_at)))
                .expect("manager should build"),
        );
        let (service, hits) = gate(gate_tokens);

        let response = service
            .oneshot(
                request(PROTECTED)
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(empty_body())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(grpc_status(&response).as_deref(), Some("16"));
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler_with_claims() {
        let tokens = manager();
        let token = tokens.issue("alice").expect("issue should succeed");
        let (service, hits) = gate(tokens);

        let response = service
            .oneshot(
                request(PROTECTED)
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(empty_body())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(grpc_status(&response), None);
        assert_eq!(
            response
                .headers()
                .get("x-username")
                .and_then(|v| v.to_str().ok()),
            Some("alice")
        );
    }
}
