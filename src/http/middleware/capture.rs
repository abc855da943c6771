//! Request/response capture.
//!
//! # Responsibilities
//! - Record method, path and authorization presence on entry
//! - Buffer the request body and hand an identical copy to the handler
//! - Return the response at once, copying its body frames as they stream out
//! - Notify every registered stage when the response body completes
//!
//! # Design Decisions
//! - One capture point and a list of observers instead of each stage
//!   wrapping the response on its own
//! - Status, headers and every body frame reach the client untouched; only a
//!   bounded prefix of the response body is kept for the stages
//! - Completion is end-of-stream, a body error, or the body being dropped
//!   (client gone, HEAD, unread body), whichever comes first; stages run
//!   exactly once per request
//! - A request body over the limit is answered with 413 and still reported,
//!   so the request is counted and logged like any other

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::routing::{tagged_class, RouteClass, RouteClassifier};

const BODY_TOO_LARGE: &str = "Request body too large";

/// Everything the stages may inspect about one finished request.
#[derive(Debug, Clone)]
pub struct CompletedExchange {
    pub method: Method,
    pub path: String,
    pub has_authorization: bool,
    /// Fingerprint of the `Authorization` header value; the value itself is
    /// never kept.
    pub credential: Option<u64>,
    pub request_body: Bytes,
    pub status: StatusCode,
    /// At most `max_body_bytes` of the response body.
    pub response_body: Bytes,
    pub response_truncated: bool,
    pub route_class: RouteClass,
    pub latency: Duration,
}

/// A stage notified once per completed request.
pub trait ExchangeObserver: Send + Sync {
    fn on_complete(&self, exchange: &CompletedExchange);
}

/// Registered stages plus the settings the capture layer needs.
pub struct Instrumentation {
    observers: Vec<Arc<dyn ExchangeObserver>>,
    classifier: RouteClassifier,
    max_body_bytes: usize,
}

impl Instrumentation {
    pub fn new(classifier: RouteClassifier, max_body_bytes: usize) -> Self {
        Self {
            observers: Vec::new(),
            classifier,
            max_body_bytes,
        }
    }

    /// Register a stage. Stages are notified in registration order.
    pub fn observe(mut self, observer: Arc<dyn ExchangeObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn complete(&self, exchange: &CompletedExchange) {
        for observer in &self.observers {
            observer.on_complete(exchange);
        }
    }
}

fn credential_fingerprint(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(AUTHORIZATION)?;
    let mut hasher = DefaultHasher::new();
    value.as_bytes().hash(&mut hasher);
    Some(hasher.finish())
}

/// Middleware entry point; mount with `from_fn_with_state`.
pub async fn capture_exchange(
    State(instrumentation): State<Arc<Instrumentation>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let has_authorization = request.headers().contains_key(AUTHORIZATION);
    let credential = credential_fingerprint(request.headers());

    let (parts, body) = request.into_parts();
    let request_body = match to_bytes(body, instrumentation.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(method = %method, path = %path, error = %e, "Rejected request body");
            let exchange = CompletedExchange {
                method,
                path,
                has_authorization,
                credential,
                request_body: Bytes::new(),
                status: StatusCode::PAYLOAD_TOO_LARGE,
                response_body: Bytes::from_static(BODY_TOO_LARGE.as_bytes()),
                response_truncated: false,
                route_class: RouteClass::Other,
                latency: started.elapsed(),
            };
            instrumentation.complete(&exchange);
            return (StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE).into_response();
        }
    };

    let response = next
        .run(Request::from_parts(parts, Body::from(request_body.clone())))
        .await;

    let tag = tagged_class(&response);
    let (parts, body) = response.into_parts();
    let exchange = CompletedExchange {
        route_class: instrumentation.classifier.resolve(tag, &method, &path),
        method,
        path,
        has_authorization,
        credential,
        request_body,
        status: parts.status,
        response_body: Bytes::new(),
        response_truncated: false,
        latency: Duration::ZERO,
    };

    let limit = instrumentation.max_body_bytes;
    let observed = ObservedBody {
        inner: body,
        captured: Vec::new(),
        limit,
        pending: Some(PendingExchange { instrumentation, exchange, started }),
    };
    Response::from_parts(parts, Body::new(observed))
}

struct PendingExchange {
    instrumentation: Arc<Instrumentation>,
    exchange: CompletedExchange,
    started: Instant,
}

/// Response body that forwards every frame and reports the exchange once
/// the body is finished.
struct ObservedBody {
    inner: Body,
    captured: Vec<u8>,
    limit: usize,
    pending: Option<PendingExchange>,
}

impl ObservedBody {
    fn capture(&mut self, data: &Bytes) {
        let room = self.limit.saturating_sub(self.captured.len());
        if data.len() > room {
            if let Some(pending) = self.pending.as_mut() {
                pending.exchange.response_truncated = true;
            }
        }
        self.captured.extend_from_slice(&data[..data.len().min(room)]);
    }

    fn finish(&mut self) {
        let Some(PendingExchange { instrumentation, mut exchange, started }) = self.pending.take() else {
            return;
        };
        exchange.response_body = Bytes::from(std::mem::take(&mut self.captured));
        exchange.latency = started.elapsed();
        instrumentation.complete(&exchange);
    }
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture(data);
                }
                if this.inner.is_end_stream() {
                    this.finish();
                }
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(error = %e, "Response body failed mid-stream");
                this.finish();
            }
            Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ObservedBody {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::middleware::from_fn_with_state;
    use axum::routing::{get, post, put};
    use axum::Router;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::routing::tag;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<CompletedExchange>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<CompletedExchange> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ExchangeObserver for Recorder {
        fn on_complete(&self, exchange: &CompletedExchange) {
            self.seen.lock().unwrap().push(exchange.clone());
        }
    }

    /// A body that never yields a frame.
    struct Stalled;

    impl HttpBody for Stalled {
        type Data = Bytes;
        type Error = axum::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Pending
        }
    }

    fn app(recorder: Arc<Recorder>, max_body_bytes: usize) -> Router {
        let instrumentation = Arc::new(
            Instrumentation::new(RouteClassifier::default(), max_body_bytes).observe(recorder),
        );
        Router::new()
            .route("/echo", post(|body: String| async move { (StatusCode::CREATED, body) }))
            .route("/login", tag(put(|| async { StatusCode::UNAUTHORIZED }), RouteClass::AuthAttempt))
            .route("/stalled", get(|| async { Body::new(Stalled) }))
            .route("/large", get(|| async { "x".repeat(64) }))
            .layer(from_fn_with_state(instrumentation, capture_exchange))
    }

    #[tokio::test]
    async fn test_observes_both_bodies_without_changing_response() {
        let recorder = Arc::new(Recorder::default());
        let response = app(recorder.clone(), 1024)
            .oneshot(
                Request::post("/echo")
                    .header(AUTHORIZATION, "Bearer abc")
                    .body(Body::from(r#"{"x":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"x":1}"#);

        let seen = recorder.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].path, "/echo");
        assert!(seen[0].has_authorization);
        assert!(seen[0].credential.is_some());
        assert_eq!(&seen[0].request_body[..], br#"{"x":1}"#);
        assert_eq!(&seen[0].response_body[..], br#"{"x":1}"#);
        assert!(!seen[0].response_truncated);
        assert_eq!(seen[0].status, StatusCode::CREATED);
        assert_eq!(seen[0].route_class, RouteClass::Other);
    }

    #[tokio::test]
    async fn test_tag_and_unmatched_routes() {
        let recorder = Arc::new(Recorder::default());
        let app = app(recorder.clone(), 1024);

        app.clone()
            .oneshot(Request::put("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let missing = app
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        drop(missing);

        let seen = recorder.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].route_class, RouteClass::AuthAttempt);
        assert_eq!(seen[0].status, StatusCode::UNAUTHORIZED);
        assert!(!seen[0].has_authorization);
        assert_eq!(seen[0].credential, None);
        assert_eq!(seen[1].status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_and_reported() {
        let recorder = Arc::new(Recorder::default());
        let response = app(recorder.clone(), 4)
            .oneshot(Request::post("/echo").body(Body::from("too long")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let seen = recorder.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(seen[0].method, Method::POST);
        assert!(seen[0].request_body.is_empty());
        assert_eq!(seen[0].route_class, RouteClass::Other);
    }

    #[tokio::test]
    async fn test_stalled_body_still_returns_headers() {
        let recorder = Arc::new(Recorder::default());
        let response = tokio::time::timeout(
            Duration::from_secs(2),
            app(recorder.clone(), 1024).oneshot(Request::get("/stalled").body(Body::empty()).unwrap()),
        )
        .await
        .expect("headers delayed by the capture layer")
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(recorder.seen().is_empty());

        // The client walking away completes the exchange.
        drop(response);
        let seen = recorder.seen();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].response_body.is_empty());
    }

    #[tokio::test]
    async fn test_large_response_passes_through_and_capture_is_bounded() {
        let recorder = Arc::new(Recorder::default());
        let response = app(recorder.clone(), 16)
            .oneshot(Request::get("/large").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), 64);

        let seen = recorder.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].response_body.len(), 16);
        assert!(seen[0].response_truncated);
    }

    #[test]
    fn test_credential_fingerprint() {
        let mut a = HeaderMap::new();
        a.insert(AUTHORIZATION, "Bearer one".parse().unwrap());
        let mut b = HeaderMap::new();
        b.insert(AUTHORIZATION, "Bearer two".parse().unwrap());

        assert_eq!(credential_fingerprint(&a), credential_fingerprint(&a.clone()));
        assert_ne!(credential_fingerprint(&a), credential_fingerprint(&b));
        assert_eq!(credential_fingerprint(&HeaderMap::new()), None);
    }
}
