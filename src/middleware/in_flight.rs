use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Semaphore;

/// Caps how many invocations of an endpoint may run at once. A seed of a
/// million rows takes minutes; a second request should be told so instead of
/// queueing another million writes behind it.
#[derive(Clone, Debug)]
pub struct InFlightGuard {
    permits: Arc<Semaphore>,
}

impl InFlightGuard {
    fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }
}

pub async fn in_flight_middleware(
    State(guard): State<InFlightGuard>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match guard.permits.clone().try_acquire_owned() {
        // Permit is held until the response is ready.
        Ok(_permit) => next.run(req).await,
        Err(_) => (StatusCode::CONFLICT, "operation_already_running").into_response(),
    }
}

pub fn new_guard_state(max_in_flight: usize) -> InFlightGuard {
    InFlightGuard::new(max_in_flight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn slow_handler() -> StatusCode {
        tokio::time::sleep(Duration::from_millis(200)).await;
        StatusCode::OK
    }

    #[tokio::test]
    async fn second_concurrent_request_is_rejected() {
        let app = Router::new()
            .route("/work", post(slow_handler))
            .layer(axum::middleware::from_fn_with_state(
                new_guard_state(1),
                in_flight_middleware,
            ));

        let request = || {
            Request::builder()
                .method("POST")
                .uri("/work")
                .body(Body::empty())
                .unwrap()
        };

        let (first, second) = tokio::join!(
            app.clone().oneshot(request()),
            app.clone().oneshot(request())
        );
        let statuses = [first.unwrap().status(), second.unwrap().status()];
        assert!(statuses.contains(&StatusCode::OK));
        assert!(statuses.contains(&StatusCode::CONFLICT));

        // The permit is released once the first request finishes.
        let resp = app.oneshot(request()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
