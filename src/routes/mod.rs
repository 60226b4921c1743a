pub mod auth;
pub mod depots;
pub mod health;
pub mod optimization;
pub mod route_plans;
pub mod shipments;
pub mod vehicles;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(optimization::router())
                .merge(route_plans::router())
                .merge(vehicles::router())
                .merge(shipments::router())
                .merge(depots::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}

#[cfg(test)]
mod auth_gaps_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::OnceLock;
    use tower::ServiceExt;

    static STATE: OnceLock<AppState> = OnceLock::new();

    fn state() -> AppState {
        STATE.get_or_init(crate::test_support::test_state).clone()
    }

    async fn get_unauthenticated(path: &str) -> StatusCode {
        let app = router(state());
        let resp = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        resp.status()
    }

    #[tokio::test]
    async fn optimization_poll_requires_bearer_auth() {
        let status = get_unauthenticated("/api/v1/optimization/00000000-0000-0000-0000-000000000000").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn routes_list_requires_bearer_auth() {
        let status = get_unauthenticated("/api/v1/routes").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn vehicles_list_requires_bearer_auth() {
        let status = get_unauthenticated("/api/v1/vehicles").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn shipments_list_requires_bearer_auth() {
        let status = get_unauthenticated("/api/v1/shipments").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn depots_list_requires_bearer_auth() {
        let status = get_unauthenticated("/api/v1/depots").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn healthz_does_not_require_auth() {
        let status = get_unauthenticated("/healthz").await;
        assert_eq!(status, StatusCode::OK);
    }
}
