//! REST API for survey authoring, publication and anonymous responses.
//!
//! Wizards run server-side: clients create a session, then post one step's
//! answers at a time. Authenticated routes expect `Authorization: Bearer`
//! with a token from `/api/v1/auth/signin`.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod sessions;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/status", get(routes::health::status))
        .route("/api/v1/openapi.json", get(openapi_json))
        // Reference data
        .route("/api/v1/catalog", get(routes::catalog::catalog))
        .route("/api/v1/i18n/:locale", get(routes::catalog::translations))
        // Signup wizard
        .route("/api/v1/signup", post(routes::signup::start))
        .route("/api/v1/signup/:id", get(routes::signup::get_one))
        .route("/api/v1/signup/:id/advance", post(routes::signup::advance))
        .route("/api/v1/signup/:id/retreat", post(routes::signup::retreat))
        .route("/api/v1/signup/:id/jump", post(routes::signup::jump))
        // Account
        .route("/api/v1/auth/signin", post(routes::auth::sign_in))
        .route("/api/v1/auth/signout", post(routes::auth::sign_out))
        .route(
            "/api/v1/me",
            get(routes::auth::me).put(routes::auth::update_profile),
        )
        .route(
            "/api/v1/organization",
            get(routes::organization::get_one).put(routes::organization::update),
        )
        .route("/api/v1/dashboard", get(routes::dashboard::list))
        // Survey creation wizard
        .route("/api/v1/drafts", post(routes::drafts::create))
        .route(
            "/api/v1/drafts/:id",
            get(routes::drafts::get_one).delete(routes::drafts::discard),
        )
        .route("/api/v1/drafts/:id/summary", get(routes::drafts::summary))
        .route("/api/v1/drafts/:id/advance", post(routes::drafts::advance))
        .route("/api/v1/drafts/:id/retreat", post(routes::drafts::retreat))
        .route("/api/v1/drafts/:id/jump", post(routes::drafts::jump))
        .route("/api/v1/drafts/:id/reorder", post(routes::drafts::reorder))
        .route(
            "/api/v1/drafts/:id/demographics/toggle",
            post(routes::drafts::toggle_demographic),
        )
        .route(
            "/api/v1/drafts/:id/demographics/toggle-all",
            post(routes::drafts::toggle_all_demographics),
        )
        .route(
            "/api/v1/drafts/:id/departments",
            post(routes::drafts::add_department),
        )
        .route(
            "/api/v1/drafts/:id/departments/:department_id",
            put(routes::drafts::update_department).delete(routes::drafts::remove_department),
        )
        .route("/api/v1/drafts/:id/publish", post(routes::drafts::publish))
        // Respondents
        .route("/api/v1/surveys/:survey_id", get(routes::responses::get_survey))
        .route(
            "/api/v1/surveys/:survey_id/responses",
            post(routes::responses::start),
        )
        .route("/api/v1/responses/:id", get(routes::responses::get_one))
        .route(
            "/api/v1/responses/:id/answers",
            put(routes::responses::answer),
        )
        .route(
            "/api/v1/responses/:id/submit",
            post(routes::responses::submit),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}

/// Start the REST API server and run until Ctrl-C
pub async fn serve(state: ApiState, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
    spawn_session_sweeper(&state);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("REST API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

/// Periodically drop idle sessions so abandoned wizards do not pile up
fn spawn_session_sweeper(state: &ApiState) {
    let sessions = state.sessions.clone();
    let period = Duration::from_secs(state.config.sessions.sweep_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let dropped = sessions.sweep().await;
            if dropped > 0 {
                tracing::debug!(dropped, "idle sessions dropped");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::state::tests::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_route() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_authenticated_route_requires_token() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::post("/api/v1/drafts")
                    .header("accept-language", "fr")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["message"], "Veuillez vous connecter pour continuer");
    }

    #[tokio::test]
    async fn test_openapi_route() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/v1/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
