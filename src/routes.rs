//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod pull_requests;
mod statistics;
mod teams;
mod users;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(middleware)
        .with_state(state)
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        // Users
        .route("/users", post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{user_id}/pull-requests", get(users::get_user_reviews))
        // Teams
        .route("/teams", post(teams::create_team))
        .route(
            "/teams/{team_id}",
            get(teams::get_team)
                .put(teams::update_team)
                .delete(teams::delete_team),
        )
        .route(
            "/teams/{team_id}/deactivate-members",
            post(teams::deactivate_members),
        )
        // Pull requests
        .route(
            "/pull-requests",
            post(pull_requests::create_pull_request).get(pull_requests::list_pull_requests),
        )
        .route(
            "/pull-requests/{pull_request_id}",
            get(pull_requests::get_pull_request),
        )
        .route(
            "/pull-requests/{pull_request_id}/reassign",
            post(pull_requests::reassign_reviewer),
        )
        .route(
            "/pull-requests/{pull_request_id}/merge",
            post(pull_requests::merge_pull_request),
        )
        // Statistics
        .route("/statistics", get(statistics::get_statistics))
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::ReviewerRng;
    use crate::state::AppState;
    use crate::store::Stores;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = Arc::new(AppState::new(Stores::in_memory(), ReviewerRng::seeded(5)));
        create_router(state, &Settings::default())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_user(app: &Router, username: &str, team_id: Option<&str>) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/users",
            Some(json!({ "username": username, "teamId": team_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_pull_request_flow() {
        let app = app();

        let (status, team) = send(
            &app,
            Method::POST,
            "/api/v1/teams",
            Some(json!({ "name": "backend" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let team_id = team["data"]["id"].as_str().unwrap().to_string();

        let author = create_user(&app, "author", Some(team_id.as_str())).await;
        let reviewer = create_user(&app, "reviewer", Some(team_id.as_str())).await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/pull-requests",
            Some(json!({ "title": "Add caching", "authorId": author })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["status"], "OPEN");
        assert_eq!(created["data"]["reviewers"], json!([reviewer]));
        let pr_id = created["data"]["id"].as_str().unwrap().to_string();

        // Nobody left to take over the only review
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/pull-requests/{}/reassign", pr_id),
            Some(json!({ "reviewerId": reviewer })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NO_AVAILABLE_REVIEWERS");

        let (status, merged) = send(
            &app,
            Method::POST,
            &format!("/api/v1/pull-requests/{}/merge", pr_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(merged["data"]["status"], "MERGED");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/pull-requests/{}/reassign", pr_id),
            Some(json!({ "reviewerId": reviewer })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PR_MERGED");

        let (status, reviews) = send(
            &app,
            Method::GET,
            &format!("/api/v1/users/{}/pull-requests", reviewer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reviews["data"][0]["id"], pr_id.as_str());

        let (status, stats) = send(&app, Method::GET, "/api/v1/statistics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["data"]["totalAssignments"], 1);
        assert_eq!(stats["data"]["mergedPullRequests"], 1);
    }

    #[tokio::test]
    async fn test_deactivate_members_endpoint() {
        let app = app();
        let (_, team) = send(
            &app,
            Method::POST,
            "/api/v1/teams",
            Some(json!({ "name": "retiring" })),
        )
        .await;
        let team_id = team["data"]["id"].as_str().unwrap().to_string();
        create_user(&app, "one", Some(team_id.as_str())).await;
        create_user(&app, "two", Some(team_id.as_str())).await;

        let uri = format!("/api/v1/teams/{}/deactivate-members", team_id);
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deactivatedCount"], 2);

        let (_, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(body["data"]["deactivatedCount"], 0);
    }

    #[tokio::test]
    async fn test_error_responses() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/pull-requests/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "PR_NOT_FOUND");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(json!({ "username": "no spaces allowed" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        create_user(&app, "taken", None).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(json!({ "username": "taken" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/pull-requests",
            Some(json!({ "title": "Orphan", "authorId": uuid::Uuid::new_v4() })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "AUTHOR_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let app = app();
        let user_id = create_user(&app, "frank", None).await;
        let uri = format!("/api/v1/users/{}", user_id);

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "isActive": false }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isActive"], false);
        assert_eq!(body["data"]["username"], "frank");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "USER_NOT_FOUND");
    }
}
