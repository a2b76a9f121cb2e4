pub mod connections;
pub mod matches;
pub mod profiles;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::{error::MatchError, Config};

pub use connections::{accept_request, cancel_request, connection_states, decline_request, resolve_states, send_request};
pub use matches::{check_compatibility, list_matches};
pub use profiles::{create_profile, get_profile, list_patterns, search_profiles, update_patterns};

pub type AppState = (PgPool, Config);

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

pub type ApiFailure = (StatusCode, Json<ApiError>);
pub type ApiResult<T> = Result<Json<T>, ApiFailure>;

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (status, Json(ApiError { error: message.into() }))
}

pub(crate) fn internal_error(context: &str, e: anyhow::Error) -> ApiFailure {
    tracing::error!("{}: {:#}", context, e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, context)
}

pub(crate) fn match_error(e: MatchError) -> ApiFailure {
    match e {
        MatchError::InvalidInput(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        MatchError::MalformedRecord(_) => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

pub fn create_router(pool: PgPool, config: Config) -> Router {
    let cors_layer = create_cors_layer(&config);
    let app_state = (pool, config);

    Router::new()
        .route("/health", get(health_check))
        // Profiles and the pattern library
        .route("/api/profiles", post(create_profile).get(search_profiles))
        .route("/api/profiles/{id}", get(get_profile))
        .route("/api/profiles/{id}/patterns", put(update_patterns))
        .route("/api/patterns", get(list_patterns))
        // Matching
        .route("/api/compatibility", post(check_compatibility))
        .route("/api/matches/{user_id}", get(list_matches))
        // Connections
        .route("/api/connections/resolve", post(resolve_states))
        .route("/api/connections/{user_id}/states", get(connection_states))
        .route("/api/connections/requests", post(send_request))
        .route("/api/connections/requests/{id}", delete(cancel_request))
        .route("/api/connections/requests/{id}/accept", post(accept_request))
        .route("/api/connections/requests/{id}/decline", post(decline_request))
        .layer(cors_layer)
        .with_state(app_state)
}

fn create_cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        // Default to permissive for development
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // The routes exercised here never touch the pool, so it is never connected.
    fn test_app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://patternpals@localhost/unused")
            .unwrap();
        let config = Config {
            database_url: "postgres://patternpals@localhost/unused".to_string(),
            port: 0,
            match_limit: 10,
            allowed_origins: vec![],
        };
        create_router(pool, config)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_compatibility_endpoint_scores_pair() {
        let body = json!({
            "viewer": {
                "id": "00000000-0000-0000-0000-000000000001",
                "name": "Viewer",
                "experience": "intermediate",
                "known_patterns": ["A", "B"],
                "want_to_learn_patterns": ["C"]
            },
            "candidate": {
                "id": "00000000-0000-0000-0000-000000000002",
                "name": "Candidate",
                "experience": "intermediate",
                "known_patterns": ["B", "C"],
                "location": "X"
            }
        });

        let (status, value) = post_json(test_app(), "/api/compatibility", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["score"], 65);
        assert_eq!(value["relations"]["shared"], json!(["B"]));
        assert_eq!(value["relations"]["can_teach"], json!(["C"]));
        assert_eq!(value["relations"]["can_learn"], json!([]));
    }

    #[tokio::test]
    async fn test_compatibility_endpoint_rejects_missing_candidate() {
        let body = json!({
            "viewer": {
                "id": "00000000-0000-0000-0000-000000000001",
                "name": "Viewer",
                "experience": "beginner"
            }
        });

        let (status, value) = post_json(test_app(), "/api/compatibility", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("candidate"));
    }

    #[tokio::test]
    async fn test_resolve_endpoint_applies_precedence() {
        let u1 = "00000000-0000-0000-0000-000000000001";
        let u2 = "00000000-0000-0000-0000-000000000002";
        let u3 = "00000000-0000-0000-0000-000000000003";
        let body = json!({
            "current_user_id": u1,
            "connections": [
                { "user_id_1": u2, "user_id_2": u1, "created_at": "2025-06-01T10:00:00Z" }
            ],
            "incoming": [
                {
                    "id": "00000000-0000-0000-0000-0000000000a1",
                    "from_user_id": u2,
                    "to_user_id": u1,
                    "status": "pending",
                    "created_at": "2025-05-30T10:00:00Z"
                }
            ],
            "outgoing": [
                {
                    "id": "00000000-0000-0000-0000-0000000000a2",
                    "from_user_id": u1,
                    "to_user_id": u3,
                    "status": "pending",
                    "created_at": "2025-05-31T10:00:00Z"
                }
            ]
        });

        let (status, value) = post_json(test_app(), "/api/connections/resolve", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["states"][u2], "connected");
        assert_eq!(value["states"][u3], "pending_out");
        assert_eq!(value["states"].as_object().unwrap().len(), 2);
        assert_eq!(value["skipped"], 0);
    }

    #[tokio::test]
    async fn test_resolve_endpoint_rejects_nil_user() {
        let body = json!({
            "current_user_id": "00000000-0000-0000-0000-000000000000",
        });

        let (status, _) = post_json(test_app(), "/api/connections/resolve", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_request_to_self_rejected_before_lookup() {
        let u1 = "00000000-0000-0000-0000-000000000001";
        let body = json!({ "from_user_id": u1, "to_user_id": u1 });

        let (status, value) = post_json(test_app(), "/api/connections/requests", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("yourself"));
    }

    #[tokio::test]
    async fn test_patterns_rejects_unknown_difficulty() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/patterns?difficulty=juggler")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
