use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    authenticate, hash_password, normalize_email, validate_credentials, AuthError,
    AuthenticatedUser,
};
use crate::state::ServerState;
use crate::storage::{CreateUser, StorageError};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Session validation response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Login endpoint.
///
/// Validation failures and bad credentials render the same response, so the
/// outcome never reveals whether an account exists.
pub async fn login(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    match authenticate(
        state.user_store.as_ref(),
        &state.auth_state.codec,
        &request.email,
        &request.password,
    )
    .await
    {
        Ok(token) => {
            info!("User {} logged in successfully", normalize_email(&request.email));
            Ok(Json(LoginResponse {
                message: "Login successful".to_string(),
                token,
            }))
        }
        Err(AuthError::Validation(_)) | Err(AuthError::InvalidCredentials) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Email or password incorrect".to_string(),
                code: "AUTH_FAILED".to_string(),
            }),
        )),
        Err(e) => {
            warn!("Login failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal error".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                }),
            ))
        }
    }
}

/// Registration endpoint
pub async fn register(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, Json<ErrorResponse>)> {
    let email = normalize_email(&request.email);

    if let Err(e) = validate_credentials(&email, &request.password) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "VALIDATION".to_string(),
            }),
        ));
    }

    let password_hash = hash_password(&request.password, &state.config.hash_cost).map_err(|e| {
        warn!("Password hashing error: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to hash password".to_string(),
                code: "INTERNAL_ERROR".to_string(),
            }),
        )
    })?;

    match state
        .user_store
        .create_user(CreateUser {
            email: email.clone(),
            password_hash,
        })
        .await
    {
        Ok(user) => {
            info!("User {} registered", user.email);
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse {
                    message: "User created successfully".to_string(),
                }),
            ))
        }
        Err(StorageError::DuplicateEmail(_)) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Email already registered".to_string(),
                code: "DUPLICATE_EMAIL".to_string(),
            }),
        )),
        Err(e) => {
            warn!("Failed to create user: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                }),
            ))
        }
    }
}

/// Session introspection endpoint, reachable only through the gate
pub async fn check_session(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<SessionResponse> {
    Json(SessionResponse { message: user.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{auth_middleware, HashCost, TokenCodec};
    use crate::config::ServerConfig;
    use crate::storage::{SqliteRecordStore, SqliteUserStore};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        middleware,
        routing::{get, post, put},
        Router,
    };
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            bind_addr: "127.0.0.1".to_string(),
            database_url: "sqlite::memory:".to_string(),
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            hash_cost: HashCost {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            cors_origins: vec![],
        }
    }

    async fn test_app() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let user_store = SqliteUserStore::new(pool.clone());
        user_store.initialize().await.unwrap();
        let record_store = SqliteRecordStore::new(pool.clone());
        record_store.initialize().await.unwrap();

        let config = test_config();
        let codec = TokenCodec::new(&config.session_secret).unwrap();
        let state = Arc::new(ServerState::new(
            config,
            Arc::new(user_store),
            Arc::new(record_store),
            codec,
            pool,
        ));

        let protected = Router::new()
            .route("/api/check-session", get(check_session))
            .layer(middleware::from_fn_with_state(
                state.auth_state.clone(),
                auth_middleware,
            ));

        Router::new()
            .route("/login", post(login))
            .route("/api/user", put(register))
            .merge(protected)
            .with_state(state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_login_check_session_flow() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/user",
                json!({ "email": "a@b.com", "password": "hunter22" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                json!({ "email": "a@b.com", "password": "hunter22" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let token = body["token"].as_str().unwrap();
        assert!(!token.is_empty());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/check-session")
                    .header(header::COOKIE, format!("session={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "a@b.com");
    }

    #[tokio::test]
    async fn test_login_failures_share_one_response() {
        let app = test_app().await;

        app.clone()
            .oneshot(json_request(
                "PUT",
                "/api/user",
                json!({ "email": "a@b.com", "password": "hunter22" }),
            ))
            .await
            .unwrap();

        // Wrong password, unknown user and a validation failure must be
        // indistinguishable at the HTTP boundary
        let attempts = [
            json!({ "email": "a@b.com", "password": "wrong-password" }),
            json!({ "email": "nobody@b.com", "password": "hunter22" }),
            json!({ "email": "a@b.com", "password": "short" }),
        ];

        let mut bodies = Vec::new();
        for attempt in attempts {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/login", attempt))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(body_json(response).await);
        }

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[1], bodies[2]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = test_app().await;

        let request = json!({ "email": "a@b.com", "password": "hunter22" });

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/api/user", request.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Same address with different case is still the same account
        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/user",
                json!({ "email": "A@B.COM", "password": "hunter22" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_registration_validates_input() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/user",
                json!({ "email": "not-an-email", "password": "hunter22" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/user",
                json!({ "email": "a@b.com", "password": "short" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
