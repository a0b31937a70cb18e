use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;

use crate::auth::token::TokenCodec;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Authentication state shared with middleware
#[derive(Clone)]
pub struct AuthState {
    pub codec: TokenCodec,
}

/// Identity attached to requests that pass the authentication gate
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Authentication middleware for protected routes.
///
/// A missing cookie and a failed verification produce the same response, so
/// the client cannot tell an absent session from an expired or forged one.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return unauthorized_response();
    };

    let email = match state.codec.verify(cookie.value(), Utc::now()) {
        Ok(email) => email,
        Err(_) => return unauthorized_response(),
    };

    request.extensions_mut().insert(AuthenticatedUser(email));
    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": "Missing or invalid session token"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest},
        middleware,
        routing::get,
        Extension, Router,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        user.0
    }

    fn codec() -> TokenCodec {
        TokenCodec::new("0123456789abcdef0123456789abcdef").unwrap()
    }

    fn test_router(codec: TokenCodec) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                AuthState { codec },
                auth_middleware,
            ))
    }

    #[tokio::test]
    async fn test_missing_cookie_is_rejected() {
        let app = test_router(codec());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let app = test_router(codec());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, "session=not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let codec = codec();
        let issued = Utc::now() - Duration::days(61);
        let token = codec.issue("a@b.com", issued).unwrap();
        let app = test_router(codec);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, format!("session={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler_with_identity() {
        let codec = codec();
        let token = codec.issue("a@b.com", Utc::now()).unwrap();
        let app = test_router(codec);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, format!("session={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"a@b.com");
    }
}
