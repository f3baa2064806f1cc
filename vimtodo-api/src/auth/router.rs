use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_login::tower_sessions::Session;
use oauth2::CsrfToken;
use serde::Deserialize;

use crate::{app_state::AppState, routes::ApiError};

const NEXT_URL_KEY: &str = "auth.next-url";
const CSRF_STATE_KEY: &str = "oauth.csrf-state";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(self::get::me))
        .route("/register", post(self::post::register))
        .route("/login/password", post(self::post::password_login))
        .route("/login", post(self::post::login))
        .route("/logout", get(self::get::logout))
        .route("/oauth/callback", get(self::get::callback))
}

#[derive(Debug, Deserialize)]
struct NextUrl {
    next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthzResp {
    code: String,
    state: CsrfToken,
}

/// Where to send the browser after an OAuth login. Relative `next` values
/// resolve against the frontend. Absolute ones are only honoured on loopback,
/// for the terminal client's callback listener, and receive the session id
/// since that client cannot read the browser's cookie.
fn callback_destination(
    app_url: &url::Url,
    next: Option<&str>,
    session_id: Option<&str>,
) -> Result<url::Url, ApiError> {
    let Some(next) = next else {
        return Ok(app_url.clone());
    };

    if let Ok(mut absolute) = url::Url::parse(next) {
        let loopback = matches!(absolute.host_str(), Some("localhost" | "127.0.0.1"));
        if !loopback {
            return Err(ApiError::bad_request("Invalid next URL"));
        }
        if let Some(session_id) = session_id {
            absolute
                .query_pairs_mut()
                .append_pair("session_id", session_id);
        }
        return Ok(absolute);
    }

    app_url.join(next).map_err(|e| {
        tracing::error!("Failed to join next URL with app URL: {}", e);
        ApiError::bad_request("Invalid next URL")
    })
}

fn session_failure(err: impl std::fmt::Display) -> ApiError {
    tracing::error!("Session store failure: {}", err);
    ApiError::internal("Session store failure")
}

mod post {
    use axum::{extract::State, Json};
    use tracing::instrument;

    use crate::{
        auth::{
            backend::{AuthSession, Credentials, PasswordCredentials},
            hash_password,
        },
        domain::{Registration, User},
        repositories::NewUser,
        routes::{Envelope, JsonBody},
    };

    use super::*;

    #[derive(Deserialize)]
    pub struct RegisterBody {
        #[serde(default)]
        name: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        password: String,
    }

    #[instrument(name = "register", skip(app_state, body))]
    pub async fn register(
        State(app_state): State<AppState>,
        JsonBody(body): JsonBody<RegisterBody>,
    ) -> Result<(StatusCode, Json<Envelope<User>>), ApiError> {
        let registration = Registration::parse(&body.name, &body.email, &body.password)?;

        let password = registration.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?
            .map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                ApiError::internal("Failed to register user")
            })?;

        let user = app_state
            .users
            .create_user(&NewUser {
                email: registration.email,
                name: registration.name,
                password_hash,
            })
            .await?;
        tracing::info!(user_id = %user.id, "user registered");

        Ok((StatusCode::CREATED, Json(Envelope::success(user))))
    }

    #[instrument(name = "password_login", skip(auth_session, creds), fields(email = %creds.email))]
    pub async fn password_login(
        mut auth_session: AuthSession,
        JsonBody(creds): JsonBody<PasswordCredentials>,
    ) -> Result<StatusCode, ApiError> {
        let user = match auth_session
            .authenticate(Credentials::Password(creds))
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => return Err(ApiError::unauthorized("Invalid email or password")),
            Err(e) => {
                tracing::error!("Authentication failed: {}", e);
                return Err(ApiError::internal("Authentication failed"));
            }
        };

        auth_session.login(&user).await.map_err(|e| {
            tracing::error!("Failed to log in user: {}", e);
            ApiError::internal("Failed to log in")
        })?;

        Ok(StatusCode::NO_CONTENT)
    }

    pub async fn login(
        auth_session: AuthSession,
        session: Session,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> Result<String, ApiError> {
        let (auth_url, csrf_state) = auth_session
            .backend
            .authorize_url()
            .ok_or_else(|| ApiError::not_found("OAuth login is not configured"))?;

        session
            .insert(CSRF_STATE_KEY, csrf_state.secret())
            .await
            .map_err(session_failure)?;
        session
            .insert(NEXT_URL_KEY, next)
            .await
            .map_err(session_failure)?;

        Ok(auth_url.as_str().to_string())
    }
}

mod get {
    use axum::{extract::State, Json};
    use tracing::instrument;

    use crate::{
        auth::{
            backend::{AuthSession, Credentials, OAuthCredentials},
            AuthUser,
        },
        domain::User,
        routes::Envelope,
    };

    use super::*;

    pub async fn me(user: AuthUser) -> Json<Envelope<User>> {
        Json(Envelope::success(User::clone(&user)))
    }

    pub async fn logout(mut auth_session: AuthSession) -> Result<StatusCode, ApiError> {
        auth_session.logout().await.map_err(|e| {
            tracing::error!("Failed to log out: {}", e);
            ApiError::internal("Failed to log out")
        })?;
        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(name = "auth_callback", skip(auth_session, session, app_state, code, new_state))]
    pub async fn callback(
        mut auth_session: AuthSession,
        session: Session,
        Query(AuthzResp {
            code,
            state: new_state,
        }): Query<AuthzResp>,
        State(app_state): State<AppState>,
    ) -> Result<Response, ApiError> {
        if !auth_session.backend.oauth_enabled() {
            return Err(ApiError::not_found("OAuth login is not configured"));
        }

        let Ok(Some(old_state)) = session.get(CSRF_STATE_KEY).await else {
            tracing::error!("Failed to get CSRF state from session");
            return Err(ApiError::bad_request("Missing OAuth state"));
        };

        let creds = Credentials::OAuth(OAuthCredentials {
            code,
            old_state,
            new_state,
        });

        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::error!("CSRF state validation failed");
                return Err(ApiError::unauthorized("Invalid CSRF state"));
            }
            Err(e) => {
                tracing::error!("Authentication failed: {}", e);
                return Err(ApiError::internal("Authentication failed"));
            }
        };

        auth_session.login(&user).await.map_err(|e| {
            tracing::error!("Failed to log in user: {}", e);
            ApiError::internal("Failed to log in")
        })?;

        // Persist now so the cycled session id is known before the redirect.
        session.save().await.map_err(session_failure)?;
        let next = session
            .remove::<String>(NEXT_URL_KEY)
            .await
            .ok()
            .flatten();
        let session_id = session.id().map(|id| id.to_string());

        let destination =
            callback_destination(&app_state.app_url, next.as_deref(), session_id.as_deref())?;

        Ok(Redirect::to(destination.as_str()).into_response())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;
    use url::Url;

    use crate::{app_state::AppState, auth::AuthBackend, router};

    fn app() -> Router {
        let state = AppState::in_memory(Url::parse("http://localhost:3000").unwrap());
        let backend = AuthBackend::new(state.users.clone(), None);
        router::create(state, backend, MemoryStore::default(), false)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration(email: &str, password: &str) -> Value {
        json!({ "name": "Ada", "email": email, "password": password })
    }

    #[tokio::test]
    async fn register_returns_public_user() {
        let app = app();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/register",
                registration("Ada@Example.com", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert!(body["data"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn register_rejects_weak_password_and_duplicate_email() {
        let app = app();

        let weak = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/register",
                registration("ada@example.com", "secret"),
            ))
            .await
            .unwrap();
        assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

        let first = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/register",
                registration("ada@example.com", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let duplicate = app
            .oneshot(json_request(
                Method::POST,
                "/register",
                registration("ADA@example.com", "Secret123"),
            ))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(duplicate).await["status"], "error");
    }

    #[tokio::test]
    async fn malformed_login_body_is_a_bad_request() {
        let response = app()
            .oneshot(json_request(
                Method::POST,
                "/login/password",
                json!({ "email": ["ada@example.com"], "password": 123 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "error");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = app();
        app.clone()
            .oneshot(json_request(
                Method::POST,
                "/register",
                registration("ada@example.com", "Secret123"),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/login/password",
                json!({ "email": "ada@example.com", "password": "Secret999" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_follows_the_session() {
        let app = app();
        app.clone()
            .oneshot(json_request(
                Method::POST,
                "/register",
                registration("ada@example.com", "Secret123"),
            ))
            .await
            .unwrap();

        let login = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/login/password",
                json!({ "email": "ada@example.com", "password": "Secret123" }),
            ))
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::NO_CONTENT);
        let cookie = login
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .unwrap()
            .to_string();

        let me = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(body_json(me).await["data"]["name"], "Ada");

        let anonymous = app
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn callback_destination_resolves_next() {
        let app_url = Url::parse("http://localhost:3000").unwrap();

        let home = super::callback_destination(&app_url, None, Some("abc")).unwrap();
        assert_eq!(home.as_str(), "http://localhost:3000/");

        let relative = super::callback_destination(&app_url, Some("/tasks"), None).unwrap();
        assert_eq!(relative.as_str(), "http://localhost:3000/tasks");

        let terminal = super::callback_destination(
            &app_url,
            Some("http://localhost:9876/callback"),
            Some("abc"),
        )
        .unwrap();
        assert_eq!(
            terminal.as_str(),
            "http://localhost:9876/callback?session_id=abc"
        );

        assert!(
            super::callback_destination(&app_url, Some("https://evil.example/"), Some("abc"))
                .is_err()
        );
    }

    #[tokio::test]
    async fn oauth_routes_are_absent_without_provider() {
        let app = app();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
