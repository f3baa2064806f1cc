use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::SameSite;
use axum_login::{
    tower_sessions::{Expiry, SessionManagerLayer, SessionStore},
    AuthManagerLayerBuilder,
};
use time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{
    app_state::AppState,
    auth::{self, AuthBackend},
    routes,
};

/// Assemble the application around any session store: PostgreSQL behind a
/// Moka cache in production, `MemoryStore` for `--in-memory` runs and tests.
pub fn create<Store>(
    app_state: AppState,
    backend: AuthBackend,
    session_store: Store,
    secure_cookies: bool,
) -> Router<()>
where
    Store: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)));
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    // Only the frontend origin may make credentialed requests.
    let app_origin = app_state.app_url.origin().ascii_serialization();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().unwrap_or_default() == app_origin
        }));

    Router::new()
        .route("/", get(|| async { "vimtodo" }))
        .nest("/tasks", routes::tasks::router())
        .merge(auth::router())
        .layer(auth_layer)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
