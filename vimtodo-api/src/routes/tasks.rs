use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{models::TaskId, Task, TaskPatch, TaskText},
};

use super::{ApiError, Envelope, JsonBody};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", put(update_task).delete(delete_task))
}

#[derive(Debug, Deserialize)]
struct CreateTaskBody {
    #[serde(default)]
    task: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskBody {
    task: Option<String>,
    completed: Option<bool>,
}

#[instrument(name = "list_tasks", skip(user, app_state), fields(user_id = %user.id))]
async fn list_tasks(
    user: AuthUser,
    State(app_state): State<AppState>,
) -> Result<Json<Envelope<Vec<Task>>>, ApiError> {
    let tasks = app_state.tasks.list_tasks(user.id).await?;
    Ok(Json(Envelope::success(tasks)))
}

#[instrument(name = "create_task", skip(user, app_state, body), fields(user_id = %user.id))]
async fn create_task(
    user: AuthUser,
    State(app_state): State<AppState>,
    JsonBody(body): JsonBody<CreateTaskBody>,
) -> Result<(StatusCode, Json<Envelope<Task>>), ApiError> {
    let text = TaskText::parse(&body.task)?;
    let task = app_state.tasks.create_task(user.id, &text).await?;
    tracing::debug!(task_id = %task.id, "task created");

    Ok((StatusCode::CREATED, Json(Envelope::success(task))))
}

#[instrument(name = "update_task", skip(user, app_state, body), fields(user_id = %user.id))]
async fn update_task(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<TaskId>,
    JsonBody(body): JsonBody<UpdateTaskBody>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let patch = TaskPatch::parse(body.task.as_deref(), body.completed)?;
    app_state.tasks.update_task(&id, user.id, &patch).await?;

    Ok(Json(Envelope::ack()))
}

#[instrument(name = "delete_task", skip(user, app_state), fields(user_id = %user.id))]
async fn delete_task(
    user: AuthUser,
    State(app_state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<Envelope<()>>, ApiError> {
    app_state.tasks.delete_task(&id, user.id).await?;

    Ok(Json(Envelope::ack()))
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

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, json)
    }

    async fn signed_in(app: &Router, email: &str) -> String {
        let (status, _, _) = send(
            app,
            Method::POST,
            "/register",
            None,
            Some(json!({ "name": "Ada", "email": email, "password": "Secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, cookie, _) = send(
            app,
            Method::POST,
            "/login/password",
            None,
            Some(json!({ "email": email, "password": "Secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        cookie.expect("login sets a session cookie")
    }

    async fn create(app: &Router, cookie: &str, text: &str) -> Value {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/tasks",
            Some(cookie),
            Some(json!({ "task": text })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }

    #[tokio::test]
    async fn anonymous_requests_are_rejected() {
        let app = app();

        let (status, _, body) = send(&app, Method::GET, "/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "error");

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/tasks",
            None,
            Some(json!({ "task": "sneaky" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_then_list_newest_first() {
        let app = app();
        let cookie = signed_in(&app, "ada@example.com").await;

        let first = create(&app, &cookie, "  buy milk ").await;
        assert_eq!(first["task"], "buy milk");
        assert_eq!(first["completed"], false);
        assert!(first["createdAt"].is_string());
        assert!(first.get("ownerId").is_none());
        create(&app, &cookie, "walk dog").await;

        let (status, _, body) = send(&app, Method::GET, "/tasks", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let texts: Vec<_> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|task| task["task"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(texts, ["walk dog", "buy milk"]);
    }

    #[tokio::test]
    async fn blank_task_is_a_bad_request() {
        let app = app();
        let cookie = signed_in(&app, "ada@example.com").await;

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&cookie),
            Some(json!({ "task": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn update_and_delete_own_task() {
        let app = app();
        let cookie = signed_in(&app, "ada@example.com").await;
        let task = create(&app, &cookie, "buy milk").await;
        let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

        let (status, _, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&cookie),
            Some(json!({ "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "success" }));

        let (_, _, body) = send(&app, Method::GET, "/tasks", Some(&cookie), None).await;
        assert_eq!(body["data"][0]["completed"], true);

        let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_update_is_a_bad_request() {
        let app = app();
        let cookie = signed_in(&app, "ada@example.com").await;
        let task = create(&app, &cookie, "buy milk").await;
        let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

        let (status, _, _) = send(&app, Method::PUT, &uri, Some(&cookie), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mistyped_bodies_are_bad_requests() {
        let app = app();
        let cookie = signed_in(&app, "ada@example.com").await;
        let task = create(&app, &cookie, "buy milk").await;
        let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

        let (status, _, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&cookie),
            Some(json!({ "completed": "yes" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].is_string());

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/tasks",
            Some(&cookie),
            Some(json!({ "task": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_a_bad_request() {
        let app = app();
        let cookie = signed_in(&app, "ada@example.com").await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/tasks")
            .header(header::COOKIE, &cookie)
            .body(Body::from(json!({ "task": "buy milk" }).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn other_users_tasks_look_missing() {
        let app = app();
        let ada = signed_in(&app, "ada@example.com").await;
        let bob = signed_in(&app, "bob@example.com").await;
        let task = create(&app, &ada, "buy milk").await;
        let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

        let (status, _, _) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&bob),
            Some(json!({ "task": "hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, body) = send(&app, Method::GET, "/tasks", Some(&bob), None).await;
        assert_eq!(body["data"], json!([]));

        let (_, _, body) = send(&app, Method::GET, "/tasks", Some(&ada), None).await;
        assert_eq!(body["data"][0]["task"], "buy milk");
    }
}
