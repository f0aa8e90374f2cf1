#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};

use postdeck::config::Config;
use postdeck::models::session::{SessionToken, SessionUser};
use postdeck::state::AppState;
use postdeck::storage::kv::SharedStorage;

/// The only token the stub accepts.
pub const GOOD_TOKEN: &str = "t1";
/// The password the stub accepts for any email.
pub const GOOD_PASSWORD: &str = "secret1";
/// Logging in as this user returns a user record without an id.
pub const NO_ID_EMAIL: &str = "noid@example.com";
/// Logging in as this user returns a record carrying both `_id` and `id`.
pub const BOTH_IDS_EMAIL: &str = "both@example.com";
/// A JWT whose payload is `{"id":"u7"}`.
pub const CLAIMS_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJpZCI6InU3In0.sig";

#[derive(Default)]
struct StubState {
    hits: AtomicUsize,
}

/// A stand-in for the blog API, listening on an ephemeral port.
pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());

        let app = Router::new()
            .route("/api/register", post(register))
            .route("/api/login", post(login))
            .route("/api/blog", get(list_blogs).post(create_blog))
            .route(
                "/api/blog/{id}",
                get(get_blog).put(update_blog).delete(delete_blog),
            )
            .route(
                "/api/profile",
                get(get_profile).put(update_profile).delete(delete_profile),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// The number of requests the stub has served.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> Config {
        Config {
            api_url: self.base_url.clone(),
            storage_path: PathBuf::from("unused.json"),
            page_size: 9,
            request_timeout: Duration::from_secs(5),
        }
    }

    /// A fresh app over its own in-memory storage.
    pub fn app(&self) -> AppState {
        self.app_on(&SharedStorage::in_memory())
    }

    /// An app attached to `storage`, as a second tab would be.
    pub fn app_on(&self, storage: &SharedStorage) -> AppState {
        AppState::with_storage(&self.config(), storage).unwrap()
    }
}

/// Stores a session for user `u1` without going through login.
pub fn log_in_as(app: &AppState, token: &str, user_id: &str) {
    let mut user = SessionUser::new(user_id);
    user.display_name = Some("Ann".into());
    app.session
        .set_session(SessionToken::new(token), Some(user))
        .unwrap();
}

pub fn blog_json(id: &str, owner: &str, category: &str, author: Option<&str>) -> Value {
    json!({
        "_id": id,
        "title": format!("Post {}", id),
        "category": category,
        "content": "Some content that is long enough.",
        "author": author,
        "createdAt": "2024-03-01T10:00:00Z",
        "userId": owner,
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", GOOD_TOKEN))
        .unwrap_or(false)
}

fn invalid_token() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid token" })),
    )
}

async fn register(State(stub): State<Arc<StubState>>, Json(body): Json<Value>) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "User already exists" })),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({ "user": { "_id": "u9", "name": body["name"], "email": body["email"] } })),
    )
}

async fn login(State(stub): State<Arc<StubState>>, Json(body): Json<Value>) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if body["password"] != GOOD_PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid credentials" })),
        );
    }
    let response = if body["email"] == NO_ID_EMAIL {
        json!({
            "token": CLAIMS_TOKEN,
            "user": { "name": "Ann", "email": body["email"] },
        })
    } else if body["email"] == BOTH_IDS_EMAIL {
        json!({
            "token": GOOD_TOKEN,
            "user": { "_id": "u1", "id": "u1", "name": "Ann", "email": body["email"] },
        })
    } else {
        json!({
            "token": GOOD_TOKEN,
            "user": { "_id": "u1", "name": "Ann", "email": body["email"] },
        })
    };
    (StatusCode::OK, Json(response))
}

async fn list_blogs(
    State(stub): State<Arc<StubState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    match params.get("category").map(String::as_str) {
        Some("Travel") => Json(json!({
            "blogs": [],
            "totalPages": 0,
            "currentPage": 1,
            "totalBlogs": 0,
        })),
        Some("Slow") => {
            tokio::time::sleep(Duration::from_millis(400)).await;
            Json(json!({
                "blogs": [blog_json("slow", "u2", "Career", None)],
                "totalPages": 1,
                "currentPage": 1,
                "totalBlogs": 1,
            }))
        }
        category => Json(json!({
            "blogs": [
                blog_json("b1", "u1", category.unwrap_or("Finance"), Some("Ann")),
                blog_json("b2", "u2", category.unwrap_or("Career"), None),
            ],
            "totalPages": 1,
            "currentPage": params.get("page").cloned().unwrap_or_else(|| "1".into()),
            "totalBlogs": 2,
        })),
    }
}

async fn get_blog(State(stub): State<Arc<StubState>>, Path(id): Path<String>) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    match id.as_str() {
        "b1" => (StatusCode::OK, Json(blog_json("b1", "u1", "Finance", Some("Ann")))),
        "b2" => (StatusCode::OK, Json(blog_json("b2", "u2", "Career", None))),
        "u1" => (
            StatusCode::OK,
            Json(json!({ "blog": [
                blog_json("b1", "u1", "Finance", Some("Ann")),
                blog_json("b3", "u1", "Travel", Some("Ann")),
            ] })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Blog not found" })),
        ),
    }
}

async fn create_blog(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return invalid_token();
    }
    let mut blog = body.clone();
    blog["_id"] = json!("new1");
    (StatusCode::CREATED, Json(json!({ "blog": blog })))
}

async fn update_blog(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return invalid_token();
    }
    let mut blog = body.clone();
    blog["_id"] = json!(id);
    blog["userId"] = json!("u1");
    (StatusCode::OK, Json(json!({ "blog": blog })))
}

async fn delete_blog(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return invalid_token();
    }
    (StatusCode::OK, Json(json!({ "message": "Blog deleted" })))
}

async fn get_profile(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return invalid_token();
    }
    (
        StatusCode::OK,
        Json(json!({ "user": { "_id": "u1", "userName": "Ann", "email": "ann@example.com" } })),
    )
}

async fn update_profile(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return invalid_token();
    }
    (
        StatusCode::OK,
        Json(json!({
            "_id": "u1",
            "userName": body["userName"],
            "email": "ann@example.com",
            "profileImage": body["profileImage"],
        })),
    )
}

async fn delete_profile(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return invalid_token();
    }
    (StatusCode::OK, Json(json!({ "message": "Account deleted" })))
}
