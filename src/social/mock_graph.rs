//! In-process stand-in for the Graph API endpoints the fan page connector uses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub const APP_ID: &str = "app-id";
pub const APP_SECRET: &str = "app-secret";
const ACCESS_TOKEN: &str = "mock-token";

#[derive(Clone, Default)]
pub struct MockGraph {
    pages: Arc<Mutex<HashMap<String, String>>>,
    token_requests: Arc<AtomicUsize>,
}

impl MockGraph {
    pub fn set_posts(&self, page: &str, posts: Value) {
        self.set_raw_posts(page, &json!({ "data": posts }).to_string());
    }

    pub fn set_raw_posts(&self, page: &str, body: &str) {
        self.pages
            .lock()
            .expect("pages lock")
            .insert(page.to_string(), body.to_string());
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }
}

async fn access_token(
    State(graph): State<MockGraph>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    graph.token_requests.fetch_add(1, Ordering::SeqCst);
    let valid = params.get("client_id").map(String::as_str) == Some(APP_ID)
        && params.get("client_secret").map(String::as_str) == Some(APP_SECRET)
        && params.get("grant_type").map(String::as_str) == Some("client_credentials");

    if valid {
        Json(json!({ "access_token": ACCESS_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "Error validating client secret." } })),
        )
            .into_response()
    }
}

async fn posts(
    State(graph): State<MockGraph>,
    Path(page): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("access_token").map(String::as_str) != Some(ACCESS_TOKEN) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let body = graph.pages.lock().expect("pages lock").get(&page).cloned();
    match body {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves `graph` on an ephemeral local port and returns its base URL.
pub async fn spawn(graph: MockGraph) -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/oauth/access_token", get(access_token))
        .route("/{page}/posts", get(posts))
        .with_state(graph);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = listener.local_addr().expect("local addr should exist");
    let join_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    (format!("http://{address}"), join_handle)
}
