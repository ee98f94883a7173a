//! In-process mock of the Kubernetes API server
//!
//! Records every request and answers from a table keyed by method and path.
//! Unknown routes get a 404 Status body.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};

/// A request as seen by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<HashMap<(String, String), (u16, String)>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockApiServer {
    pub url: String,
    state: MockState,
}

impl MockApiServer {
    /// Start a server answering `(method, path) -> (status, body)`
    pub async fn start(routes: Vec<(&str, &str, u16, Value)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(method, path, status, body)| {
                ((method.to_string(), path.to_string()), (status, body.to_string()))
            })
            .collect();
        let state = MockState {
            routes: Arc::new(routes),
            requests: Arc::default(),
        };

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let request = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        content_type: header_value(header::CONTENT_TYPE),
        authorization: header_value(header::AUTHORIZATION),
        body: body.to_vec(),
    };
    state.requests.lock().unwrap().push(request);

    let (status, body) = state
        .routes
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned()
        .unwrap_or_else(|| {
            (
                404,
                json!({"kind": "Status", "status": "Failure", "reason": "NotFound"}).to_string(),
            )
        });

    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// A ReplicaSet list with one item per `(name, app label)`
pub fn replicaset_list(items: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(name, app)| {
            json!({
                "metadata": {
                    "name": name,
                    "namespace": "default",
                    "labels": {"app": app, "pod-template-hash": "5d8f"}
                },
                "spec": {"replicas": 1}
            })
        })
        .collect();
    json!({"kind": "ReplicaSetList", "apiVersion": "apps/v1", "items": items})
}
