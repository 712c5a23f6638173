//! Integration tests for the registration API.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use lazarus_api::create_router;
use lazarus_core::{
    ConfigStore, ContainerDetails, CoreError, CreatedContainer, Engine, EngineEvent,
    NullPersister,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Engine double exposing a fixed set of running containers to inspect.
struct StaticEngine {
    running: HashMap<String, ContainerDetails>,
}

impl StaticEngine {
    fn with_running(name: &str, config: Value) -> Self {
        let details = ContainerDetails {
            id: format!("id-{name}"),
            name: format!("/{name}"),
            config,
            host_config: json!({}),
        };
        Self {
            running: HashMap::from([(name.to_string(), details)]),
        }
    }

    fn empty() -> Self {
        Self {
            running: HashMap::new(),
        }
    }
}

#[async_trait]
impl Engine for StaticEngine {
    async fn inspect(&self, id: &str) -> lazarus_core::Result<ContainerDetails> {
        self.running
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("no such container: {id}")))
    }

    async fn remove(&self, _id: &str) -> lazarus_core::Result<()> {
        unimplemented!("registration never removes containers")
    }

    async fn create(&self, _name: &str, _document: &Value) -> lazarus_core::Result<CreatedContainer> {
        unimplemented!("registration never creates containers")
    }

    async fn start(&self, _id: &str, _host_config: &Value) -> lazarus_core::Result<()> {
        unimplemented!("registration never starts containers")
    }

    async fn subscribe(&self) -> lazarus_core::Result<mpsc::Receiver<EngineEvent>> {
        unimplemented!("registration never subscribes")
    }
}

fn test_router(engine: StaticEngine) -> (axum::Router, Arc<ConfigStore>) {
    let store = Arc::new(ConfigStore::new(Box::new(NullPersister)));
    let router = create_router(Arc::clone(&store), Arc::new(engine));
    (router, store)
}

fn register_request(name: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/containers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "name": name }).to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn list_is_empty_initially() {
    let (app, _store) = test_router(StaticEngine::empty());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/containers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn register_captures_the_inspected_configuration() {
    let (app, store) = test_router(StaticEngine::with_running("web1", json!({"Image": "nginx"})));

    let response = app.oneshot(register_request("web1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"name": "web1"}));
    assert_eq!(store.get("web1"), Some(json!({"Image": "nginx"})));
}

#[tokio::test]
async fn register_unknown_container_is_404() {
    let (app, store) = test_router(StaticEngine::empty());

    let response = app.oneshot(register_request("ghost")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.get("ghost"), None);
}

#[tokio::test]
async fn register_twice_is_409() {
    let (app, _store) = test_router(StaticEngine::with_running("web1", json!({"Image": "nginx"})));

    let first = app.clone().oneshot(register_request("web1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(register_request("web1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_empty_name_is_400() {
    let (app, _store) = test_router(StaticEngine::empty());

    let response = app.oneshot(register_request("///")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fetch_returns_stored_document_or_404() {
    let (app, store) = test_router(StaticEngine::empty());
    store.add("web1", json!({"Image": "nginx"}));

    let found = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/containers/web1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(body_json(found).await, json!({"Image": "nginx"}));

    let missing = app
        .oneshot(
            Request::builder()
                .uri("/containers/db1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unregister_is_idempotent_204() {
    let (app, store) = test_router(StaticEngine::empty());
    store.add("web1", json!({"Image": "nginx"}));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/containers/web1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    assert_eq!(store.get("web1"), None);
}

#[tokio::test]
async fn listed_names_are_sorted() {
    let (app, store) = test_router(StaticEngine::empty());
    store.add("web2", json!({}));
    store.add("db1", json!({}));
    store.add("web1", json!({}));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/containers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(body_json(response).await, json!(["db1", "web1", "web2"]));
}
