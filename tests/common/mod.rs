//! In-process stand-in for the downstream Pokemon REST service, plus helpers
//! to run the gateway against it on ephemeral ports.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pokedex_gateway::{EventBus, Gateway, Pokemon};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Id for which the service answers `200 null` instead of a 404.
pub const GHOST_ID: &str = "ghost";

/// Id for which the service answers 200 with a body that is not a pokemon.
pub const GARBLED_ID: &str = "garbled";

#[derive(Clone, Default)]
pub struct Downstream {
    pub url: String,
    pokemon: Arc<Mutex<BTreeMap<String, Value>>>,
    generation_hits: Arc<AtomicUsize>,
    down: Arc<AtomicBool>,
}

impl Downstream {
    pub fn generation_hits(&self) -> usize {
        self.generation_hits.load(Ordering::SeqCst)
    }

    /// Make every endpoint answer 503.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn insert(&self, pokemon: Value) {
        let id = pokemon["id"].as_str().expect("pokemon id").to_string();
        self.pokemon.lock().unwrap().insert(id, pokemon);
    }

    fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }
}

pub fn bulbasaur() -> Value {
    json!({
        "id": "p1",
        "name": "Bulbasaur",
        "nameJP": "フシギダネ",
        "type": ["grass", "poison"],
        "species": "Seed",
        "height": 0.7,
        "weight": 6.9,
        "generationId": 1
    })
}

pub fn charmander() -> Value {
    json!({
        "id": "p4",
        "name": "Charmander",
        "nameJP": "ヒトカゲ",
        "type": ["fire"],
        "species": "Lizard",
        "height": 0.6,
        "weight": 8.5,
        "generationId": 1
    })
}

pub async fn spawn_downstream() -> Downstream {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind downstream");
    let addr = listener.local_addr().expect("downstream addr");

    let service = Downstream {
        url: format!("http://{addr}"),
        ..Downstream::default()
    };

    let app = Router::new()
        .route("/pokemon", get(list).post(create))
        .route("/pokemon/{id}", get(fetch).patch(update).delete(remove))
        .route("/generation/{id}", get(generation))
        .with_state(service.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("downstream serve");
    });

    service
}

async fn list(State(svc): State<Downstream>) -> Response {
    if svc.is_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let all: Vec<Value> = svc.pokemon.lock().unwrap().values().cloned().collect();
    Json(all).into_response()
}

async fn create(State(svc): State<Downstream>, Json(body): Json<Value>) -> Response {
    if svc.is_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if body["name"].as_str().map_or(true, str::is_empty) {
        return (StatusCode::UNPROCESSABLE_ENTITY, "name is required").into_response();
    }
    svc.insert(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn fetch(State(svc): State<Downstream>, Path(id): Path<String>) -> Response {
    if svc.is_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if id == GHOST_ID {
        return Json(Value::Null).into_response();
    }
    if id == GARBLED_ID {
        return Json(json!({ "id": 7, "name": ["not", "a", "name"] })).into_response();
    }
    match svc.pokemon.lock().unwrap().get(&id) {
        Some(pokemon) => Json(pokemon.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn update(
    State(svc): State<Downstream>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    if svc.is_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let mut pokemon = svc.pokemon.lock().unwrap();
    let Some(existing) = pokemon.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    };
    if let (Some(target), Some(fields)) = (existing.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(existing.clone()).into_response()
}

async fn remove(State(svc): State<Downstream>, Path(id): Path<String>) -> Response {
    if svc.is_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match svc.pokemon.lock().unwrap().remove(&id) {
        Some(_) => Json(json!({})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn generation(State(svc): State<Downstream>, Path(id): Path<i32>) -> Response {
    if svc.is_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    svc.generation_hits.fetch_add(1, Ordering::SeqCst);
    if id != 1 {
        return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
    }
    Json(json!({ "id": 1, "name": "generation-i", "region": "kanto" })).into_response()
}

pub struct TestGateway {
    pub addr: SocketAddr,
    pub bus: EventBus<Pokemon>,
}

impl TestGateway {
    pub fn graphql_url(&self) -> String {
        format!("http://{}/graphql", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/graphql/ws", self.addr)
    }

    /// POST a GraphQL request and return the decoded JSON response.
    pub async fn post(&self, query: &str, variables: Value) -> Value {
        reqwest::Client::new()
            .post(self.graphql_url())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .expect("gateway reachable")
            .json()
            .await
            .expect("json response")
    }
}

pub async fn spawn_gateway(downstream_url: &str) -> TestGateway {
    let gateway = Gateway::builder()
        .with_downstream_url(downstream_url)
        .build()
        .expect("gateway builds");
    let bus = gateway.event_bus().clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().expect("gateway addr");
    let app = gateway.into_router();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("gateway serve");
    });

    TestGateway { addr, bus }
}

/// Poll `condition` until it holds, failing the test after a few seconds.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
