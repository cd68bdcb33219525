//! In-process stand-in for the organization backend.

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
};
use ong_radar::api::{ApiConfig, HttpSearchClient};
use serde_json::{Value, json};

#[derive(Default)]
pub struct Backend {
    /// Raw query strings, in arrival order.
    pub queries: Mutex<Vec<String>>,
    pub status: Mutex<Option<StatusCode>>,
    /// Delay applied to a request whose query contains the key.
    pub delays: Mutex<Vec<(String, Duration)>>,
    /// Records returned per request, unless a query matches one of `pages`.
    pub default_count: Mutex<usize>,
    pub pages: Mutex<Vec<(String, usize)>>,
}

impl Backend {
    pub fn fail_with(&self, status: StatusCode) {
        *self.status.lock().unwrap() = Some(status);
    }

    pub fn delay_when(&self, needle: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .push((needle.to_string(), delay));
    }

    pub fn respond_with(&self, count: usize) {
        *self.default_count.lock().unwrap() = count;
    }

    pub fn respond_when(&self, needle: &str, count: usize) {
        self.pages.lock().unwrap().push((needle.to_string(), count));
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

pub struct TestBackend {
    pub state: Arc<Backend>,
    pub addr: SocketAddr,
}

impl TestBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Backend::default());
        let app = Router::new()
            .route("/ongs/search", get(search))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub backend");
        });

        Self { state, addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> HttpSearchClient {
        let config = ApiConfig::builder()
            .base_url(self.base_url())
            .build()
            .expect("valid stub url");
        HttpSearchClient::new(config).expect("build client")
    }
}

async fn search(
    State(backend): State<Arc<Backend>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Value>>, StatusCode> {
    let query = query.unwrap_or_default();
    backend.queries.lock().unwrap().push(query.clone());

    let delay = backend
        .delays
        .lock()
        .unwrap()
        .iter()
        .find(|(needle, _)| query.contains(needle.as_str()))
        .map(|(_, d)| *d);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(status) = *backend.status.lock().unwrap() {
        return Err(status);
    }

    let count = backend
        .pages
        .lock()
        .unwrap()
        .iter()
        .find(|(needle, _)| query.contains(needle.as_str()))
        .map_or_else(|| *backend.default_count.lock().unwrap(), |(_, c)| *c);

    Ok(Json((0..count).map(|i| organization(&query, i)).collect()))
}

pub fn organization(tag: &str, i: usize) -> Value {
    let distance_km = i as f64 * 1.5;
    json!({
        "id": format!("{i}-{tag}"),
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": "2025-03-01T12:00:00Z",
        "name": format!("ONG {i}"),
        "cnpj": "12345678000199",
        "city": "São Paulo",
        "state": "SP",
        "email": "contato@example.org",
        "help_types": ["donation"],
        "logo_url": null,
        "distance_km": distance_km,
        "dogs_count": 3,
        "cats_count": 5
    })
}
