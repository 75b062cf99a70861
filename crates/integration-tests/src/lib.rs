//! Integration tests for Waymark.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p waymark-integration-tests
//! ```
//!
//! Each test boots its own server on an ephemeral port, backed by the
//! in-memory store, plus a fake Nominatim endpoint that knows a handful of
//! London addresses. The real client stack ([`HttpApi`],
//! [`NominatimGeocoder`], [`SessionStore`]) talks to both over HTTP, so no
//! database or network access is needed.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::TimeDelta;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use waymark_client::{
    ClientConfig, DeliveryController, DeliveryForm, HttpApi, NominatimGeocoder, SessionStore,
};
use waymark_core::RegisterRequest;
use waymark_server::config::ServerConfig;
use waymark_server::db::MemoryStore;
use waymark_server::routes;
use waymark_server::state::AppState;

pub type Controller = DeliveryController<HttpApi, NominatimGeocoder>;

pub const BAKER_STREET: &str = "221B Baker Street, London";
pub const DOWNING_STREET: &str = "10 Downing Street, London";
pub const PASSWORD: &str = "password123";

const TOKEN_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

async fn serve(router: Router) -> (Url, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    let url = Url::parse(&format!("http://{addr}/")).expect("server URL");
    (url, task)
}

/// A running Waymark server on the in-memory store.
pub struct TestServer {
    pub url: Url,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let config = ServerConfig {
            database_url: None,
            host: "127.0.0.1".parse().expect("loopback"),
            port: 0,
            token_secret: SecretString::from(TOKEN_SECRET),
            token_ttl: TimeDelta::days(30),
            store_timeout: Duration::from_secs(5),
            cors_origin: None,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone());
        let (url, task) = serve(routes::router(state.clone())).await;

        Self {
            url,
            store,
            state,
            task,
        }
    }

    pub fn endpoint(&self, path: &str) -> Url {
        self.url.join(path).expect("endpoint URL")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Default)]
struct Places {
    known: HashMap<&'static str, (&'static str, &'static str)>,
    lookups: AtomicUsize,
}

async fn search(
    State(places): State<Arc<Places>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    places.lookups.fetch_add(1, Ordering::SeqCst);
    let query = params.get("q").map(String::as_str).unwrap_or_default();
    match places.known.get(query) {
        Some((lat, lon)) => Json(json!([
            {"place_id": 1, "lat": lat, "lon": lon, "display_name": query}
        ])),
        None => Json(json!([])),
    }
}

/// A Nominatim-shaped search endpoint with a fixed gazetteer.
pub struct FakeGeocoder {
    pub url: Url,
    places: Arc<Places>,
    task: JoinHandle<()>,
}

impl FakeGeocoder {
    pub async fn spawn() -> Self {
        let mut known = HashMap::new();
        known.insert(BAKER_STREET, ("51.5237629", "-0.1584743"));
        known.insert(DOWNING_STREET, ("51.5033635", "-0.1276248"));
        let places = Arc::new(Places {
            known,
            ..Places::default()
        });

        let router = Router::new()
            .route("/search", get(search))
            .with_state(places.clone());
        let (base, task) = serve(router).await;

        Self {
            url: base.join("search").expect("search URL"),
            places,
            task,
        }
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.places.lookups.load(Ordering::SeqCst)
    }
}

impl Drop for FakeGeocoder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One client install: its own config and session directory.
pub struct TestClient {
    pub config: ClientConfig,
    _dir: TempDir,
}

impl TestClient {
    pub fn new(server: &TestServer, geocoder: &FakeGeocoder) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ClientConfig::new(server.url.clone(), geocoder.url.clone());
        config.session_file = dir.path().join("session.json");
        Self { config, _dir: dir }
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(&self.config.session_file)
    }

    /// A fresh controller, restoring whatever session is on disk.
    pub async fn controller(&self) -> Controller {
        let api = HttpApi::new(&self.config).expect("HTTP client");
        let geocoder = NominatimGeocoder::new(&self.config).expect("geocoder");
        DeliveryController::start(api, geocoder, self.sessions())
            .await
            .expect("controller")
    }
}

pub fn registration(name: &str) -> RegisterRequest {
    RegisterRequest {
        username: name.to_owned(),
        email: format!("{name}@example.com"),
        password: PASSWORD.to_owned(),
    }
}

/// The Alice example: Baker Street warehouse, Downing Street destination.
pub fn alice_form() -> DeliveryForm {
    DeliveryForm {
        customer_name: "Alice".to_owned(),
        warehouse_address: BAKER_STREET.to_owned(),
        delivery_date: "2024-01-01".to_owned(),
        delivery_address: DOWNING_STREET.to_owned(),
    }
}
