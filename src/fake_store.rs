//! In-memory record store speaking the same REST contract as the hosted mock
//! API. Used by the `fake-store` subcommand for local development and by the
//! end-to-end tests.
//!
//! DESIGN
//! ======
//! Records live in a `Vec` so list order is insertion order. Ids are
//! sequential decimal strings starting at "1". Every request is appended to a
//! log so tests can assert exactly which calls were issued. `fail_next`
//! queues a one-shot status override for the next request with a given
//! method, which is how tests simulate a store that rejects a call.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::net::types::{Record, RecordDraft};

pub const COLLECTION_PATH: &str = "/records";

/// One request observed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct StoreInner {
    records: Vec<Record>,
    next_id: u64,
    requests: Vec<LoggedRequest>,
    faults: Vec<(Method, StatusCode)>,
}

/// Shared handle to the store. Clones share state.
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl FakeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a record directly, assigning the next id. Not logged.
    pub fn seed(&self, draft: RecordDraft) -> Record {
        let mut inner = self.lock();
        let record = Record::new(inner.allocate_id(), draft);
        inner.records.push(record.clone());
        record
    }

    /// Replace the whole collection. Ids are kept as given; new ids continue
    /// after the largest numeric id present.
    pub fn replace_all(&self, records: Vec<Record>) {
        let mut inner = self.lock();
        inner.next_id = records
            .iter()
            .filter_map(|r| r.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        inner.records = records;
    }

    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<LoggedRequest> {
        self.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// Answer the next request using `method` with `status` instead of
    /// handling it. The store's contents are left untouched.
    pub fn fail_next(&self, method: Method, status: StatusCode) {
        self.lock().faults.push((method, status));
    }

    /// Log the request and return a queued fault for it, if any.
    fn observe(&self, method: Method, path: String, body: Option<Value>) -> Option<StatusCode> {
        let mut inner = self.lock();
        inner.requests.push(LoggedRequest { method: method.clone(), path, body });
        let index = inner.faults.iter().position(|(m, _)| *m == method)?;
        Some(inner.faults.remove(index).1)
    }
}

impl StoreInner {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

// =============================================================================
// ROUTES
// =============================================================================

/// Router serving the collection at [`COLLECTION_PATH`].
pub fn router(store: FakeStore) -> Router {
    Router::new()
        .route(COLLECTION_PATH, get(list_records).post(create_record))
        .route(
            &format!("{COLLECTION_PATH}/{{id}}"),
            get(get_record).put(update_record).delete(delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Serve on an already-bound listener until the process exits.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, store: FakeStore) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, path = COLLECTION_PATH, "fake record store listening");
    axum::serve(listener, router(store)).await
}

/// Bind `127.0.0.1` on an ephemeral port and serve in a background task.
/// Returns the collection URL.
///
/// # Errors
///
/// Returns an error if the port cannot be bound.
pub async fn spawn_local(store: FakeStore) -> std::io::Result<String> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = serve(listener, store).await {
            tracing::error!(error = %e, "fake record store stopped");
        }
    });
    Ok(format!("http://{addr}{COLLECTION_PATH}"))
}

fn fault(status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": status.canonical_reason().unwrap_or("error") }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(Value::String("Not found".to_owned()))).into_response()
}

/// Build a stored record from a client body, forcing the given id.
fn record_from_body(id: String, body: Value) -> Result<Record, Response> {
    let Value::Object(mut members) = body else {
        return Err((StatusCode::BAD_REQUEST, Json(Value::String("expected a JSON object".to_owned()))).into_response());
    };
    members.insert("id".to_owned(), Value::String(id));
    serde_json::from_value::<Record>(Value::Object(members))
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(Value::String(e.to_string()))).into_response())
}

async fn list_records(State(store): State<FakeStore>) -> Response {
    if let Some(status) = store.observe(Method::GET, COLLECTION_PATH.to_owned(), None) {
        return fault(status);
    }
    Json(store.records()).into_response()
}

async fn create_record(State(store): State<FakeStore>, Json(body): Json<Value>) -> Response {
    if let Some(status) = store.observe(Method::POST, COLLECTION_PATH.to_owned(), Some(body.clone())) {
        return fault(status);
    }
    let mut record = match record_from_body(String::new(), body) {
        Ok(record) => record,
        Err(response) => return response,
    };
    let mut inner = store.lock();
    record.id = inner.allocate_id();
    inner.records.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn get_record(State(store): State<FakeStore>, Path(id): Path<String>) -> Response {
    if let Some(status) = store.observe(Method::GET, format!("{COLLECTION_PATH}/{id}"), None) {
        return fault(status);
    }
    let inner = store.lock();
    match inner.position(&id) {
        Some(index) => Json(inner.records[index].clone()).into_response(),
        None => not_found(),
    }
}

async fn update_record(State(store): State<FakeStore>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if let Some(status) = store.observe(Method::PUT, format!("{COLLECTION_PATH}/{id}"), Some(body.clone())) {
        return fault(status);
    }
    let mut inner = store.lock();
    let Some(index) = inner.position(&id) else {
        return not_found();
    };
    match record_from_body(id, body) {
        Ok(record) => {
            inner.records[index] = record.clone();
            Json(record).into_response()
        }
        Err(response) => response,
    }
}

async fn delete_record(State(store): State<FakeStore>, Path(id): Path<String>) -> Response {
    if let Some(status) = store.observe(Method::DELETE, format!("{COLLECTION_PATH}/{id}"), None) {
        return fault(status);
    }
    let mut inner = store.lock();
    match inner.position(&id) {
        Some(index) => Json(inner.records.remove(index)).into_response(),
        None => not_found(),
    }
}

#[cfg(test)]
#[path = "fake_store_test.rs"]
mod tests;
