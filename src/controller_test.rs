use super::*;
use crate::config::{ApiConfig, Timeouts};
use crate::fake_store::{self, FakeStore};
use crate::net::api::{ApiError, HttpRecordApi};
use crate::net::types::{Record, RecordDraft, RecordField};
use axum::http::{Method, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// =========================================================================
// ScriptedApi
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List,
    Create(RecordDraft),
    Update(String, Record),
    Remove(String),
}

type ListReply = (Duration, Result<Vec<Record>, ApiError>);

/// Answers list calls from a queue (empty collection when exhausted) and
/// mutations from a second queue (success when exhausted). Records every call.
#[derive(Default)]
struct ScriptedApi {
    lists: Mutex<VecDeque<ListReply>>,
    mutations: Mutex<VecDeque<Result<(), ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    fn list_reply(self, records: Vec<Record>) -> Self {
        self.delayed_list_reply(Duration::ZERO, Ok(records))
    }

    fn delayed_list_reply(self, delay: Duration, reply: Result<Vec<Record>, ApiError>) -> Self {
        self.lists.lock().unwrap().push_back((delay, reply));
        self
    }

    fn mutation_reply(self, reply: Result<(), ApiError>) -> Self {
        self.mutations.lock().unwrap().push_back(reply);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_mutation(&self) -> Result<(), ApiError> {
        self.mutations.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait::async_trait]
impl RecordApi for ScriptedApi {
    async fn list(&self) -> Result<Vec<Record>, ApiError> {
        self.record(Call::List);
        let next = self.lists.lock().unwrap().pop_front();
        let (delay, reply) = next.unwrap_or((Duration::ZERO, Ok(Vec::new())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }

    async fn create(&self, draft: &RecordDraft) -> Result<Value, ApiError> {
        self.record(Call::Create(draft.clone()));
        self.next_mutation().map(|()| Value::Null)
    }

    async fn update(&self, id: &str, record: &Record) -> Result<Value, ApiError> {
        self.record(Call::Update(id.to_owned(), record.clone()));
        self.next_mutation().map(|()| Value::Null)
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.record(Call::Remove(id.to_owned()));
        self.next_mutation()
    }
}

fn draft(name: &str, age: &str, email: &str, phone: &str, address: &str) -> RecordDraft {
    RecordDraft {
        name: name.into(),
        age: age.into(),
        email: email.into(),
        phone: phone.into(),
        address: address.into(),
    }
}

fn ann() -> Record {
    Record::new("1", draft("Ann", "30", "a@x.com", "555", "Rd 1"))
}

fn bo() -> RecordDraft {
    draft("Bo", "22", "b@x.com", "111", "Rd 2")
}

fn calls(api: &ScriptedApi) -> Vec<Call> {
    api.calls.lock().unwrap().clone()
}

async fn mounted(api: ScriptedApi) -> (Controller<ScriptedApi>, Arc<ScriptedApi>) {
    let api = Arc::new(api);
    let mut controller = Controller::with_shared(Arc::clone(&api));
    controller.dispatch(Event::Mount);
    controller.settle().await;
    api.calls.lock().unwrap().clear();
    (controller, api)
}

fn fill_form(controller: &mut Controller<impl RecordApi + 'static>, draft: &RecordDraft) {
    for field in RecordField::ALL {
        controller.dispatch(Event::SetField { field, value: draft.get(field).to_owned() });
    }
}

// =========================================================================
// Mount
// =========================================================================

#[tokio::test]
async fn mount_loads_snapshot() {
    let mut controller = Controller::new(ScriptedApi::default().list_reply(vec![ann()]));
    controller.dispatch(Event::Mount);
    assert!(controller.state().is_loading);
    assert_eq!(controller.in_flight(), 1);

    controller.settle().await;
    assert!(!controller.state().is_loading);
    assert_eq!(controller.state().records, vec![ann()]);
    assert_eq!(controller.in_flight(), 0);
}

#[tokio::test]
async fn next_completion_without_work_returns_false() {
    let mut controller = Controller::new(ScriptedApi::default());
    assert!(!controller.next_completion().await);
}

// =========================================================================
// Reload after mutation
// =========================================================================

#[tokio::test]
async fn successful_create_reloads_exactly_once() {
    let created = Record::new("2", bo());
    let api = ScriptedApi::default()
        .list_reply(vec![ann()])
        .list_reply(vec![ann(), created.clone()]);
    let (mut controller, api) = mounted(api).await;

    controller.dispatch(Event::OpenAddForm);
    fill_form(&mut controller, &bo());
    controller.dispatch(Event::SubmitAdd);
    controller.settle().await;

    assert_eq!(calls(&api), vec![Call::Create(bo()), Call::List]);
    assert_eq!(controller.state().records, vec![ann(), created]);
    assert!(!controller.state().is_add_form_open());
}

#[tokio::test]
async fn successful_update_reloads_exactly_once() {
    let mut changed = ann();
    changed.fields.name = "Anne".into();
    let api = ScriptedApi::default().list_reply(vec![ann()]).list_reply(vec![changed.clone()]);
    let (mut controller, api) = mounted(api).await;

    controller.dispatch(Event::BeginEdit("1".into()));
    controller.dispatch(Event::SetField { field: RecordField::Name, value: "Anne".into() });
    controller.dispatch(Event::SubmitEdit);
    controller.settle().await;

    assert_eq!(calls(&api), vec![Call::Update("1".into(), changed.clone()), Call::List]);
    assert_eq!(controller.state().records, vec![changed]);
    assert!(!controller.state().is_edit_form_open());
}

#[tokio::test]
async fn successful_delete_reloads_exactly_once() {
    let api = ScriptedApi::default().list_reply(vec![ann()]).list_reply(vec![]);
    let (mut controller, api) = mounted(api).await;

    controller.dispatch(Event::RequestDelete("1".into()));
    controller.dispatch(Event::ConfirmDelete);
    controller.settle().await;

    assert_eq!(calls(&api), vec![Call::Remove("1".into()), Call::List]);
    assert!(controller.state().records.is_empty());
}

// =========================================================================
// Failure isolation
// =========================================================================

#[tokio::test]
async fn failed_mutations_do_not_reload() {
    let failure = || Err(ApiError::Http { status: 500, body: String::new() });
    let api = ScriptedApi::default()
        .list_reply(vec![ann()])
        .mutation_reply(failure())
        .mutation_reply(failure())
        .mutation_reply(failure());
    let (mut controller, api) = mounted(api).await;

    controller.dispatch(Event::OpenAddForm);
    fill_form(&mut controller, &bo());
    controller.dispatch(Event::SubmitAdd);
    controller.settle().await;
    assert!(controller.state().is_add_form_open());

    controller.dispatch(Event::BeginEdit("1".into()));
    controller.dispatch(Event::SubmitEdit);
    controller.settle().await;
    assert!(controller.state().is_edit_form_open());

    controller.dispatch(Event::RequestDelete("1".into()));
    controller.dispatch(Event::ConfirmDelete);
    controller.settle().await;

    assert!(!calls(&api).contains(&Call::List));
    assert_eq!(controller.state().records, vec![ann()]);
    let message = controller.state().last_error.clone().unwrap();
    assert!(!message.is_empty());
}

#[tokio::test]
async fn failed_reload_keeps_previous_snapshot() {
    let api = ScriptedApi::default()
        .list_reply(vec![ann()])
        .delayed_list_reply(Duration::ZERO, Err(ApiError::Network("connection refused".into())));
    let (mut controller, _api) = mounted(api).await;

    controller.dispatch(Event::Reload);
    controller.settle().await;

    assert_eq!(controller.state().records, vec![ann()]);
    assert!(controller.state().last_error.as_deref().unwrap().contains("connection refused"));
    assert!(!controller.state().is_loading);
}

// =========================================================================
// Form lifecycle
// =========================================================================

#[tokio::test]
async fn cancelling_forms_issues_no_calls() {
    let (mut controller, api) = mounted(ScriptedApi::default().list_reply(vec![ann()])).await;

    controller.dispatch(Event::OpenAddForm);
    fill_form(&mut controller, &bo());
    controller.dispatch(Event::CancelForm);
    controller.dispatch(Event::BeginEdit("1".into()));
    controller.dispatch(Event::CancelForm);
    controller.dispatch(Event::RequestDelete("1".into()));
    controller.dispatch(Event::CancelDelete);

    assert_eq!(controller.in_flight(), 0);
    assert!(calls(&api).is_empty());
}

// =========================================================================
// Overlapping requests
// =========================================================================

#[tokio::test]
async fn latest_reload_wins_over_slower_earlier_one() {
    let stale = vec![ann()];
    let fresh = vec![Record::new("2", bo())];
    let api = ScriptedApi::default()
        .list_reply(vec![])
        .delayed_list_reply(Duration::from_millis(100), Ok(stale))
        .list_reply(fresh.clone());
    let (mut controller, _api) = mounted(api).await;

    controller.dispatch(Event::Reload);
    controller.dispatch(Event::Reload);
    assert_eq!(controller.in_flight(), 2);

    // The fast, newer reload lands first; the slow one must not overwrite it.
    assert!(controller.next_completion().await);
    assert_eq!(controller.state().records, fresh);
    controller.settle().await;
    assert_eq!(controller.state().records, fresh);
    assert!(!controller.state().is_loading);
}

#[tokio::test]
async fn concurrent_deletes_each_trigger_a_reload() {
    let second = Record::new("2", bo());
    let api = ScriptedApi::default()
        .list_reply(vec![ann(), second.clone()])
        .list_reply(vec![second])
        .list_reply(vec![]);
    let (mut controller, api) = mounted(api).await;

    controller.dispatch(Event::RequestDelete("1".into()));
    controller.dispatch(Event::ConfirmDelete);
    controller.dispatch(Event::RequestDelete("2".into()));
    controller.dispatch(Event::ConfirmDelete);
    controller.settle().await;

    let lists = calls(&api).iter().filter(|c| **c == Call::List).count();
    assert_eq!(lists, 2);
    assert!(controller.state().records.is_empty());
}

// =========================================================================
// End-to-end against the fake store over HTTP
// =========================================================================

async fn http_controller(store: &FakeStore) -> Controller<HttpRecordApi> {
    let base = fake_store::spawn_local(store.clone()).await.unwrap();
    let config = ApiConfig::new(&base, Timeouts::default()).unwrap();
    Controller::new(HttpRecordApi::new(config).unwrap())
}

#[tokio::test]
async fn e2e_mount_shows_server_rows() {
    let store = FakeStore::new();
    store.replace_all(vec![ann()]);
    let mut controller = http_controller(&store).await;

    controller.dispatch(Event::Mount);
    controller.settle().await;

    let records = &controller.state().records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], ann());
    assert!(controller.state().last_error.is_none());
}

#[tokio::test]
async fn e2e_add_posts_body_then_reloads() {
    let store = FakeStore::new();
    store.replace_all(vec![ann()]);
    let mut controller = http_controller(&store).await;
    controller.dispatch(Event::Mount);
    controller.settle().await;
    store.clear_requests();

    controller.dispatch(Event::OpenAddForm);
    fill_form(&mut controller, &bo());
    controller.dispatch(Event::SubmitAdd);
    controller.settle().await;

    let log = store.requests();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].method, Method::POST);
    assert_eq!(
        log[0].body,
        Some(serde_json::json!({ "name": "Bo", "age": "22", "email": "b@x.com", "phone": "111", "address": "Rd 2" }))
    );
    assert_eq!(log[1].method, Method::GET);

    assert!(!controller.state().is_add_form_open());
    assert_eq!(controller.state().records, store.records());
    assert_eq!(controller.state().records[1].fields, bo());
}

#[tokio::test]
async fn e2e_rejected_delete_keeps_row_and_skips_reload() {
    let store = FakeStore::new();
    store.replace_all(vec![ann()]);
    let mut controller = http_controller(&store).await;
    controller.dispatch(Event::Mount);
    controller.settle().await;
    store.clear_requests();
    store.fail_next(Method::DELETE, StatusCode::NOT_FOUND);

    controller.dispatch(Event::RequestDelete("1".into()));
    controller.dispatch(Event::ConfirmDelete);
    controller.settle().await;

    let log = store.requests();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].method, Method::DELETE);
    assert_eq!(log[0].path, "/records/1");
    assert!(controller.state().find("1").is_some());
    assert!(!controller.state().last_error.clone().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn e2e_update_sends_path_id_in_body() {
    let store = FakeStore::new();
    store.replace_all(vec![ann()]);
    let mut controller = http_controller(&store).await;
    controller.dispatch(Event::Mount);
    controller.settle().await;
    store.clear_requests();

    controller.dispatch(Event::BeginEdit("1".into()));
    controller.dispatch(Event::SetField { field: RecordField::Address, value: "Rd 9".into() });
    controller.dispatch(Event::SubmitEdit);
    controller.settle().await;

    let log = store.requests();
    assert_eq!(log[0].method, Method::PUT);
    assert_eq!(log[0].path, "/records/1");
    let body = log[0].body.clone().unwrap();
    assert_eq!(body.get("id").and_then(Value::as_str), Some("1"));
    assert_eq!(controller.state().records[0].fields.address, "Rd 9");
}
