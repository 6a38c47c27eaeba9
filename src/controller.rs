//! Drives [`ViewState`] against a [`RecordApi`].
//!
//! SYSTEM CONTEXT
//! ==============
//! The console (or a test) feeds user gestures in through [`Controller::dispatch`].
//! Each effect the reducer returns is run as its own tokio task, so requests
//! may overlap exactly as they would in a browser; completions come back over
//! an unbounded channel and are reduced one at a time by whoever calls
//! [`Controller::next_completion`]. Only the controller mutates the state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::net::api::RecordApi;
use crate::state::records::{self, Effect, Event, ViewState};

pub struct Controller<A> {
    api: Arc<A>,
    state: ViewState,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    in_flight: usize,
}

impl<A> Controller<A>
where
    A: RecordApi + 'static,
{
    pub fn new(api: A) -> Self {
        Self::with_shared(Arc::new(api))
    }

    pub fn with_shared(api: Arc<A>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { api, state: ViewState::default(), tx, rx, in_flight: 0 }
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Number of API calls started but not yet reduced.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Reduce one event and start the API call it requests, if any.
    pub fn dispatch(&mut self, event: Event) {
        if records::is_stale(&self.state, &event) {
            tracing::debug!(latest = self.state.latest_reload, "discarding stale reload result");
        }
        let state = std::mem::take(&mut self.state);
        let previous_error = state.last_error.clone();
        let (next, effect) = records::reduce(state, event);
        self.state = next;
        if self.state.last_error != previous_error {
            if let Some(error) = &self.state.last_error {
                tracing::warn!(%error, "record manager error");
            }
        }
        if let Some(effect) = effect {
            self.spawn(effect);
        }
    }

    /// Wait for one in-flight call to finish and reduce its result.
    /// Returns `false` immediately when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        // The controller holds a sender, so the channel never closes.
        let Some(event) = self.rx.recv().await else {
            return false;
        };
        self.in_flight -= 1;
        self.dispatch(event);
        true
    }

    /// Reduce completions until no call is in flight, including reloads
    /// triggered by mutations along the way.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn spawn(&mut self, effect: Effect) {
        tracing::debug!(?effect, "starting record api call");
        self.in_flight += 1;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = run_effect(api.as_ref(), effect).await;
            // Receiver only drops with the controller; nothing left to update.
            let _ = tx.send(event);
        });
    }
}

/// Perform the API call for an effect and wrap its outcome as a completion.
pub async fn run_effect<A: RecordApi + ?Sized>(api: &A, effect: Effect) -> Event {
    match effect {
        Effect::Fetch { token } => Event::Loaded { token, result: api.list().await },
        Effect::Create { form, draft } => Event::Created { form, result: api.create(&draft).await },
        Effect::Update { form, id, record } => Event::Updated { form, result: api.update(&id, &record).await },
        Effect::Remove(id) => Event::Removed(api.remove(&id).await),
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
