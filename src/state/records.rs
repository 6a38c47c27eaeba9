//! Record manager view state and its pure reducer.
//!
//! DESIGN
//! ======
//! `reduce(state, event)` is a pure function returning the next state plus at
//! most one [`Effect`] for the controller to run. Nothing here touches the
//! network, so every transition is testable with plain values.
//!
//! Reloads are sequenced: each `Effect::Fetch` carries a token from a
//! monotonically increasing counter, and a `Loaded` completion only applies
//! when its token is the latest one issued. Older responses are dropped, so
//! overlapping reloads cannot leave a stale snapshot on screen.
//!
//! Only one form is open at a time (`ActiveForm`). Opening a form replaces
//! whichever was open before. Every opening bumps `form_generation`, and a
//! submission carries the generation it came from, so a create or update
//! completion only closes the form instance that was submitted.

use serde_json::Value;

use crate::net::api::ApiError;
use crate::net::types::{Record, RecordDraft, RecordField};

#[cfg(test)]
#[path = "records_test.rs"]
mod records_test;

// =============================================================================
// STATE
// =============================================================================

/// Which form, if any, is open, together with its unsaved content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActiveForm {
    #[default]
    None,
    Add(RecordDraft),
    Edit(Record),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Snapshot from the last applied reload, in server order.
    pub records: Vec<Record>,
    pub is_loading: bool,
    /// Banner message for the most recent failure.
    pub last_error: Option<String>,
    pub active_form: ActiveForm,
    /// Id awaiting delete confirmation.
    pub pending_delete: Option<String>,
    /// Token of the most recently issued reload.
    pub latest_reload: u64,
    /// Bumped each time a form opens.
    pub form_generation: u64,
}

impl ViewState {
    #[must_use]
    pub fn is_add_form_open(&self) -> bool {
        matches!(self.active_form, ActiveForm::Add(_))
    }

    #[must_use]
    pub fn is_edit_form_open(&self) -> bool {
        matches!(self.active_form, ActiveForm::Edit(_))
    }

    #[must_use]
    pub fn draft_record(&self) -> Option<&RecordDraft> {
        match &self.active_form {
            ActiveForm::Add(draft) => Some(draft),
            _ => None,
        }
    }

    #[must_use]
    pub fn editing_record(&self) -> Option<&Record> {
        match &self.active_form {
            ActiveForm::Edit(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    fn begin_reload(&mut self) -> Effect {
        self.latest_reload += 1;
        self.is_loading = true;
        Effect::Fetch { token: self.latest_reload }
    }

    fn open_form(&mut self, form: ActiveForm) {
        self.form_generation += 1;
        self.active_form = form;
    }

    /// Close the form only if it is still the one submitted as `generation`.
    fn close_submitted_form(&mut self, generation: u64) {
        if generation == self.form_generation {
            self.active_form = ActiveForm::None;
        }
    }
}

// =============================================================================
// EVENTS & EFFECTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Initial load.
    Mount,
    Reload,
    OpenAddForm,
    /// Open the edit form on a copy of the record with this id.
    BeginEdit(String),
    SetField { field: RecordField, value: String },
    SubmitAdd,
    SubmitEdit,
    /// Close whichever form is open without saving.
    CancelForm,
    RequestDelete(String),
    ConfirmDelete,
    CancelDelete,
    DismissError,

    Loaded { token: u64, result: Result<Vec<Record>, ApiError> },
    /// Create finished for the add form opened as generation `form`.
    Created { form: u64, result: Result<Value, ApiError> },
    Updated { form: u64, result: Result<Value, ApiError> },
    Removed(Result<(), ApiError>),
}

/// An API call requested by the reducer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Fetch { token: u64 },
    Create { form: u64, draft: RecordDraft },
    Update { form: u64, id: String, record: Record },
    Remove(String),
}

// =============================================================================
// REDUCER
// =============================================================================

/// Apply one event. Returns the next state and the API call to issue, if any.
#[must_use]
pub fn reduce(mut state: ViewState, event: Event) -> (ViewState, Option<Effect>) {
    let effect = match event {
        Event::Mount | Event::Reload => Some(state.begin_reload()),

        Event::OpenAddForm => {
            state.open_form(ActiveForm::Add(RecordDraft::default()));
            None
        }

        Event::BeginEdit(id) => {
            match state.find(&id).cloned() {
                Some(record) => state.open_form(ActiveForm::Edit(record)),
                None => state.last_error = Some(format!("no record with id {id}")),
            }
            None
        }

        Event::SetField { field, value } => {
            match &mut state.active_form {
                ActiveForm::Add(draft) => draft.set(field, value),
                ActiveForm::Edit(record) => record.fields.set(field, value),
                ActiveForm::None => {}
            }
            None
        }

        Event::SubmitAdd => match state.draft_record().cloned() {
            Some(draft) => require_fields(&mut state, &draft)
                .then(|| Effect::Create { form: state.form_generation, draft }),
            None => None,
        },

        Event::SubmitEdit => match state.editing_record().cloned() {
            Some(record) => require_fields(&mut state, &record.fields).then(|| Effect::Update {
                form: state.form_generation,
                id: record.id.clone(),
                record,
            }),
            None => None,
        },

        Event::CancelForm => {
            state.active_form = ActiveForm::None;
            None
        }

        Event::RequestDelete(id) => {
            state.pending_delete = Some(id);
            None
        }

        Event::ConfirmDelete => state.pending_delete.take().map(Effect::Remove),

        Event::CancelDelete => {
            state.pending_delete = None;
            None
        }

        Event::DismissError => {
            state.last_error = None;
            None
        }

        Event::Loaded { token, result } => {
            if token == state.latest_reload {
                match result {
                    Ok(records) => {
                        state.records = records;
                        state.last_error = None;
                    }
                    Err(err) => state.last_error = Some(format!("failed to load records: {err}")),
                }
                state.is_loading = false;
            }
            None
        }

        Event::Created { form, result } => match result {
            Ok(_) => {
                if state.is_add_form_open() {
                    state.close_submitted_form(form);
                }
                Some(state.begin_reload())
            }
            Err(err) => {
                state.last_error = Some(format!("failed to add record: {err}"));
                None
            }
        },

        Event::Updated { form, result } => match result {
            Ok(_) => {
                if state.is_edit_form_open() {
                    state.close_submitted_form(form);
                }
                Some(state.begin_reload())
            }
            Err(err) => {
                state.last_error = Some(format!("failed to update record: {err}"));
                None
            }
        },

        Event::Removed(result) => match result {
            Ok(()) => Some(state.begin_reload()),
            Err(err) => {
                state.last_error = Some(format!("failed to delete record: {err}"));
                None
            }
        },
    };
    (state, effect)
}

/// `Loaded` completions that will be ignored because a newer reload exists.
#[must_use]
pub fn is_stale(state: &ViewState, event: &Event) -> bool {
    matches!(event, Event::Loaded { token, .. } if *token != state.latest_reload)
}

/// True when every field is filled in; otherwise sets the banner.
fn require_fields(state: &mut ViewState, draft: &RecordDraft) -> bool {
    let missing = draft.missing_fields();
    if missing.is_empty() {
        return true;
    }
    let names: Vec<_> = missing.iter().map(|f| f.as_str()).collect();
    state.last_error = Some(format!("missing required field(s): {}", names.join(", ")));
    false
}
