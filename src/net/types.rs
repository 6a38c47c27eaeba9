//! Record wire types shared by the API client, the view state, and the
//! fake store.
//!
//! DESIGN
//! ======
//! `RecordDraft` is the five editable fields and nothing else, so a create
//! body can never carry an `id`. `Record` wraps a draft with the
//! server-assigned `id` plus any extra members the store returned; those are
//! preserved so an update sends back the full record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// FIELDS
// =============================================================================

/// One of the five editable record fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    Age,
    Email,
    Phone,
    Address,
}

impl RecordField {
    /// All fields in form/table order.
    pub const ALL: [Self; 5] = [Self::Name, Self::Age, Self::Email, Self::Phone, Self::Address];

    /// JSON member name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }

    /// Human-facing column/label text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Age => "Age",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Address => "Address",
        }
    }

    /// Parse a field from its member name, case-insensitively.
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

// =============================================================================
// DRAFT
// =============================================================================

/// The editable content of a record. Also the exact body of a create request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDraft {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub age: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
}

impl RecordDraft {
    #[must_use]
    pub fn get(&self, field: RecordField) -> &str {
        match field {
            RecordField::Name => &self.name,
            RecordField::Age => &self.age,
            RecordField::Email => &self.email,
            RecordField::Phone => &self.phone,
            RecordField::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: RecordField, value: String) {
        let slot = match field {
            RecordField::Name => &mut self.name,
            RecordField::Age => &mut self.age,
            RecordField::Email => &mut self.email,
            RecordField::Phone => &mut self.phone,
            RecordField::Address => &mut self.address,
        };
        *slot = value;
    }

    /// Fields that are blank after trimming, in canonical order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<RecordField> {
        RecordField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// A record as held by the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(flatten)]
    pub fields: RecordDraft,
    /// Members returned by the store that this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: RecordDraft) -> Self {
        Self { id: id.into(), fields, extra: Map::new() }
    }
}

/// Accept strings, numbers, booleans, or null where a string is expected.
/// Mock stores frequently generate `age` as a number.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
