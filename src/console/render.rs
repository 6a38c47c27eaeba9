//! Text rendering of the view state.

use std::fmt::Write;

use crate::net::types::{Record, RecordDraft, RecordField};
use crate::state::records::{ActiveForm, ViewState};

pub const TITLE: &str = "Data Management";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this item? [y/n]";

/// Render the whole screen: title, error banner, table (or loading line),
/// open form, and delete prompt.
#[must_use]
pub fn render(state: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(TITLE.len()));

    if let Some(error) = &state.last_error {
        let _ = writeln!(out, "! {error}");
    }

    if state.is_loading {
        let _ = writeln!(out, "Loading...");
    } else {
        out.push_str(&render_table(&state.records));
    }

    match &state.active_form {
        ActiveForm::None => {}
        ActiveForm::Add(draft) => out.push_str(&render_form("Add New Item", draft)),
        ActiveForm::Edit(record) => out.push_str(&render_form("Edit Item", &record.fields)),
    }

    if state.pending_delete.is_some() {
        let _ = writeln!(out, "{DELETE_PROMPT}");
    }
    out
}

/// Column-aligned table of records, in snapshot order.
#[must_use]
pub fn render_table(records: &[Record]) -> String {
    let mut header = vec!["ID"];
    header.extend(RecordField::ALL.iter().map(|f| f.label()));

    let rows: Vec<Vec<&str>> = records
        .iter()
        .map(|record| {
            let mut row = vec![record.id.as_str()];
            row.extend(RecordField::ALL.iter().map(|f| record.fields.get(*f)));
            row
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    if rows.is_empty() {
        let _ = writeln!(out, "(no records)");
    }
    out
}

fn push_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

fn render_form(title: &str, draft: &RecordDraft) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "--- {title} ---");
    for field in RecordField::ALL {
        let _ = writeln!(out, "  {:<8} {}", format!("{}:", field.label()), draft.get(field));
    }
    let _ = writeln!(out, "  (set <field> <value>, save, cancel)");
    out
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
