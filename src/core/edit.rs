//! In-place section editing: captured input values and commit semantics
//!
//! While a section is in edit mode the host reports what the user typed as
//! [`EditInput`] values. They accumulate in a [`SectionDraft`] which is only
//! transferred into the document model on commit.

use super::document::{SectionBody, SectionKind, StatusRow};

/// Status table column addressed by an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellColumn {
    Milestone,
    Status,
}

/// One captured input value from an editable node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditInput {
    /// Whole text of a heading or paragraph
    Text(String),
    /// Text of one list item
    Item { index: usize, text: String },
    /// Text of one status table cell
    Cell {
        row: usize,
        column: CellColumn,
        text: String,
    },
}

/// Editable milestone/status texts of a status table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDraft {
    pub milestone: String,
    pub status: String,
}

/// Uncommitted content of the section being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionDraft {
    Text(String),
    Items(Vec<String>),
    Rows(Vec<RowDraft>),
}

impl SectionDraft {
    /// Start a draft from the committed content
    pub fn capture(body: &SectionBody) -> Self {
        match body {
            SectionBody::Heading { content } | SectionBody::Paragraph { content } => {
                SectionDraft::Text(content.clone())
            }
            SectionBody::List { items } => SectionDraft::Items(items.clone()),
            SectionBody::StatusTable { rows } => SectionDraft::Rows(
                rows.iter()
                    .map(|r| RowDraft {
                        milestone: r.milestone.clone(),
                        status: r.status.clone(),
                    })
                    .collect(),
            ),
        }
    }

    /// Record an input value. Returns false when it does not address this draft.
    pub fn record(&mut self, input: EditInput) -> bool {
        match (self, input) {
            (SectionDraft::Text(text), EditInput::Text(value)) => {
                *text = value;
                true
            }
            (SectionDraft::Items(items), EditInput::Item { index, text }) => {
                if let Some(item) = items.get_mut(index) {
                    *item = text;
                    true
                } else if index == items.len() {
                    // New item created inside the editable list
                    items.push(text);
                    true
                } else {
                    false
                }
            }
            (SectionDraft::Rows(rows), EditInput::Cell { row, column, text }) => {
                match rows.get_mut(row) {
                    Some(draft) => {
                        match column {
                            CellColumn::Milestone => draft.milestone = text,
                            CellColumn::Status => draft.status = text,
                        }
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Committed content this draft would produce, trimmed and with empty
    /// list items dropped. Rows keep their status class.
    pub fn committed(&self, body: &SectionBody) -> Option<SectionBody> {
        let next = match (body, self) {
            (SectionBody::Heading { .. }, SectionDraft::Text(text)) => SectionBody::Heading {
                content: text.trim().to_string(),
            },
            (SectionBody::Paragraph { .. }, SectionDraft::Text(text)) => SectionBody::Paragraph {
                content: text.trim().to_string(),
            },
            (SectionBody::List { .. }, SectionDraft::Items(items)) => SectionBody::List {
                items: items
                    .iter()
                    .map(|i| i.trim())
                    .filter(|i| !i.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            (SectionBody::StatusTable { rows }, SectionDraft::Rows(drafts)) => {
                SectionBody::StatusTable {
                    rows: rows
                        .iter()
                        .enumerate()
                        .map(|(idx, row)| match drafts.get(idx) {
                            Some(draft) => StatusRow {
                                milestone: draft.milestone.trim().to_string(),
                                status: draft.status.trim().to_string(),
                                status_class: row.status_class.clone(),
                            },
                            None => row.clone(),
                        })
                        .collect(),
                }
            }
            _ => return None,
        };
        Some(next)
    }

    /// Content as currently typed, for re-rendering a section mid-edit
    pub fn overlay(&self, body: &SectionBody) -> SectionBody {
        match (body, self) {
            (SectionBody::Heading { .. }, SectionDraft::Text(text)) => SectionBody::Heading {
                content: text.clone(),
            },
            (SectionBody::Paragraph { .. }, SectionDraft::Text(text)) => SectionBody::Paragraph {
                content: text.clone(),
            },
            (SectionBody::List { .. }, SectionDraft::Items(items)) => SectionBody::List {
                items: items.clone(),
            },
            (SectionBody::StatusTable { rows }, SectionDraft::Rows(drafts)) => {
                SectionBody::StatusTable {
                    rows: rows
                        .iter()
                        .zip(drafts)
                        .map(|(row, draft)| StatusRow {
                            milestone: draft.milestone.clone(),
                            status: draft.status.clone(),
                            status_class: row.status_class.clone(),
                        })
                        .collect(),
                }
            }
            _ => body.clone(),
        }
    }
}

/// The section currently in edit mode and its draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub doc_id: String,
    pub section_id: String,
    pub kind: SectionKind,
    pub draft: SectionDraft,
}

impl EditSession {
    pub fn begin(doc_id: &str, section_id: &str, body: &SectionBody) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            section_id: section_id.to_string(),
            kind: body.kind(),
            draft: SectionDraft::capture(body),
        }
    }

    pub fn is_editing(&self, doc_id: &str, section_id: &str) -> bool {
        self.doc_id == doc_id && self.section_id == section_id
    }
}
