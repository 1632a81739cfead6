//! Structured document model: documents, sections and their payloads

use serde::{Deserialize, Serialize};

/// A structured document shown in the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique document id
    pub id: String,
    /// Display title
    pub title: String,
    /// Human readable "last edited" label shown in the sidebar
    pub last_edited: String,
    /// Icon glyph shown next to the title
    pub icon: String,
    /// Sections in display order
    pub sections: Vec<Section>,
}

/// One addressable content block within a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Id, unique within the owning document
    pub id: String,
    /// Type tag and type-specific payload
    #[serde(flatten)]
    pub body: SectionBody,
}

/// Section payload, tagged by section type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SectionBody {
    Heading { content: String },
    Paragraph { content: String },
    List { items: Vec<String> },
    StatusTable { rows: Vec<StatusRow> },
}

/// A milestone/status pair with its visual status class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRow {
    pub milestone: String,
    pub status: String,
    #[serde(default)]
    pub status_class: String,
}

/// Section type without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Heading,
    Paragraph,
    List,
    StatusTable,
}

impl SectionKind {
    /// Whether a plain Enter key press commits an edit of this kind
    pub fn commits_on_enter(self) -> bool {
        matches!(self, SectionKind::Heading | SectionKind::StatusTable)
    }
}

impl SectionBody {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionBody::Heading { .. } => SectionKind::Heading,
            SectionBody::Paragraph { .. } => SectionKind::Paragraph,
            SectionBody::List { .. } => SectionKind::List,
            SectionBody::StatusTable { .. } => SectionKind::StatusTable,
        }
    }
}

impl StatusRow {
    pub fn new(milestone: &str, status: &str, status_class: &str) -> Self {
        Self {
            milestone: milestone.to_string(),
            status: status.to_string(),
            status_class: status_class.to_string(),
        }
    }
}

impl Section {
    pub fn heading(id: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            body: SectionBody::Heading {
                content: content.to_string(),
            },
        }
    }

    pub fn paragraph(id: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            body: SectionBody::Paragraph {
                content: content.to_string(),
            },
        }
    }

    pub fn list(id: &str, items: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            body: SectionBody::List {
                items: items.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn status_table(id: &str, rows: Vec<StatusRow>) -> Self {
        Self {
            id: id.to_string(),
            body: SectionBody::StatusTable { rows },
        }
    }
}

impl Document {
    /// Find a section by id
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Find a section by id mutably
    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }
}
