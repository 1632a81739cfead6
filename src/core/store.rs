//! Document and comment store with versioned local persistence

use super::catalog;
use super::comments::{Comment, CommentKey, CommentThreads};
use super::config::ViewerConfig;
use super::document::{Document, SectionBody};
use super::edit::SectionDraft;
use super::storage::KeyValueStore;

/// Current local time formatted for display.
///
/// The format comes from the config (`%I:%M %p` by default), which is how a
/// deployment picks its locale's hour:minute convention.
pub fn time_label(format: &str) -> String {
    chrono::Local::now().format(format).to_string()
}

/// In-memory documents and comments, persisted through a [`KeyValueStore`]
pub struct DocumentStore {
    storage: Box<dyn KeyValueStore>,
    config: ViewerConfig,
    documents: Vec<Document>,
    comments: CommentThreads,
}

impl DocumentStore {
    pub fn new(storage: Box<dyn KeyValueStore>, config: ViewerConfig) -> Self {
        Self {
            storage,
            config,
            documents: Vec::new(),
            comments: CommentThreads::default(),
        }
    }

    /// Load persisted state.
    ///
    /// Comments and document edits are only read when the stored schema
    /// version matches; otherwise both records are removed and the version
    /// marker rewritten. Any read or parse failure falls back to the seed catalog and
    /// empty comments.
    pub fn load(&mut self) {
        self.documents = catalog::seed_documents();
        self.comments = CommentThreads::default();

        let keys = &self.config.storage;
        let stored_version = match self.storage.get(&keys.version_key) {
            Ok(v) => v.and_then(|v| v.trim().parse::<u32>().ok()),
            Err(e) => {
                tracing::error!("Failed to load docs data: {}", e);
                return;
            }
        };

        if stored_version != Some(keys.schema_version) {
            tracing::info!(
                "Schema version changed ({:?} -> {}), resetting comments",
                stored_version,
                keys.schema_version
            );
            let version = keys.schema_version.to_string();
            let version_key = keys.version_key.clone();
            let stale = [keys.comments_key.clone(), keys.documents_key.clone()];
            for key in &stale {
                if let Err(e) = self.storage.remove(key) {
                    tracing::error!("Failed to remove {}: {}", key, e);
                }
            }
            if let Err(e) = self.storage.set(&version_key, &version) {
                tracing::error!("Failed to write schema version: {}", e);
            }
            return;
        }

        match self.read_record::<CommentThreads>(&keys.comments_key) {
            Ok(Some(comments)) => self.comments = comments,
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to load comments: {}", e),
        }

        match self.read_record::<Vec<Document>>(&keys.documents_key) {
            Ok(Some(documents)) => self.documents = documents,
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to load documents, using seed catalog: {}", e),
        }

        tracing::debug!(
            "Loaded {} documents and {} comment threads",
            self.documents.len(),
            self.comments.thread_count()
        );
    }

    fn read_record<T: serde::de::DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.storage.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_record<T: serde::Serialize>(&mut self, key: &str, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.storage.set(key, &raw)?;
        Ok(())
    }

    /// Persist all comments. Failures are logged.
    pub fn save_comments(&mut self) {
        let key = self.config.storage.comments_key.clone();
        let comments = self.comments.clone();
        if let Err(e) = self.write_record(&key, &comments) {
            tracing::error!("Failed to save comments: {}", e);
        }
    }

    /// Persist the full document list. Failures are logged.
    pub fn save_documents(&mut self) {
        let key = self.config.storage.documents_key.clone();
        let documents = self.documents.clone();
        if let Err(e) = self.write_record(&key, &documents) {
            tracing::error!("Failed to save documents: {}", e);
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == doc_id)
    }

    fn document_mut(&mut self, doc_id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == doc_id)
    }

    pub fn first_document_id(&self) -> Option<&str> {
        self.documents.first().map(|d| d.id.as_str())
    }

    pub fn comment_threads(&self) -> &CommentThreads {
        &self.comments
    }

    /// Comments for a section in insertion order
    pub fn get_comments(&self, doc_id: &str, section_id: &str) -> &[Comment] {
        self.comments.get(&CommentKey::new(doc_id, section_id))
    }

    /// Append a comment stamped with the current time and persist
    pub fn add_comment(&mut self, doc_id: &str, section_id: &str, text: &str, author: Option<&str>) {
        let comment = Comment {
            author: author.unwrap_or(&self.config.default_author).to_string(),
            text: text.to_string(),
            time: time_label(&self.config.time_format),
        };
        self.comments.push(&CommentKey::new(doc_id, section_id), comment);
        self.save_comments();
    }

    /// Apply an edit draft to a section. Returns whether the content changed.
    pub fn commit(&mut self, doc_id: &str, section_id: &str, draft: &SectionDraft) -> bool {
        let label = format!("Today, {}", time_label(&self.config.time_format));
        let Some(doc) = self.document_mut(doc_id) else {
            return false;
        };
        let Some(section) = doc.section_mut(section_id) else {
            return false;
        };
        let Some(next) = draft.committed(&section.body) else {
            tracing::warn!("Edit draft does not match section {}:{}", doc_id, section_id);
            return false;
        };
        if next == section.body {
            return false;
        }
        section.body = next;
        doc.last_edited = label;
        self.save_documents();
        true
    }

    /// Update the first status table row whose milestone matches.
    ///
    /// Empty or missing values keep the current status and class. Returns
    /// whether a row was found.
    pub fn update_status(
        &mut self,
        doc_id: &str,
        section_id: &str,
        milestone: &str,
        status: Option<&str>,
        status_class: Option<&str>,
    ) -> bool {
        let Some(section) = self
            .document_mut(doc_id)
            .and_then(|doc| doc.section_mut(section_id))
        else {
            return false;
        };
        let SectionBody::StatusTable { rows } = &mut section.body else {
            return false;
        };
        let Some(row) = rows.iter_mut().find(|r| r.milestone == milestone) else {
            return false;
        };

        if let Some(status) = status.filter(|s| !s.is_empty()) {
            row.status = status.to_string();
        }
        if let Some(class) = status_class.filter(|c| !c.is_empty()) {
            row.status_class = class.to_string();
        }
        self.save_documents();
        true
    }

    /// Drop in-memory state. Persisted data is untouched.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.comments.clear();
    }
}
