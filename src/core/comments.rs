//! Section comment threads

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single comment. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    /// Display timestamp, e.g. "09:41 AM"
    pub time: String,
}

/// Composite key bucketing comments by document and section
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentKey<'a> {
    pub doc_id: &'a str,
    pub section_id: &'a str,
}

impl<'a> CommentKey<'a> {
    pub fn new(doc_id: &'a str, section_id: &'a str) -> Self {
        Self { doc_id, section_id }
    }
}

impl fmt::Display for CommentKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_id, self.section_id)
    }
}

/// All comment threads, keyed by `"<documentId>:<sectionId>"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentThreads {
    threads: BTreeMap<String, Vec<Comment>>,
}

impl CommentThreads {
    /// Comments for a section in insertion order
    pub fn get(&self, key: &CommentKey<'_>) -> &[Comment] {
        self.threads
            .get(&key.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a comment to the end of a section's thread
    pub fn push(&mut self, key: &CommentKey<'_>, comment: Comment) {
        self.threads.entry(key.to_string()).or_default().push(comment);
    }

    pub fn count(&self, key: &CommentKey<'_>) -> usize {
        self.get(key).len()
    }

    /// Number of non-empty threads
    pub fn thread_count(&self) -> usize {
        self.threads.values().filter(|t| !t.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.threads.clear();
    }
}
