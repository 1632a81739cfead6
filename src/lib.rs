//! Docsview - structured document viewer with section comments
//!
//! Renders a catalog of structured documents (headings, paragraphs, lists,
//! status tables) into host-supplied containers, keeps threaded comments per
//! section and supports in-place section editing. State persists through a
//! local key-value store.

pub mod app;
pub mod core;
pub mod host;
pub mod ui;

pub use app::{Action, ActionError, DocsViewer, COMMENT_ADDED_EVENT};
pub use host::{Context, Host, PageHost};
