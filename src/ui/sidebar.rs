//! Sidebar listing the available documents

use super::html::escape;
use crate::core::document::Document;

/// Render one sidebar entry per document, marking the active one
pub fn render_sidebar(documents: &[Document], active_doc: Option<&str>) -> String {
    documents
        .iter()
        .map(|doc| render_entry(doc, active_doc == Some(doc.id.as_str())))
        .collect()
}

fn render_entry(doc: &Document, active: bool) -> String {
    let class = if active {
        "docs-file-item active"
    } else {
        "docs-file-item"
    };
    format!(
        "<button type=\"button\" class=\"{}\" data-doc-id=\"{}\">\
         <span class=\"docs-file-icon\">{}</span>\
         <div class=\"docs-file-info\">\
         <div class=\"docs-file-name\">{}</div>\
         <div class=\"docs-file-meta\">{}</div>\
         </div></button>",
        class,
        escape(&doc.id),
        escape(&doc.icon),
        escape(&doc.title),
        escape(&doc.last_edited),
    )
}
