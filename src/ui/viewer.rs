//! Document viewer rendering
//!
//! Renders the active document as a sequence of commentable sections. The
//! section being edited exposes its text-bearing nodes as `contenteditable`
//! and hides the comment indicator and edit icon.

use super::comment_panel::render_comment_panel;
use super::html::escape;
use crate::core::comments::{CommentKey, CommentThreads};
use crate::core::document::{Document, Section, SectionBody, StatusRow};
use crate::core::edit::SectionDraft;

/// Title shown when no document is active
pub const EMPTY_TITLE: &str = "Select a document";

/// Transient UI state the renderer reads
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub comments: &'a CommentThreads,
    /// Section whose comment panel is open
    pub open_panel: Option<&'a str>,
    /// Section in edit mode and its draft
    pub editing: Option<(&'a str, &'a SectionDraft)>,
}

/// Markup for the viewer title and body containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerMarkup {
    /// Plain text title
    pub title: String,
    pub body: String,
}

/// Render the viewer for the active document, or the empty state
pub fn render_viewer(doc: Option<&Document>, view: &ViewState<'_>) -> ViewerMarkup {
    let Some(doc) = doc else {
        return ViewerMarkup {
            title: EMPTY_TITLE.to_string(),
            body: "<div class=\"docs-empty\">Choose a document from the sidebar to view it.</div>"
                .to_string(),
        };
    };

    let sections: String = doc
        .sections
        .iter()
        .map(|s| render_section(doc, s, view))
        .collect();

    let mut body = format!(
        "<div class=\"docs-page\"><h1>{}</h1>{}</div>",
        escape(&doc.title),
        sections
    );

    if let Some(panel) = visible_panel(doc, view) {
        let key = CommentKey::new(&doc.id, &panel.id);
        body.push_str(&render_comment_panel(&panel.id, view.comments.get(&key)));
    }

    ViewerMarkup {
        title: doc.title.clone(),
        body,
    }
}

/// Section whose panel should be shown: open, present, and not mid-edit
pub fn visible_panel<'d>(doc: &'d Document, view: &ViewState<'_>) -> Option<&'d Section> {
    let open = view.open_panel?;
    if view.editing.is_some_and(|(id, _)| id == open) {
        return None;
    }
    doc.section(open)
}

fn render_section(doc: &Document, section: &Section, view: &ViewState<'_>) -> String {
    let key = CommentKey::new(&doc.id, &section.id);
    let count = view.comments.count(&key);
    let draft = view
        .editing
        .filter(|(id, _)| *id == section.id)
        .map(|(_, draft)| draft);

    let mut classes = vec!["docs-commentable"];
    if count > 0 {
        classes.push("has-comments");
    }
    if view.open_panel == Some(section.id.as_str()) && draft.is_none() {
        classes.push("comment-active");
    }

    let (inner, affordances) = match draft {
        Some(draft) => {
            classes.push("editing");
            (render_body(&draft.overlay(&section.body), true), String::new())
        }
        None => {
            let indicator = if count > 0 {
                count.to_string()
            } else {
                "+".to_string()
            };
            (
                render_body(&section.body, false),
                format!(
                    "<button type=\"button\" class=\"docs-edit-icon\" title=\"Edit section\">\u{270E}</button>\
                     <span class=\"docs-comment-indicator\">{}</span>",
                    indicator
                ),
            )
        }
    };

    format!(
        "<div class=\"{}\" data-section-id=\"{}\">{}{}</div>",
        classes.join(" "),
        escape(&section.id),
        inner,
        affordances
    )
}

fn editable_attr(editing: bool) -> &'static str {
    if editing {
        " contenteditable=\"true\""
    } else {
        ""
    }
}

fn render_body(body: &SectionBody, editing: bool) -> String {
    let attr = editable_attr(editing);
    match body {
        SectionBody::Heading { content } => format!("<h2{}>{}</h2>", attr, escape(content)),
        SectionBody::Paragraph { content } => format!("<p{}>{}</p>", attr, escape(content)),
        SectionBody::List { items } => {
            let items: String = items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    format!("<li data-item=\"{}\"{}>{}</li>", idx, attr, escape(item))
                })
                .collect();
            format!("<ul>{}</ul>", items)
        }
        SectionBody::StatusTable { rows } => {
            let rows: String = rows
                .iter()
                .enumerate()
                .map(|(idx, row)| render_status_row(idx, row, attr))
                .collect();
            format!(
                "<table class=\"docs-status-table\">\
                 <thead><tr><th>Milestone</th><th>Status</th></tr></thead>\
                 <tbody>{}</tbody></table>",
                rows
            )
        }
    }
}

fn render_status_row(idx: usize, row: &StatusRow, attr: &str) -> String {
    let class = if row.status_class.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape(&row.status_class))
    };
    format!(
        "<tr data-row=\"{idx}\">\
         <td data-column=\"milestone\"{attr}>{}</td>\
         <td data-column=\"status\"{class}{attr}>{}</td>\
         </tr>",
        escape(&row.milestone),
        escape(&row.status),
    )
}
