//! Floating comment panel

use super::html::escape;
use crate::core::comments::Comment;

/// Render the panel for a section's comment thread and its post form
pub fn render_comment_panel(section_id: &str, comments: &[Comment]) -> String {
    let list: String = if comments.is_empty() {
        "<div class=\"docs-comment-empty\">No comments yet</div>".to_string()
    } else {
        comments.iter().map(render_comment).collect()
    };
    let section_id = escape(section_id);

    format!(
        "<aside class=\"docs-comment-panel\" data-section-id=\"{section_id}\">\
         <div class=\"docs-comment-list\">{list}</div>\
         <form class=\"docs-comment-form\" data-section-id=\"{section_id}\">\
         <input type=\"text\" class=\"input\" placeholder=\"Add a comment...\" autocomplete=\"off\" />\
         <button type=\"submit\" class=\"button button-primary\">Post</button>\
         </form></aside>"
    )
}

fn render_comment(comment: &Comment) -> String {
    format!(
        "<div class=\"docs-comment\">\
         <div class=\"docs-comment-header\">\
         <span class=\"docs-comment-author\">{}</span>\
         <span class=\"docs-comment-time\">{}</span>\
         </div>\
         <div class=\"docs-comment-text\">{}</div>\
         </div>",
        escape(&comment.author),
        escape(&comment.time),
        escape(&comment.text),
    )
}

/// Panel top aligned to its section within the scrolled viewer
pub fn panel_top(section_offset: f32, scroll_top: f32) -> f32 {
    (section_offset - scroll_top).max(0.0)
}
