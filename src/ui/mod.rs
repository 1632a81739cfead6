//! View rendering: sidebar, document viewer and comment panel markup

pub mod comment_panel;
pub mod html;
pub mod sidebar;
pub mod viewer;
