//! Core functionality: document model, comments, editing, persistence and configuration

pub mod catalog;
pub mod comments;
pub mod config;
pub mod document;
pub mod edit;
pub mod storage;
pub mod store;
