//! Viewer controller: lifecycle, interaction state machine and render coordination

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::ViewerConfig;
use crate::core::document::{Document, SectionBody};
use crate::core::edit::EditSession;
use crate::core::storage::KeyValueStore;
use crate::core::store::DocumentStore;
use crate::host::{
    ClickTarget, ContainerId, Context, DomEvent, EventKind, Host, Key, ListenerId, Subscriptions,
};
use crate::ui::comment_panel::panel_top;
use crate::ui::sidebar::render_sidebar;
use crate::ui::viewer::{render_viewer, visible_panel, ViewState};

/// Event emitted on the host bus when a comment is posted through the form
pub const COMMENT_ADDED_EVENT: &str = "doc:comment-added";

/// Section targeted by `update-status` when none is given
const DEFAULT_STATUS_SECTION: &str = "status-table";

/// Programmatic mutation requested by the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Action {
    AddComment(AddComment),
    UpdateStatus(UpdateStatus),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddComment {
    pub doc_id: Option<String>,
    pub section_id: Option<String>,
    pub text: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatus {
    pub doc_id: Option<String>,
    pub section_id: Option<String>,
    pub milestone: Option<String>,
    pub new_status: Option<String>,
    pub new_status_class: Option<String>,
}

/// Reasons an action is rejected
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("malformed action: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no documents loaded")]
    NoDocument,
    #[error("unknown document: {0}")]
    UnknownDocument(String),
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("unknown section: {0}")]
    UnknownSection(String),
    #[error("section {0} is not a status table")]
    NotStatusTable(String),
    #[error("no row with milestone {0:?}")]
    UnknownMilestone(String),
}

impl Action {
    /// Parse a `{type, payload}` object. A missing payload counts as empty.
    pub fn from_value(mut value: Value) -> Result<Self, ActionError> {
        if let Some(obj) = value.as_object_mut() {
            obj.entry("payload").or_insert_with(|| json!({}));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, ActionError> {
        Self::from_value(serde_json::from_str(raw)?)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

type Handler<H> = fn(&mut DocsViewer<H>, &DomEvent, Instant);

/// Listeners the viewer binds, in binding order
const BINDINGS: [(ContainerId, EventKind); 8] = [
    (ContainerId::FileList, EventKind::Click),
    (ContainerId::ViewerBody, EventKind::Click),
    (ContainerId::ViewerBody, EventKind::DoubleClick),
    (ContainerId::ViewerBody, EventKind::Input),
    (ContainerId::ViewerBody, EventKind::FocusOut),
    (ContainerId::ViewerBody, EventKind::KeyDown),
    (ContainerId::ViewerBody, EventKind::Submit),
    (ContainerId::ViewerBody, EventKind::Scroll),
];

/// A bound host listener. Removed by its disposer.
#[derive(Debug, Clone, Copy)]
struct Route {
    listener: ListenerId,
    container: ContainerId,
    kind: EventKind,
}

/// Single click waiting out the double-click window
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingClick {
    section_id: String,
    due: Instant,
}

/// Transient UI state, never persisted
#[derive(Debug, Default)]
struct UiState {
    active_doc: Option<String>,
    open_panel: Option<String>,
    edit: Option<EditSession>,
    pending_click: Option<PendingClick>,
}

/// Document viewer component bound to one host
pub struct DocsViewer<H: Host> {
    host: H,
    config: ViewerConfig,
    store: DocumentStore,
    state: UiState,
    context: Context,
    routes: Rc<RefCell<Vec<Route>>>,
    subscriptions: Subscriptions,
    initialized: bool,
}

impl<H: Host> DocsViewer<H> {
    pub fn new(host: H, storage: Box<dyn KeyValueStore>, config: ViewerConfig) -> Self {
        Self {
            host,
            store: DocumentStore::new(storage, config.clone()),
            config,
            state: UiState::default(),
            context: Context::default(),
            routes: Rc::default(),
            subscriptions: Subscriptions::default(),
            initialized: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn active_document_id(&self) -> Option<&str> {
        self.state.active_doc.as_deref()
    }

    /// Section whose comment panel is open
    pub fn open_panel(&self) -> Option<&str> {
        self.state.open_panel.as_deref()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.state.edit.as_ref()
    }

    pub fn has_pending_click(&self) -> bool {
        self.state.pending_click.is_some()
    }

    /// Load state, bind listeners and render. Any previous binding is
    /// released first, so repeated calls never double-bind.
    pub fn init(&mut self, context: Context) {
        self.teardown();
        self.state = UiState::default();
        self.context = context;
        self.store.load();
        self.bind();
        self.initialized = true;

        self.render_sidebar();
        self.render_document();

        if let [doc] = self.store.documents() {
            let doc_id = doc.id.clone();
            self.select_document(&doc_id);
        }

        tracing::info!(
            "Docs viewer initialized with {} documents",
            self.store.documents().len()
        );
    }

    /// Release listeners and drop in-memory state
    pub fn destroy(&mut self) {
        self.teardown();
        self.store.clear();
        self.state = UiState::default();
        self.context = Context::default();
        self.initialized = false;
        tracing::info!("Docs viewer destroyed");
    }

    /// Host notification hook; nothing reacts to messages yet
    pub fn on_message(&mut self, message: &Value) {
        tracing::debug!("Docs viewer received message: {}", message);
    }

    fn bind(&mut self) {
        for (container, kind) in BINDINGS {
            if !self.host.has_container(container) {
                tracing::debug!("#{} missing, not listening for {:?}", container.dom_id(), kind);
                continue;
            }
            let listener = self.host.add_listener(container, kind);
            self.routes.borrow_mut().push(Route {
                listener,
                container,
                kind,
            });
            let routes = Rc::clone(&self.routes);
            self.subscriptions.track(listener, move || {
                routes.borrow_mut().retain(|r| r.listener != listener);
            });
        }
    }

    /// Run every disposer, which unbinds the host listener and drops its route
    fn teardown(&mut self) {
        if !self.subscriptions.is_empty() {
            tracing::debug!("Releasing {} subscriptions", self.subscriptions.len());
        }
        self.subscriptions.dispose(&mut self.host);
    }

    fn handler(container: ContainerId, kind: EventKind) -> Option<Handler<H>> {
        let handler: Handler<H> = match (container, kind) {
            (ContainerId::FileList, EventKind::Click) => Self::on_file_list_click,
            (ContainerId::ViewerBody, EventKind::Click) => Self::on_click,
            (ContainerId::ViewerBody, EventKind::DoubleClick) => Self::on_double_click,
            (ContainerId::ViewerBody, EventKind::Input) => Self::on_input,
            (ContainerId::ViewerBody, EventKind::FocusOut) => Self::on_focus_out,
            (ContainerId::ViewerBody, EventKind::KeyDown) => Self::on_key_down,
            (ContainerId::ViewerBody, EventKind::Submit) => Self::on_submit,
            (ContainerId::ViewerBody, EventKind::Scroll) => Self::on_scroll,
            _ => return None,
        };
        Some(handler)
    }

    /// Deliver a host event to every listener bound for it
    pub fn dispatch(&mut self, event: DomEvent, now: Instant) {
        let handlers: Vec<Handler<H>> = self
            .routes
            .borrow()
            .iter()
            .filter(|r| r.container == event.container() && r.kind == event.kind())
            .filter_map(|r| Self::handler(r.container, r.kind))
            .collect();

        if handlers.is_empty() {
            tracing::trace!("No listener for {:?}", event);
        }
        for handler in handlers {
            handler(self, &event, now);
        }
    }

    /// Fire the pending single-click action once its delay has elapsed
    pub fn tick(&mut self, now: Instant) {
        let due = self
            .state
            .pending_click
            .as_ref()
            .is_some_and(|p| p.due <= now);
        if !due {
            return;
        }
        if let Some(pending) = self.state.pending_click.take() {
            self.toggle_comments(&pending.section_id);
        }
    }

    fn on_file_list_click(&mut self, event: &DomEvent, _now: Instant) {
        if let DomEvent::SelectDocument { doc_id } = event {
            self.select_document(doc_id);
        }
    }

    fn on_click(&mut self, event: &DomEvent, now: Instant) {
        let DomEvent::Click { section_id, target } = event else {
            return;
        };
        match target {
            ClickTarget::CommentPanel => {}
            ClickTarget::EditIcon => self.enter_edit(section_id),
            ClickTarget::Section => {
                if self.is_editing(section_id) {
                    return;
                }
                // A later click replaces the pending one
                self.state.pending_click = Some(PendingClick {
                    section_id: section_id.clone(),
                    due: now + self.config.click_delay(),
                });
            }
        }
    }

    fn on_double_click(&mut self, event: &DomEvent, _now: Instant) {
        if let DomEvent::DoubleClick { section_id, target } = event {
            if *target != ClickTarget::CommentPanel {
                self.enter_edit(section_id);
            }
        }
    }

    fn on_input(&mut self, event: &DomEvent, _now: Instant) {
        let DomEvent::Input { section_id, input } = event else {
            return;
        };
        let Some(edit) = self.state.edit.as_mut() else {
            return;
        };
        if edit.section_id != *section_id {
            return;
        }
        if !edit.draft.record(input.clone()) {
            tracing::debug!("Ignoring input for {}: {:?}", section_id, input);
        }
    }

    fn on_focus_out(&mut self, event: &DomEvent, _now: Instant) {
        let DomEvent::FocusOut {
            section_id,
            related_section,
        } = event
        else {
            return;
        };
        let leaving = self.state.edit.as_ref().is_some_and(|edit| {
            edit.section_id == *section_id && related_section.as_deref() != Some(section_id.as_str())
        });
        if leaving {
            self.commit_edit();
        }
    }

    fn on_key_down(&mut self, event: &DomEvent, _now: Instant) {
        let DomEvent::KeyDown { key, shift } = event else {
            return;
        };
        let Some(kind) = self.state.edit.as_ref().map(|edit| edit.kind) else {
            return;
        };
        match key {
            Key::Escape => self.cancel_edit(),
            Key::Enter if !shift && kind.commits_on_enter() => self.commit_edit(),
            _ => {}
        }
    }

    fn on_submit(&mut self, event: &DomEvent, _now: Instant) {
        let DomEvent::SubmitComment { section_id, text } = event else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(doc_id) = self.state.active_doc.clone() else {
            return;
        };

        self.store.add_comment(&doc_id, section_id, text, None);
        self.render_document();
        self.host.focus_comment_input(section_id);

        self.context.emit(
            COMMENT_ADDED_EVENT,
            &json!({ "docId": doc_id, "sectionId": section_id, "text": text }),
        );
    }

    fn on_scroll(&mut self, _event: &DomEvent, _now: Instant) {
        self.reposition_panel();
    }

    /// Make a document active, closing any open panel
    pub fn select_document(&mut self, doc_id: &str) {
        if self.store.document(doc_id).is_none() {
            tracing::debug!("Ignoring selection of unknown document {}", doc_id);
            return;
        }
        self.commit_pending();
        self.state.pending_click = None;
        self.state.open_panel = None;
        self.state.active_doc = Some(doc_id.to_string());
        self.render_sidebar();
        self.render_document();
    }

    fn is_editing(&self, section_id: &str) -> bool {
        match (&self.state.edit, &self.state.active_doc) {
            (Some(edit), Some(doc_id)) => edit.is_editing(doc_id, section_id),
            _ => false,
        }
    }

    /// Open or close a section's comment panel. An active edit is committed
    /// first so a panel never coexists with edit mode.
    fn toggle_comments(&mut self, section_id: &str) {
        if self.commit_pending() {
            self.render_sidebar();
        }
        self.state.open_panel = if self.state.open_panel.as_deref() == Some(section_id) {
            None
        } else {
            Some(section_id.to_string())
        };
        self.render_document();

        if let Some(open) = self.state.open_panel.clone() {
            self.host.focus_comment_input(&open);
        }
    }

    fn enter_edit(&mut self, section_id: &str) {
        self.state.pending_click = None;
        let Some(doc_id) = self.state.active_doc.clone() else {
            return;
        };
        if self.is_editing(section_id) {
            return;
        }
        let Some(body) = self
            .store
            .document(&doc_id)
            .and_then(|doc| doc.section(section_id))
            .map(|section| section.body.clone())
        else {
            tracing::debug!("Cannot edit unknown section {}:{}", doc_id, section_id);
            return;
        };

        if self.commit_pending() {
            self.render_sidebar();
        }
        self.state.open_panel = None;
        self.state.edit = Some(EditSession::begin(&doc_id, section_id, &body));
        self.render_document();
        self.host.focus_section_end(section_id);
    }

    /// Leave edit mode, transferring the draft into the model.
    /// Returns whether any content changed.
    fn commit_pending(&mut self) -> bool {
        let Some(edit) = self.state.edit.take() else {
            return false;
        };
        let changed = self.store.commit(&edit.doc_id, &edit.section_id, &edit.draft);
        tracing::debug!("Committed edit of {}:{} (changed: {})", edit.doc_id, edit.section_id, changed);
        changed
    }

    fn commit_edit(&mut self) {
        if self.commit_pending() {
            self.render_sidebar();
        }
        self.render_document();
    }

    /// Leave edit mode discarding the draft
    fn cancel_edit(&mut self) {
        if let Some(edit) = self.state.edit.take() {
            tracing::debug!("Discarded edit of {}:{}", edit.doc_id, edit.section_id);
        }
        self.render_document();
    }

    /// Apply an action, ignoring malformed ones
    pub fn on_action(&mut self, action: Action) {
        if let Err(e) = self.try_action(action) {
            tracing::debug!("Ignoring action: {}", e);
        }
    }

    /// Apply a `{type, payload}` JSON action, ignoring malformed ones
    pub fn on_action_json(&mut self, action: &Value) {
        match Action::from_value(action.clone()) {
            Ok(action) => self.on_action(action),
            Err(e) => tracing::debug!("Ignoring action: {}", e),
        }
    }

    /// Apply an action, reporting why it was rejected
    pub fn try_action(&mut self, action: Action) -> Result<(), ActionError> {
        let doc_id = match action {
            Action::AddComment(payload) => self.add_comment_action(payload)?,
            Action::UpdateStatus(payload) => self.update_status_action(payload)?,
        };
        if self.state.active_doc.as_deref() == Some(doc_id.as_str()) {
            self.render_document();
        }
        Ok(())
    }

    fn resolve_document(&self, doc_id: Option<String>) -> Result<String, ActionError> {
        match non_empty(doc_id) {
            Some(id) if self.store.document(&id).is_some() => Ok(id),
            Some(id) => Err(ActionError::UnknownDocument(id)),
            None => self
                .store
                .first_document_id()
                .map(str::to_string)
                .ok_or(ActionError::NoDocument),
        }
    }

    fn add_comment_action(&mut self, payload: AddComment) -> Result<String, ActionError> {
        let doc_id = self.resolve_document(payload.doc_id)?;
        let section_id = non_empty(payload.section_id).ok_or(ActionError::MissingField("sectionId"))?;
        if self
            .store
            .document(&doc_id)
            .and_then(|doc| doc.section(&section_id))
            .is_none()
        {
            return Err(ActionError::UnknownSection(section_id));
        }

        let author = non_empty(payload.author).unwrap_or_else(|| self.config.action_author.clone());
        let text = payload.text.unwrap_or_default();
        self.store.add_comment(&doc_id, &section_id, &text, Some(author.as_str()));
        Ok(doc_id)
    }

    fn update_status_action(&mut self, payload: UpdateStatus) -> Result<String, ActionError> {
        let doc_id = self.resolve_document(payload.doc_id)?;
        let section_id =
            non_empty(payload.section_id).unwrap_or_else(|| DEFAULT_STATUS_SECTION.to_string());
        let milestone = payload.milestone.ok_or(ActionError::MissingField("milestone"))?;

        match self
            .store
            .document(&doc_id)
            .and_then(|doc| doc.section(&section_id))
        {
            None => return Err(ActionError::UnknownSection(section_id)),
            Some(section) if !matches!(section.body, SectionBody::StatusTable { .. }) => {
                return Err(ActionError::NotStatusTable(section_id));
            }
            Some(_) => {}
        }

        // An open edit of this table is committed before the update
        let editing = self
            .state
            .edit
            .as_ref()
            .is_some_and(|edit| edit.is_editing(&doc_id, &section_id));
        if editing && self.commit_pending() {
            self.render_sidebar();
        }

        if !self.store.update_status(
            &doc_id,
            &section_id,
            &milestone,
            payload.new_status.as_deref(),
            payload.new_status_class.as_deref(),
        ) {
            return Err(ActionError::UnknownMilestone(milestone));
        }
        Ok(doc_id)
    }

    fn render_sidebar(&mut self) {
        if !self.host.has_container(ContainerId::FileList) {
            return;
        }
        let html = render_sidebar(self.store.documents(), self.state.active_doc.as_deref());
        self.host.set_html(ContainerId::FileList, &html);
    }

    fn active_document(&self) -> Option<&Document> {
        self.state
            .active_doc
            .as_deref()
            .and_then(|id| self.store.document(id))
    }

    fn view_state(&self) -> ViewState<'_> {
        let editing = self
            .state
            .edit
            .as_ref()
            .filter(|edit| Some(edit.doc_id.as_str()) == self.state.active_doc.as_deref())
            .map(|edit| (edit.section_id.as_str(), &edit.draft));
        ViewState {
            comments: self.store.comment_threads(),
            open_panel: self.state.open_panel.as_deref(),
            editing,
        }
    }

    fn render_document(&mut self) {
        let markup = render_viewer(self.active_document(), &self.view_state());

        self.host.set_text(ContainerId::ViewerTitle, &markup.title);
        self.host.set_html(ContainerId::ViewerBody, &markup.body);
        self.reposition_panel();
    }

    /// Align the open panel with its section in the scrolled viewer
    fn reposition_panel(&mut self) {
        let Some(section_id) = self
            .active_document()
            .and_then(|doc| visible_panel(doc, &self.view_state()))
            .map(|section| section.id.clone())
        else {
            return;
        };

        let offset = self.host.section_offset(&section_id).unwrap_or(0.0);
        let top = panel_top(offset, self.host.scroll_top());
        self.host.position_panel(top);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::core::catalog::seed_documents;
    use crate::core::document::{Section, StatusRow};
    use crate::core::edit::{CellColumn, EditInput};
    use crate::core::storage::MemoryStore;
    use crate::host::{Focus, PageHost};

    const DELAY: Duration = Duration::from_millis(crate::core::config::DEFAULT_CLICK_DELAY_MS);

    fn viewer_with(storage: &MemoryStore, host: PageHost) -> DocsViewer<PageHost> {
        let mut viewer = DocsViewer::new(host, Box::new(storage.clone()), ViewerConfig::default());
        viewer.init(Context::new());
        viewer
    }

    fn viewer() -> (DocsViewer<PageHost>, MemoryStore) {
        let storage = MemoryStore::new();
        (viewer_with(&storage, PageHost::new()), storage)
    }

    fn body(viewer: &DocsViewer<PageHost>) -> String {
        viewer
            .host()
            .html(ContainerId::ViewerBody)
            .unwrap_or_default()
            .to_string()
    }

    fn section_body<'a>(viewer: &'a DocsViewer<PageHost>, section_id: &str) -> &'a SectionBody {
        &viewer
            .store()
            .document("launch-plan")
            .unwrap()
            .section(section_id)
            .unwrap()
            .body
    }

    fn click(viewer: &mut DocsViewer<PageHost>, section_id: &str, now: Instant) {
        viewer.dispatch(
            DomEvent::Click {
                section_id: section_id.to_string(),
                target: ClickTarget::Section,
            },
            now,
        );
    }

    fn double_click(viewer: &mut DocsViewer<PageHost>, section_id: &str, now: Instant) {
        viewer.dispatch(
            DomEvent::DoubleClick {
                section_id: section_id.to_string(),
                target: ClickTarget::Section,
            },
            now,
        );
    }

    fn type_text(viewer: &mut DocsViewer<PageHost>, section_id: &str, input: EditInput) {
        viewer.dispatch(
            DomEvent::Input {
                section_id: section_id.to_string(),
                input,
            },
            Instant::now(),
        );
    }

    fn key(viewer: &mut DocsViewer<PageHost>, key: Key, shift: bool) {
        viewer.dispatch(DomEvent::KeyDown { key, shift }, Instant::now());
    }

    #[test]
    fn test_init_selects_single_document() {
        let (viewer, _) = viewer();
        assert!(viewer.is_initialized());
        assert_eq!(viewer.active_document_id(), Some("launch-plan"));
        assert_eq!(viewer.host().total_listeners(), 8);
        assert!(viewer
            .host()
            .html(ContainerId::FileList)
            .unwrap()
            .contains("docs-file-item active"));
        assert_eq!(
            viewer.host().html(ContainerId::ViewerTitle),
            Some("Horizon v2.0 \u{2014} Launch Plan")
        );
        assert!(body(&viewer).contains("<h2>Launch Overview</h2>"));
    }

    #[test]
    fn test_single_click_toggles_after_delay() {
        let (mut viewer, _) = viewer();
        let t0 = Instant::now();

        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY / 2);
        assert_eq!(viewer.open_panel(), None);

        viewer.tick(t0 + DELAY);
        assert_eq!(viewer.open_panel(), Some("intro"));
        assert!(body(&viewer).contains("<aside class=\"docs-comment-panel\" data-section-id=\"intro\">"));
        assert_eq!(viewer.host().focus(), Some(&Focus::CommentInput("intro".to_string())));

        // Opening another panel closes the first
        click(&mut viewer, "notes", t0 + DELAY * 2);
        viewer.tick(t0 + DELAY * 3);
        assert_eq!(viewer.open_panel(), Some("notes"));

        click(&mut viewer, "notes", t0 + DELAY * 4);
        viewer.tick(t0 + DELAY * 5);
        assert_eq!(viewer.open_panel(), None);
        assert!(!body(&viewer).contains("docs-comment-panel"));
    }

    #[test]
    fn test_double_click_cancels_pending_click() {
        let (mut viewer, _) = viewer();
        let t0 = Instant::now();

        click(&mut viewer, "intro", t0);
        click(&mut viewer, "intro", t0 + Duration::from_millis(40));
        double_click(&mut viewer, "intro", t0 + Duration::from_millis(50));
        assert!(!viewer.has_pending_click());

        viewer.tick(t0 + DELAY * 4);
        assert_eq!(viewer.open_panel(), None);
        assert_eq!(viewer.edit_session().unwrap().section_id, "intro");
        assert_eq!(viewer.host().focus(), Some(&Focus::SectionEnd("intro".to_string())));
        assert!(body(&viewer).contains("<p contenteditable=\"true\">"));
    }

    #[test]
    fn test_edit_icon_enters_edit_mode() {
        let (mut viewer, _) = viewer();
        viewer.dispatch(
            DomEvent::Click {
                section_id: "overview".to_string(),
                target: ClickTarget::EditIcon,
            },
            Instant::now(),
        );
        assert_eq!(viewer.edit_session().unwrap().section_id, "overview");
        assert!(!viewer.has_pending_click());
    }

    #[test]
    fn test_editing_another_section_commits_the_first() {
        let (mut viewer, _) = viewer();
        let now = Instant::now();

        double_click(&mut viewer, "intro", now);
        type_text(&mut viewer, "intro", EditInput::Text("  A new intro.  ".to_string()));
        double_click(&mut viewer, "notes-content", now);

        assert_eq!(
            section_body(&viewer, "intro"),
            &SectionBody::Paragraph {
                content: "A new intro.".to_string()
            }
        );
        assert_eq!(viewer.edit_session().unwrap().section_id, "notes-content");
        assert_eq!(body(&viewer).matches("docs-commentable editing").count(), 1);
        assert!(viewer
            .store()
            .document("launch-plan")
            .unwrap()
            .last_edited
            .starts_with("Today, "));
    }

    #[test]
    fn test_list_commit_drops_empty_items() {
        let storage = MemoryStore::new();
        let mut writer = storage.clone();
        let docs = vec![Document {
            id: "todo".to_string(),
            title: "Todo".to_string(),
            last_edited: "Yesterday".to_string(),
            icon: "*".to_string(),
            sections: vec![Section::list("items", &["one", "two", "three"])],
        }];
        writer.set("docs-lib-version", "1").unwrap();
        writer
            .set("docs-lib-documents", &serde_json::to_string(&docs).unwrap())
            .unwrap();

        let mut viewer = viewer_with(&storage, PageHost::new());
        assert_eq!(viewer.active_document_id(), Some("todo"));

        double_click(&mut viewer, "items", Instant::now());
        type_text(
            &mut viewer,
            "items",
            EditInput::Item {
                index: 1,
                text: " ".to_string(),
            },
        );
        viewer.dispatch(
            DomEvent::FocusOut {
                section_id: "items".to_string(),
                related_section: None,
            },
            Instant::now(),
        );

        assert!(viewer.edit_session().is_none());
        let section = viewer.store().document("todo").unwrap().section("items").unwrap();
        assert_eq!(
            section.body,
            SectionBody::List {
                items: vec!["one".to_string(), "three".to_string()]
            }
        );
    }

    #[test]
    fn test_escape_discards_edit() {
        let (mut viewer, storage) = viewer();
        let before = section_body(&viewer, "intro").clone();

        double_click(&mut viewer, "intro", Instant::now());
        type_text(&mut viewer, "intro", EditInput::Text("scratch".to_string()));
        key(&mut viewer, Key::Escape, false);

        assert!(viewer.edit_session().is_none());
        assert_eq!(section_body(&viewer, "intro"), &before);
        assert!(!body(&viewer).contains("scratch"));
        assert!(storage.get("docs-lib-documents").unwrap().is_none());
    }

    #[test]
    fn test_enter_commits_headings_and_tables_only() {
        let (mut viewer, _) = viewer();
        let now = Instant::now();

        double_click(&mut viewer, "intro", now);
        type_text(&mut viewer, "intro", EditInput::Text("Para".to_string()));
        key(&mut viewer, Key::Enter, false);
        assert!(viewer.edit_session().is_some());
        key(&mut viewer, Key::Escape, false);

        double_click(&mut viewer, "overview", now);
        type_text(&mut viewer, "overview", EditInput::Text("Overview".to_string()));
        key(&mut viewer, Key::Enter, true);
        assert!(viewer.edit_session().is_some());
        key(&mut viewer, Key::Enter, false);
        assert!(viewer.edit_session().is_none());
        assert_eq!(
            section_body(&viewer, "overview"),
            &SectionBody::Heading {
                content: "Overview".to_string()
            }
        );

        double_click(&mut viewer, "status-table", now);
        type_text(
            &mut viewer,
            "status-table",
            EditInput::Cell {
                row: 3,
                column: CellColumn::Status,
                text: "Done".to_string(),
            },
        );
        key(&mut viewer, Key::Enter, false);
        let SectionBody::StatusTable { rows } = section_body(&viewer, "status-table") else {
            panic!("not a status table");
        };
        assert_eq!(rows[3], StatusRow::new("Final System Check", "Done", "status-pending"));
    }

    #[test]
    fn test_focus_within_section_keeps_editing() {
        let (mut viewer, _) = viewer();
        double_click(&mut viewer, "timeline-details", Instant::now());

        viewer.dispatch(
            DomEvent::FocusOut {
                section_id: "timeline-details".to_string(),
                related_section: Some("timeline-details".to_string()),
            },
            Instant::now(),
        );
        assert!(viewer.edit_session().is_some());

        viewer.dispatch(
            DomEvent::FocusOut {
                section_id: "timeline-details".to_string(),
                related_section: Some("notes".to_string()),
            },
            Instant::now(),
        );
        assert!(viewer.edit_session().is_none());
    }

    #[test]
    fn test_entering_edit_closes_panel() {
        let (mut viewer, _) = viewer();
        let t0 = Instant::now();
        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY);
        assert_eq!(viewer.open_panel(), Some("intro"));

        double_click(&mut viewer, "intro", t0 + DELAY * 2);
        assert_eq!(viewer.open_panel(), None);
        assert!(!body(&viewer).contains("docs-comment-panel"));
    }

    #[test]
    fn test_toggling_panel_commits_active_edit() {
        let (mut viewer, _) = viewer();
        let t0 = Instant::now();
        double_click(&mut viewer, "overview", t0);
        type_text(&mut viewer, "overview", EditInput::Text("Renamed".to_string()));

        // Clicks on the section being edited are ignored
        click(&mut viewer, "overview", t0);
        assert!(!viewer.has_pending_click());

        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY);
        assert!(viewer.edit_session().is_none());
        assert_eq!(viewer.open_panel(), Some("intro"));
        assert_eq!(
            section_body(&viewer, "overview"),
            &SectionBody::Heading {
                content: "Renamed".to_string()
            }
        );
    }

    #[test]
    fn test_panel_clicks_are_ignored() {
        let (mut viewer, _) = viewer();
        let t0 = Instant::now();
        viewer.dispatch(
            DomEvent::Click {
                section_id: "intro".to_string(),
                target: ClickTarget::CommentPanel,
            },
            t0,
        );
        viewer.dispatch(
            DomEvent::DoubleClick {
                section_id: "intro".to_string(),
                target: ClickTarget::CommentPanel,
            },
            t0,
        );
        assert!(!viewer.has_pending_click());
        assert!(viewer.edit_session().is_none());
    }

    #[test]
    fn test_submit_comment_emits_event() {
        let storage = MemoryStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let mut viewer = DocsViewer::new(PageHost::new(), Box::new(storage.clone()), ViewerConfig::default());
        viewer.init(Context::new().with_emit(move |name, payload| {
            sink.borrow_mut().push((name.to_string(), payload.clone()));
        }));

        let submit = |text: &str| DomEvent::SubmitComment {
            section_id: "intro".to_string(),
            text: text.to_string(),
        };
        viewer.dispatch(submit("   "), Instant::now());
        viewer.dispatch(submit("  Ship it  "), Instant::now());

        let comments = viewer.store().get_comments("launch-plan", "intro");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "Ship it");
        assert_eq!(comments[0].author, "You");
        assert!(body(&viewer).contains("docs-comment-indicator\">1<"));
        assert!(storage.get("docs-lib-comments").unwrap().unwrap().contains("Ship it"));

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, COMMENT_ADDED_EVENT);
        assert_eq!(
            events[0].1,
            json!({ "docId": "launch-plan", "sectionId": "intro", "text": "Ship it" })
        );
    }

    #[test]
    fn test_update_status_action() {
        let (mut viewer, _) = viewer();
        viewer.on_action_json(&json!({
            "type": "update-status",
            "payload": {
                "docId": "launch-plan",
                "milestone": "Launch Time",
                "newStatus": "Delayed",
                "newStatusClass": "status-pending"
            }
        }));

        let SectionBody::StatusTable { rows } = section_body(&viewer, "status-table") else {
            panic!("not a status table");
        };
        let seed = seed_documents();
        let SectionBody::StatusTable { rows: seed_rows } = &seed[0].section("status-table").unwrap().body else {
            panic!("not a status table");
        };
        for (row, before) in rows.iter().zip(seed_rows) {
            if row.milestone == "Launch Time" {
                assert_eq!(row, &StatusRow::new("Launch Time", "Delayed", "status-pending"));
            } else {
                assert_eq!(row, before);
            }
        }
        assert!(body(&viewer).contains("class=\"status-pending\">Delayed</td>"));
    }

    #[test]
    fn test_update_status_during_table_edit_is_kept() {
        let (mut viewer, _) = viewer();
        double_click(&mut viewer, "status-table", Instant::now());
        type_text(
            &mut viewer,
            "status-table",
            EditInput::Cell {
                row: 0,
                column: CellColumn::Status,
                text: "Shipped".to_string(),
            },
        );

        viewer.on_action(Action::UpdateStatus(UpdateStatus {
            milestone: Some("Launch Time".to_string()),
            new_status: Some("Delayed".to_string()),
            ..Default::default()
        }));
        assert!(viewer.edit_session().is_none());

        viewer.dispatch(
            DomEvent::FocusOut {
                section_id: "status-table".to_string(),
                related_section: None,
            },
            Instant::now(),
        );

        let SectionBody::StatusTable { rows } = section_body(&viewer, "status-table") else {
            panic!("not a status table");
        };
        let launch = rows.iter().find(|r| r.milestone == "Launch Time").unwrap();
        assert_eq!(launch.status, "Delayed");
        // The typed cell was committed before the update
        assert_eq!(rows[0].status, "Shipped");
        assert!(body(&viewer).contains(">Delayed</td>"));
    }

    #[test]
    fn test_add_comment_action_defaults() {
        let (mut viewer, _) = viewer();
        viewer.on_action(Action::AddComment(AddComment {
            section_id: Some("notes".to_string()),
            text: Some("From the host".to_string()),
            ..Default::default()
        }));

        let comments = viewer.store().get_comments("launch-plan", "notes");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "System");
        assert!(body(&viewer).contains("docs-comment-indicator\">1<"));
    }

    #[test]
    fn test_malformed_actions_are_ignored() {
        let (mut viewer, _) = viewer();
        viewer.on_action_json(&json!({ "type": "add-comment" }));
        viewer.on_action_json(&json!({ "type": "add-comment", "payload": { "sectionId": "nope" } }));
        viewer.on_action_json(&json!({ "type": "launch-rockets", "payload": {} }));
        viewer.on_action_json(&json!("not an object"));
        viewer.on_action_json(&json!({ "type": "update-status", "payload": { "sectionId": "intro", "milestone": "x" } }));

        assert!(viewer.store().comment_threads().is_empty());
        assert!(matches!(
            viewer.try_action(Action::AddComment(AddComment::default())),
            Err(ActionError::MissingField("sectionId"))
        ));
        assert!(matches!(
            viewer.try_action(Action::UpdateStatus(UpdateStatus {
                milestone: Some("Unknown".to_string()),
                ..Default::default()
            })),
            Err(ActionError::UnknownMilestone(_))
        ));
        assert!(matches!(
            viewer.try_action(Action::UpdateStatus(UpdateStatus {
                doc_id: Some("missing".to_string()),
                ..Default::default()
            })),
            Err(ActionError::UnknownDocument(_))
        ));
    }

    #[test]
    fn test_select_document_closes_panel() {
        let (mut viewer, _) = viewer();
        let t0 = Instant::now();
        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY);
        assert_eq!(viewer.open_panel(), Some("intro"));

        viewer.dispatch(
            DomEvent::SelectDocument {
                doc_id: "launch-plan".to_string(),
            },
            t0,
        );
        assert_eq!(viewer.open_panel(), None);

        viewer.select_document("missing");
        assert_eq!(viewer.active_document_id(), Some("launch-plan"));
    }

    #[test]
    fn test_panel_follows_scroll() {
        let (mut viewer, _) = viewer();
        viewer.host_mut().set_section_offset("intro", 300.0);
        let t0 = Instant::now();
        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY);
        assert_eq!(viewer.host().panel_top(), Some(300.0));

        viewer.host_mut().set_scroll_top(120.0);
        viewer.dispatch(DomEvent::Scroll, t0);
        assert_eq!(viewer.host().panel_top(), Some(180.0));
    }

    #[test]
    fn test_reinit_does_not_duplicate_listeners() {
        let (mut viewer, _) = viewer();
        viewer.destroy();
        assert!(!viewer.is_initialized());
        assert_eq!(viewer.host().total_listeners(), 0);
        assert!(viewer.routes.borrow().is_empty());
        assert!(viewer.subscriptions.is_empty());
        assert!(viewer.store().documents().is_empty());

        viewer.init(Context::new());
        viewer.init(Context::new());
        assert_eq!(viewer.host().total_listeners(), 8);
        assert_eq!(viewer.routes.borrow().len(), 8);
        assert_eq!(viewer.host().listener_count(ContainerId::ViewerBody, EventKind::Click), 1);

        let t0 = Instant::now();
        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY);
        assert_eq!(viewer.open_panel(), Some("intro"));
    }

    #[test]
    fn test_events_after_destroy_are_ignored() {
        let (mut viewer, _) = viewer();
        viewer.destroy();
        let t0 = Instant::now();
        click(&mut viewer, "intro", t0);
        viewer.tick(t0 + DELAY);
        assert_eq!(viewer.open_panel(), None);
    }

    #[test]
    fn test_missing_container_does_not_fail_init() {
        let storage = MemoryStore::new();
        let viewer = viewer_with(&storage, PageHost::new().without(ContainerId::FileList));
        assert_eq!(viewer.active_document_id(), Some("launch-plan"));
        assert_eq!(viewer.host().total_listeners(), 7);
        assert!(body(&viewer).contains("docs-page"));
    }

    #[test]
    fn test_comments_survive_reinit() {
        let (mut viewer, storage) = viewer();
        viewer.dispatch(
            DomEvent::SubmitComment {
                section_id: "timeline".to_string(),
                text: "Move standup?".to_string(),
            },
            Instant::now(),
        );
        viewer.destroy();

        let viewer = viewer_with(&storage, PageHost::new());
        assert_eq!(viewer.store().get_comments("launch-plan", "timeline").len(), 1);
    }
}
