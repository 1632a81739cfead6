//! Host integration: containers, DOM events, listener disposal and the event bus

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::core::edit::EditInput;
use crate::ui::html::escape;

/// Containers the host page supplies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerId {
    FileList,
    ViewerTitle,
    ViewerBody,
}

impl ContainerId {
    pub const ALL: [ContainerId; 3] = [
        ContainerId::FileList,
        ContainerId::ViewerTitle,
        ContainerId::ViewerBody,
    ];

    /// DOM element id of the container
    pub fn dom_id(self) -> &'static str {
        match self {
            ContainerId::FileList => "docs-file-list",
            ContainerId::ViewerTitle => "docs-viewer-title",
            ContainerId::ViewerBody => "docs-viewer-body",
        }
    }
}

/// DOM event types the viewer listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    DoubleClick,
    FocusOut,
    KeyDown,
    Input,
    Submit,
    Scroll,
}

/// Handle returned by [`Host::add_listener`]
pub type ListenerId = u64;

/// Part of a section a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// Section content or its comment indicator
    Section,
    /// The edit icon button
    EditIcon,
    /// Inside the floating comment panel
    CommentPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

/// A DOM event already resolved to the section or document it targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// Click on a sidebar entry
    SelectDocument { doc_id: String },
    Click {
        section_id: String,
        target: ClickTarget,
    },
    DoubleClick {
        section_id: String,
        target: ClickTarget,
    },
    /// Text typed into an editable node of a section
    Input {
        section_id: String,
        input: EditInput,
    },
    /// Focus left an editable node of `section_id`; `related_section` is the
    /// section containing the element receiving focus, if any
    FocusOut {
        section_id: String,
        related_section: Option<String>,
    },
    KeyDown { key: Key, shift: bool },
    SubmitComment { section_id: String, text: String },
    Scroll,
}

impl DomEvent {
    /// Container the event bubbles to
    pub fn container(&self) -> ContainerId {
        match self {
            DomEvent::SelectDocument { .. } => ContainerId::FileList,
            _ => ContainerId::ViewerBody,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomEvent::SelectDocument { .. } | DomEvent::Click { .. } => EventKind::Click,
            DomEvent::DoubleClick { .. } => EventKind::DoubleClick,
            DomEvent::Input { .. } => EventKind::Input,
            DomEvent::FocusOut { .. } => EventKind::FocusOut,
            DomEvent::KeyDown { .. } => EventKind::KeyDown,
            DomEvent::SubmitComment { .. } => EventKind::Submit,
            DomEvent::Scroll => EventKind::Scroll,
        }
    }
}

/// The page hosting the viewer
pub trait Host {
    fn has_container(&self, id: ContainerId) -> bool;

    /// Replace a container's markup. No-op when the container is missing.
    fn set_html(&mut self, id: ContainerId, html: &str);

    /// Replace a container's text content. No-op when the container is missing.
    fn set_text(&mut self, id: ContainerId, text: &str);

    fn add_listener(&mut self, id: ContainerId, kind: EventKind) -> ListenerId;

    fn remove_listener(&mut self, listener: ListenerId);

    /// Focus the comment input of an open panel
    fn focus_comment_input(&mut self, _section_id: &str) {}

    /// Focus the end of a section's editable content
    fn focus_section_end(&mut self, _section_id: &str) {}

    /// Vertical offset of a section within the scrollable viewer content
    fn section_offset(&self, _section_id: &str) -> Option<f32> {
        None
    }

    fn scroll_top(&self) -> f32 {
        0.0
    }

    /// Move the floating comment panel
    fn position_panel(&mut self, _top: f32) {}
}

type Disposer = Box<dyn FnOnce(&mut dyn Host)>;

/// Unsubscribe closures released together on teardown
#[derive(Default)]
pub struct Subscriptions {
    disposers: Vec<Disposer>,
}

impl Subscriptions {
    pub fn push(&mut self, disposer: impl FnOnce(&mut dyn Host) + 'static) {
        self.disposers.push(Box::new(disposer));
    }

    /// Track a host listener so disposal removes it, then runs `release`
    pub fn track(&mut self, listener: ListenerId, release: impl FnOnce() + 'static) {
        self.push(move |host| {
            host.remove_listener(listener);
            release();
        });
    }

    /// Run every disposer once
    pub fn dispose(&mut self, host: &mut dyn Host) {
        for disposer in self.disposers.drain(..) {
            disposer(host);
        }
    }

    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }
}

type EmitFn = Box<dyn FnMut(&str, &Value)>;

/// Host context handed to `init`
#[derive(Default)]
pub struct Context {
    emit: Option<EmitFn>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an event bus callback
    pub fn with_emit(mut self, emit: impl FnMut(&str, &Value) + 'static) -> Self {
        self.emit = Some(Box::new(emit));
        self
    }

    pub fn emit(&mut self, event: &str, payload: &Value) {
        if let Some(emit) = self.emit.as_mut() {
            emit(event, payload);
        }
    }
}

/// Focus requests recorded by [`PageHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    CommentInput(String),
    SectionEnd(String),
}

/// In-memory page holding the three containers
#[derive(Debug, Clone)]
pub struct PageHost {
    containers: HashMap<ContainerId, String>,
    listeners: BTreeMap<ListenerId, (ContainerId, EventKind)>,
    next_listener: ListenerId,
    focus: Option<Focus>,
    offsets: HashMap<String, f32>,
    scroll_top: f32,
    panel_top: Option<f32>,
}

impl Default for PageHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PageHost {
    /// Page with every container present
    pub fn new() -> Self {
        Self {
            containers: ContainerId::ALL
                .iter()
                .map(|id| (*id, String::new()))
                .collect(),
            listeners: BTreeMap::new(),
            next_listener: 1,
            focus: None,
            offsets: HashMap::new(),
            scroll_top: 0.0,
            panel_top: None,
        }
    }

    /// Page lacking one container
    pub fn without(mut self, id: ContainerId) -> Self {
        self.containers.remove(&id);
        self
    }

    pub fn html(&self, id: ContainerId) -> Option<&str> {
        self.containers.get(&id).map(String::as_str)
    }

    pub fn listener_count(&self, id: ContainerId, kind: EventKind) -> usize {
        self.listeners
            .values()
            .filter(|(c, k)| *c == id && *k == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn panel_top(&self) -> Option<f32> {
        self.panel_top
    }

    pub fn set_section_offset(&mut self, section_id: &str, offset: f32) {
        self.offsets.insert(section_id.to_string(), offset);
    }

    pub fn set_scroll_top(&mut self, top: f32) {
        self.scroll_top = top;
    }

    /// Standalone HTML page with the current container contents
    pub fn render_page(&self) -> String {
        let container = |id: ContainerId| self.html(id).unwrap_or_default();
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Docs</title>\n</head>\n<body>\n\
             <div class=\"docs-layout\">\n\
             <nav class=\"docs-sidebar\" id=\"{}\">{}</nav>\n\
             <main class=\"docs-viewer\">\n<header class=\"docs-viewer-title\" id=\"{}\">{}</header>\n\
             <section class=\"docs-viewer-body\" id=\"{}\">{}</section>\n</main>\n\
             </div>\n</body>\n</html>\n",
            ContainerId::FileList.dom_id(),
            container(ContainerId::FileList),
            ContainerId::ViewerTitle.dom_id(),
            container(ContainerId::ViewerTitle),
            ContainerId::ViewerBody.dom_id(),
            container(ContainerId::ViewerBody),
        )
    }
}

impl Host for PageHost {
    fn has_container(&self, id: ContainerId) -> bool {
        self.containers.contains_key(&id)
    }

    fn set_html(&mut self, id: ContainerId, html: &str) {
        if let Some(content) = self.containers.get_mut(&id) {
            *content = html.to_string();
        }
    }

    fn set_text(&mut self, id: ContainerId, text: &str) {
        if let Some(content) = self.containers.get_mut(&id) {
            *content = escape(text);
        }
    }

    fn add_listener(&mut self, id: ContainerId, kind: EventKind) -> ListenerId {
        let listener = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(listener, (id, kind));
        listener
    }

    fn remove_listener(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn focus_comment_input(&mut self, section_id: &str) {
        self.focus = Some(Focus::CommentInput(section_id.to_string()));
    }

    fn focus_section_end(&mut self, section_id: &str) {
        self.focus = Some(Focus::SectionEnd(section_id.to_string()));
    }

    fn section_offset(&self, section_id: &str) -> Option<f32> {
        self.offsets.get(section_id).copied()
    }

    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    fn position_panel(&mut self, top: f32) {
        self.panel_top = Some(top);
    }
}
