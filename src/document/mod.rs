//! In-memory dashboard document.
//!
//! The document is the render target of the poller: a set of elements
//! addressed by stable identifiers, each with a class list and child nodes.
//! The terminal UI draws from it; tests inspect it directly.
//!
//! ## Submodules
//!
//! - [`fragment`]: contextual markup parsing ([`Fragment`], [`Script`])
//! - [`script`]: script execution hosts ([`ScriptHost`])

pub mod fragment;
pub mod script;

pub use fragment::{Fragment, Script};
pub use script::{RecordingScriptHost, ScriptHost, TracingScriptHost};

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use regex::Regex;

/// Element identifiers the dashboard renders into.
pub mod ids {
    pub const KPI_CURRENT: &str = "kpi-current";
    pub const KPI_MIN: &str = "kpi-min";
    pub const KPI_MAX: &str = "kpi-max";
    pub const KPI_AVG: &str = "kpi-avg";
    pub const LAST_UPDATE: &str = "last-update";
    pub const STATUS_BOX: &str = "status-box";
    pub const CHART_CONTAINER: &str = "chart-container";

    /// Every slot of the standard dashboard page.
    pub const DASHBOARD: &[&str] = &[
        KPI_CURRENT,
        KPI_MIN,
        KPI_MAX,
        KPI_AVG,
        LAST_UPDATE,
        STATUS_BOX,
        CHART_CONTAINER,
    ];
}

/// Base class of the status badge.
pub const STATUS_CARD_CLASS: &str = "status-card";

/// A document shared between the poller and whoever draws it.
pub type SharedDocument = Arc<Mutex<Document>>;

/// A child node of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text.
    Text(String),
    /// Icon marker, named by its icon class (e.g. `fa-check-circle`).
    Icon(String),
    /// Static markup.
    Markup(String),
    /// Embedded script.
    Script(Script),
}

/// A single addressable element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    id: String,
    class_name: String,
    children: Vec<Node>,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The full class attribute.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Replace the whole class list.
    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        self.class_name = class_name.into();
    }

    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.class_name.split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Remove all children.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn append_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Visible text: text nodes and tag-stripped markup, in order.
    ///
    /// Icons and scripts contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Markup(markup) => out.push_str(&strip_tags(markup)),
                Node::Icon(_) | Node::Script(_) => {}
            }
        }
        out
    }

    /// First icon marker among the children.
    pub fn icon(&self) -> Option<&str> {
        self.children.iter().find_map(|node| match node {
            Node::Icon(icon) => Some(icon.as_str()),
            _ => None,
        })
    }

    /// Replace children by assigning markup. Embedded scripts stay inert.
    pub fn set_inner_markup(&mut self, markup: &str) {
        self.children = Fragment::parse_inert(markup).into_nodes();
    }

    /// Scripts among the children, in order.
    pub fn scripts(&self) -> impl Iterator<Item = &Script> {
        self.children.iter().filter_map(|node| match node {
            Node::Script(script) => Some(script),
            _ => None,
        })
    }
}

fn strip_tags(markup: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));
    tag.replace_all(markup, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// The dashboard document.
#[derive(Debug)]
pub struct Document {
    elements: BTreeMap<String, Element>,
    script_host: Box<dyn ScriptHost>,
    scripts_executed: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document that logs script execution.
    pub fn new() -> Self {
        Self::with_script_host(TracingScriptHost)
    }

    /// Create an empty document with the given script host.
    pub fn with_script_host(host: impl ScriptHost + 'static) -> Self {
        Self {
            elements: BTreeMap::new(),
            script_host: Box::new(host),
            scripts_executed: 0,
        }
    }

    /// Create the standard dashboard page.
    pub fn dashboard() -> Self {
        let mut document = Self::new();
        document.install_dashboard_slots();
        document
    }

    /// Add every dashboard slot that does not exist yet.
    ///
    /// The status badge starts out with the `status-card` base class.
    pub fn install_dashboard_slots(&mut self) {
        for id in ids::DASHBOARD {
            self.create_element(id);
        }
        if let Some(status) = self.get_element_by_id_mut(ids::STATUS_BOX) {
            if status.class_name().is_empty() {
                status.set_class_name(STATUS_CARD_CLASS);
            }
        }
    }

    /// Wrap the document for sharing with a poller.
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    /// Get or create the element with the given id.
    pub fn create_element(&mut self, id: &str) -> &mut Element {
        self.elements
            .entry(id.to_string())
            .or_insert_with(|| Element::new(id))
    }

    pub fn remove_element(&mut self, id: &str) -> Option<Element> {
        self.elements.remove(id)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// All elements, ordered by id.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Append a fragment to an element and run its pending scripts.
    ///
    /// All nodes are inserted first; scripts then execute in document order,
    /// each exactly once. Returns false if the element does not exist.
    pub fn append_fragment(&mut self, id: &str, fragment: Fragment) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };

        let start = element.children.len();
        element.children.extend(fragment.into_nodes());

        for node in &mut element.children[start..] {
            if let Node::Script(script) = node {
                if script.is_pending() {
                    self.script_host.execute(script);
                    script.mark_started();
                    self.scripts_executed += 1;
                }
            }
        }
        true
    }

    /// Total scripts executed by this document.
    pub fn scripts_executed(&self) -> u64 {
        self.scripts_executed
    }
}
