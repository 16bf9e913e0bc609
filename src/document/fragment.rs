//! Contextual fragment parsing.
//!
//! A fragment is a flat list of nodes produced from a markup string. Static
//! markup is kept as-is; `<script>` elements are lifted out into [`Script`]
//! nodes so the document can run them when the fragment is inserted.

use std::sync::OnceLock;

use regex::Regex;

use super::Node;

/// MIME types a browser treats as classic or module scripts.
const SCRIPT_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "application/ecmascript",
    "text/ecmascript",
    "module",
];

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("valid script pattern")
    })
}

fn attribute_pattern(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)(?:^|\s){}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#,
        regex::escape(name)
    ))
    .expect("valid attribute pattern")
}

fn src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("src"))
}

fn type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| attribute_pattern("type"))
}

/// An embedded script element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    attributes: String,
    src: Option<String>,
    body: String,
    runnable: bool,
    pending: bool,
}

impl Script {
    fn parse(attributes: &str, body: &str) -> Self {
        let attributes = attributes.trim().to_string();
        let src = attribute(&attributes, src_pattern());
        let runnable = match attribute(&attributes, type_pattern()) {
            None => true,
            Some(kind) => {
                let kind = kind.trim().to_ascii_lowercase();
                kind.is_empty() || SCRIPT_TYPES.contains(&kind.as_str())
            }
        };
        Self {
            attributes,
            src,
            body: body.to_string(),
            runnable,
            pending: runnable,
        }
    }

    /// Raw attribute text of the opening tag.
    pub fn attributes(&self) -> &str {
        &self.attributes
    }

    /// External script URL, if any.
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Inline script source.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the `type` attribute names something a browser would execute.
    pub fn is_runnable(&self) -> bool {
        self.runnable
    }

    /// Whether the script will run when its fragment is inserted.
    ///
    /// False for scripts that already ran, for data blocks, and for scripts
    /// that arrived through inert markup assignment.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(super) fn mark_started(&mut self) {
        self.pending = false;
    }
}

fn attribute(attributes: &str, pattern: &Regex) -> Option<String> {
    let caps = pattern.captures(attributes)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}

/// A parsed markup fragment, ready to be appended to an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    /// Parse markup as live content.
    ///
    /// Scripts in the result are pending and execute once when the fragment
    /// is appended through [`Document::append_fragment`](super::Document::append_fragment).
    pub fn parse_contextual(markup: &str) -> Self {
        let mut nodes = Vec::new();
        let mut last = 0;

        for caps in script_pattern().captures_iter(markup) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                nodes.push(Node::Markup(markup[last..whole.start()].to_string()));
            }
            let attributes = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            nodes.push(Node::Script(Script::parse(attributes, body)));
            last = whole.end();
        }

        if last < markup.len() {
            nodes.push(Node::Markup(markup[last..].to_string()));
        }

        Self { nodes }
    }

    /// Parse markup as inert content. Scripts are kept but never run.
    pub fn parse_inert(markup: &str) -> Self {
        let mut fragment = Self::parse_contextual(markup);
        for node in &mut fragment.nodes {
            if let Node::Script(script) = node {
                script.mark_started();
            }
        }
        fragment
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Scripts in document order.
    pub fn scripts(&self) -> impl Iterator<Item = &Script> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Script(script) => Some(script),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(super) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_markup() {
        let fragment = Fragment::parse_contextual("<div id=\"plot\">chart</div>");
        assert_eq!(fragment.nodes().len(), 1);
        assert_eq!(fragment.scripts().count(), 0);
        assert!(matches!(&fragment.nodes()[0], Node::Markup(m) if m == "<div id=\"plot\">chart</div>"));
    }

    #[test]
    fn test_parse_scripts_in_order() {
        let markup = r#"<div>
<script src="https://cdn.plot.ly/plotly.min.js"></script>
<div id="plot"></div>
<SCRIPT type="text/javascript">Plotly.newPlot("plot", data);</SCRIPT >
</div>"#;

        let fragment = Fragment::parse_contextual(markup);
        let scripts: Vec<&Script> = fragment.scripts().collect();
        assert_eq!(scripts.len(), 2);

        assert_eq!(scripts[0].src(), Some("https://cdn.plot.ly/plotly.min.js"));
        assert_eq!(scripts[0].body(), "");
        assert!(scripts[0].is_pending());

        assert!(scripts[1].src().is_none());
        assert_eq!(scripts[1].body(), r#"Plotly.newPlot("plot", data);"#);
        assert_eq!(scripts[1].attributes(), r#"type="text/javascript""#);
        assert!(scripts[1].is_pending());

        // Markup around the scripts survives in order.
        assert!(matches!(&fragment.nodes()[0], Node::Markup(m) if m == "<div>\n"));
        assert!(matches!(fragment.nodes().last(), Some(Node::Markup(m)) if m == "\n</div>"));
    }

    #[test]
    fn test_attribute_quoting_styles() {
        let fragment = Fragment::parse_contextual(
            "<script src='a.js'></script><script src=b.js type=text/javascript></script><script data-src=\"c.js\"></script>",
        );
        let scripts: Vec<&Script> = fragment.scripts().collect();
        assert_eq!(scripts[0].src(), Some("a.js"));
        assert_eq!(scripts[1].src(), Some("b.js"));
        assert!(scripts[1].is_runnable());
        assert_eq!(scripts[2].src(), None);
    }

    #[test]
    fn test_data_blocks_do_not_run() {
        let fragment = Fragment::parse_contextual(
            r#"<script type="application/json">{"x":1}</script><script type='module'>go()</script>"#,
        );
        let scripts: Vec<&Script> = fragment.scripts().collect();
        assert!(!scripts[0].is_runnable());
        assert!(!scripts[0].is_pending());
        assert!(scripts[1].is_runnable());
        assert!(scripts[1].is_pending());
    }

    #[test]
    fn test_inert_parse_keeps_scripts_but_never_runs_them() {
        let fragment = Fragment::parse_inert("<script>alert(1)</script>");
        let script = fragment.scripts().next().unwrap();
        assert_eq!(script.body(), "alert(1)");
        assert!(script.is_runnable());
        assert!(!script.is_pending());
    }

    #[test]
    fn test_unterminated_script_stays_markup() {
        let fragment = Fragment::parse_contextual("<script>never closed");
        assert_eq!(fragment.scripts().count(), 0);
        assert_eq!(fragment.nodes().len(), 1);
    }

    #[test]
    fn test_empty_markup() {
        assert!(Fragment::parse_contextual("").is_empty());
    }
}
