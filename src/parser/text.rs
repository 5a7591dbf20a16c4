use std::sync::LazyLock;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};

use super::patterns;
use super::ExtractionStrategy;

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static WRAPPER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, font, strong, b, em, i").unwrap());

/// Regex-only extraction over the page's visible text.
pub struct TextStrategy;

impl ExtractionStrategy for TextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn version(&self, doc: &Html) -> Option<String> {
        scan(doc, patterns::find_version)
    }

    fn date(&self, doc: &Html) -> Option<String> {
        scan(doc, patterns::find_date)
    }
}

/// Try `find` on the whole visible text, then on each styling wrapper in document order.
///
/// The whole-page text separates text nodes with spaces, which breaks values
/// the page splits over inline tags (`<span>2026-<b>09</b>-30</span>`). The
/// per-wrapper pass joins the wrapper's nodes as rendered, without separators.
pub(crate) fn scan(doc: &Html, find: fn(&str) -> Option<String>) -> Option<String> {
    find(&visible_text(doc.root_element())).or_else(|| {
        doc.select(&WRAPPER_SEL)
            .find_map(|el| find(&inline_text(el)))
    })
}

/// Text nodes under `root`, trimmed and space-joined, skipping script-like containers.
pub fn visible_text(root: ElementRef) -> String {
    text_nodes(root)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes under `root` concatenated as-is.
fn inline_text(root: ElementRef) -> String {
    text_nodes(root).collect()
}

fn text_nodes<'a>(root: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    root.descendants().filter_map(|node| match node.value() {
        Node::Text(t) if !is_hidden(node) => Some(&**t),
        _ => None,
    })
}

fn is_hidden(node: NodeRef<Node>) -> bool {
    node.ancestors().any(|a| match a.value() {
        Node::Element(el) => HIDDEN_TAGS.contains(&el.name()),
        _ => false,
    })
}
