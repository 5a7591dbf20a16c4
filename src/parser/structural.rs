use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::text::{scan, visible_text};
use super::{patterns, ExtractionStrategy};

/// Looks the version up at a fixed element path, falling back to the text scan.
///
/// Page layouts drift, so a missing element or an unparsable path is an
/// ordinary miss rather than an error.
pub struct StructuralStrategy {
    selector: Option<Selector>,
}

impl StructuralStrategy {
    pub fn new(path: &str) -> Self {
        let selector = match Selector::parse(path) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!("Ignoring invalid version selector {:?}: {:?}", path, e);
                None
            }
        };
        Self { selector }
    }

    fn lookup(&self, doc: &Html) -> Option<String> {
        let selector = self.selector.as_ref()?;
        let Some(element) = doc.select(selector).next() else {
            debug!("Version element not found, falling back to text scan");
            return None;
        };
        let text = visible_text(element);
        let version = patterns::find_bare_version(&text);
        if version.is_none() {
            debug!("Version element text {:?} has no version", text);
        }
        version
    }
}

impl ExtractionStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn version(&self, doc: &Html) -> Option<String> {
        self.lookup(doc)
            .or_else(|| scan(doc, patterns::find_version))
    }

    fn date(&self, doc: &Html) -> Option<String> {
        scan(doc, patterns::find_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::text::TextStrategy;
    use crate::settings::Settings;

    const PAGE: &str = "<html><body>\
        <h1>MuMu Player</h1>\
        <div class=\"legacy\"><p>Older build V3.8.1</p></div>\
        <div class=\"current\"><p><span>v4.2.0</span></p></div>\
        </body></html>";

    #[test]
    fn element_path_wins() {
        let d = Html::parse_document(PAGE);
        let s = StructuralStrategy::new("div.current > p > span");
        assert_eq!(s.version(&d).as_deref(), Some("V4.2.0"));
        // the text scan alone sees the older build first
        assert_eq!(TextStrategy.version(&d).as_deref(), Some("V3.8.1"));
    }

    #[test]
    fn spaced_version_in_nested_font() {
        let d = Html::parse_document("<div><font><font>V 4.1.29</font></font></div>");
        let s = StructuralStrategy::new("font > font");
        assert_eq!(s.lookup(&d).as_deref(), Some("V4.1.29"));
    }

    #[test]
    fn missing_element_falls_back() {
        let d = Html::parse_document(PAGE);
        let s = StructuralStrategy::new("div.nowhere > span");
        assert_eq!(s.version(&d).as_deref(), Some("V3.8.1"));
    }

    #[test]
    fn element_without_version_falls_back() {
        let d = Html::parse_document(PAGE);
        let s = StructuralStrategy::new("h1");
        assert_eq!(s.lookup(&d), None);
        assert_eq!(s.version(&d).as_deref(), Some("V3.8.1"));
    }

    #[test]
    fn invalid_selector_falls_back() {
        let d = Html::parse_document(PAGE);
        let s = StructuralStrategy::new("div[[[");
        assert!(s.selector.is_none());
        assert_eq!(s.version(&d).as_deref(), Some("V3.8.1"));
    }

    #[test]
    fn default_path_matches_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/download_page.html").unwrap();
        let d = Html::parse_document(&html);
        let s = StructuralStrategy::new(&Settings::default().version_selector);
        assert_eq!(s.lookup(&d).as_deref(), Some("V4.2.0"));
        assert_eq!(s.date(&d).as_deref(), Some("2026-09-30"));
    }
}
