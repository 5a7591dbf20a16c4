pub mod patterns;
pub mod structural;
pub mod text;

use scraper::Html;
use serde::Serialize;
use tracing::{debug, info};

use crate::settings::{Settings, Strategy};
use structural::StructuralStrategy;
use text::TextStrategy;

/// What a page yielded. Either half may be missing; that is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Always starts with an upper-case `V`.
    pub version: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// One way of turning a parsed page into a version and a date.
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;
    fn version(&self, doc: &Html) -> Option<String>;
    fn date(&self, doc: &Html) -> Option<String>;
}

pub fn strategy_for(settings: &Settings) -> Box<dyn ExtractionStrategy> {
    match settings.strategy {
        Strategy::Structural => Box::new(StructuralStrategy::new(&settings.version_selector)),
        Strategy::Text => Box::new(TextStrategy),
    }
}

/// Parse once, then run both lookups. Blank or absent input short-circuits.
pub fn extract(strategy: &dyn ExtractionStrategy, html: Option<&str>) -> ExtractionResult {
    let Some(html) = html.filter(|h| !h.trim().is_empty()) else {
        debug!("No page content to extract from");
        return ExtractionResult::default();
    };

    let doc = Html::parse_document(html);
    let result = ExtractionResult {
        version: strategy.version(&doc),
        date: strategy.date(&doc),
    };
    info!(
        strategy = strategy.name(),
        version = ?result.version,
        date = ?result.date,
        "Extraction finished"
    );
    result
}

// ── Tests ──
