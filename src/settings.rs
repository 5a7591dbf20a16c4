use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

const DEFAULT_URL: &str = "https://mumu.163.com/download/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_CONFIG_NAME: &str = "mumu_sync";
const ENV_PREFIX: &str = "MUMU_SYNC";

/// XPath `/html/body/div[2]/div/section/div[1]/a/div[2]/div[2]/div[4]/font/font`.
const DEFAULT_VERSION_SELECTOR: &str = "html > body > div:nth-of-type(2) > div > section \
     > div:nth-of-type(1) > a > div:nth-of-type(2) > div:nth-of-type(2) \
     > div:nth-of-type(4) > font > font";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fixed element path first, text scan as fallback
    Structural,
    /// Text scan only
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPair {
    pub start: String,
    pub end: String,
}

impl MarkerPair {
    fn new(name: &str) -> Self {
        Self {
            start: format!("<!-- MUMU_{}_START -->", name),
            end: format!("<!-- MUMU_{}_END -->", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub version: MarkerPair,
    pub compat: MarkerPair,
    pub date: MarkerPair,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            version: MarkerPair::new("VERSION"),
            compat: MarkerPair::new("COMPATIBLE_VERSION"),
            date: MarkerPair::new("UPDATE_DATE"),
        }
    }
}

/// Everything a run needs. Built once in `main`, then only borrowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub target_file: PathBuf,
    pub strategy: Strategy,
    pub version_selector: String,
    pub markers: Markers,
    /// Stamp today's date even when the page could not be fetched.
    pub date_on_fetch_failure: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            target_file: PathBuf::from("README.md"),
            strategy: Strategy::Structural,
            version_selector: DEFAULT_VERSION_SELECTOR.to_string(),
            markers: Markers::default(),
            date_on_fetch_failure: true,
        }
    }
}

/// Layer defaults, an optional TOML file and `MUMU_SYNC_*` variables.
///
/// An explicit `path` must exist; the implicit `mumu_sync.toml` is optional.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let settings: Settings = Config::builder()
        .add_source(Config::try_from(&Settings::default())?)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("url must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        for (name, pair) in [
            ("version", &self.markers.version),
            ("compat", &self.markers.compat),
            ("date", &self.markers.date),
        ] {
            if pair.start.is_empty() || pair.end.is_empty() {
                bail!("markers.{} needs both a start and an end sentinel", name);
            }
            if pair.start == pair.end {
                bail!("markers.{}: start and end sentinels must differ", name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.timeout_secs, 10);
        assert_eq!(s.markers.version.start, "<!-- MUMU_VERSION_START -->");
        assert_eq!(s.markers.compat.start, "<!-- MUMU_COMPATIBLE_VERSION_START -->");
        assert_eq!(s.markers.compat.end, "<!-- MUMU_COMPATIBLE_VERSION_END -->");
        assert_eq!(s.markers.date.start, "<!-- MUMU_UPDATE_DATE_START -->");
        assert_eq!(s.markers.date.end, "<!-- MUMU_UPDATE_DATE_END -->");
    }

    #[test]
    fn defaults_target_the_download_page() {
        let s = Settings::default();
        assert_eq!(s.url, "https://mumu.163.com/download/");
        assert!(s.user_agent.contains("Windows NT 10.0") && s.user_agent.contains("Chrome/91"));
        assert!(scraper::Selector::parse(&s.version_selector).is_ok());
        assert!(s.version_selector.ends_with("div:nth-of-type(4) > font > font"));
    }

    #[test]
    fn file_overrides_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(
            &path,
            r#"
url = "https://example.com/download"
strategy = "text"
timeout_secs = 3

[markers.version]
start = "<!-- V_START -->"
"#,
        )
        .unwrap();

        let s = load(Some(path.as_path())).unwrap();
        assert_eq!(s.url, "https://example.com/download");
        assert_eq!(s.strategy, Strategy::Text);
        assert_eq!(s.timeout_secs, 3);
        assert_eq!(s.markers.version.start, "<!-- V_START -->");
        // untouched keys keep their defaults
        assert_eq!(s.markers.version.end, "<!-- MUMU_VERSION_END -->");
        assert_eq!(s.markers.compat, Markers::default().compat);
        assert!(s.date_on_fetch_failure);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let s = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_identical_sentinels() {
        let mut s = Settings::default();
        s.markers.compat.end = s.markers.compat.start.clone();
        assert!(s.validate().is_err());
    }
}
