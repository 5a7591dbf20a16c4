use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::settings::{MarkerPair, Markers};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Written,
    Unchanged,
    /// Dry run: the file differs but was left alone.
    WouldWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Padding {
    /// `<start> value <end>`
    Spaced,
    /// `<start> value<end>`
    Leading,
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Pure text transform behind `update_file`.
///
/// The version fills both the version and compat regions; the date region is
/// always rewritten, with today's date when `date` is `None`.
pub fn render(
    text: &str,
    markers: &Markers,
    version: Option<&str>,
    date: Option<&str>,
) -> String {
    let mut out = text.to_string();
    if let Some(v) = version {
        out = replace_region(&out, "version", &markers.version, v, Padding::Spaced);
        out = replace_region(&out, "compat", &markers.compat, v, Padding::Leading);
    }
    let date = match date {
        Some(d) => d.to_string(),
        None => {
            let d = today();
            info!("No date extracted, using today ({})", d);
            d
        }
    };
    replace_region(&out, "date", &markers.date, &date, Padding::Spaced)
}

/// Swap the text between every start/end pair, pairing each start with the nearest end after it.
fn replace_region(
    text: &str,
    name: &str,
    pair: &MarkerPair,
    value: &str,
    padding: Padding,
) -> String {
    if pair.start.is_empty() || pair.end.is_empty() {
        warn!("Region {} has an empty sentinel, skipping", name);
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + value.len());
    let mut rest = text;
    let mut hits = 0usize;

    while let Some(s) = rest.find(&pair.start) {
        let body = s + pair.start.len();
        let Some(e) = rest[body..].find(&pair.end) else {
            break;
        };
        out.push_str(&rest[..body]);
        match padding {
            Padding::Spaced => {
                out.push(' ');
                out.push_str(value);
                out.push(' ');
            }
            Padding::Leading => {
                out.push(' ');
                out.push_str(value);
            }
        }
        out.push_str(&pair.end);
        rest = &rest[body + e + pair.end.len()..];
        hits += 1;
    }
    out.push_str(rest);

    if hits == 0 {
        warn!("Markers for region {} not found ({} ... {})", name, pair.start, pair.end);
    } else {
        debug!(region = name, hits, "Region replaced");
    }
    out
}

/// Rewrite the marker regions of `path` in place. Never creates the file and
/// never writes when nothing changed.
pub fn update_file(
    path: &Path,
    markers: &Markers,
    version: Option<&str>,
    date: Option<&str>,
    dry_run: bool,
) -> Result<UpdateOutcome, UpdateError> {
    let original = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => UpdateError::NotFound {
            path: path.to_path_buf(),
        },
        _ => UpdateError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let updated = render(&original, markers, version, date);
    if updated == original {
        info!("{} already up to date", path.display());
        return Ok(UpdateOutcome::Unchanged);
    }
    if dry_run {
        info!("{} would change (dry run)", path.display());
        return Ok(UpdateOutcome::WouldWrite);
    }

    std::fs::write(path, updated).map_err(|e| UpdateError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Wrote {}", path.display());
    Ok(UpdateOutcome::Written)
}
