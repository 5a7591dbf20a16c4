mod fetcher;
mod parser;
mod settings;
mod updater;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use fetcher::Fetcher;
use settings::{Settings, Strategy};
use updater::UpdateOutcome;

#[derive(Parser)]
#[command(
    name = "mumu_sync",
    about = "Sync the MuMu version and update date from the download page into README markers"
)]
struct Cli {
    /// Config file (default: ./mumu_sync.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Download page to scrape
    #[arg(long, global = true)]
    url: Option<String>,
    /// Document holding the marker regions
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,
    /// Extraction strategy
    #[arg(short, long, global = true, value_enum)]
    strategy: Option<Strategy>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and update the document (default)
    Run {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch (or read) a page and print what was extracted
    Extract {
        /// Local HTML snapshot instead of fetching
        #[arg(long)]
        html: Option<PathBuf>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the given values into the document without scraping
    Apply {
        /// Version string, e.g. V4.2.0
        #[arg(long)]
        version: Option<String>,
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let result = match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => {
            run(&settings, dry_run).await;
            Ok(())
        }
        Commands::Extract { html, json } => {
            let page = match html {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => fetch_page(&settings).await,
            };
            let strategy = parser::strategy_for(&settings);
            let r = parser::extract(strategy.as_ref(), page.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("Version: {}", r.version.as_deref().unwrap_or("-"));
                println!("Date:    {}", r.date.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
        Commands::Apply {
            version,
            date,
            dry_run,
        } => {
            if let Some(d) = date.as_deref() {
                if !parser::patterns::is_calendar_date(d) {
                    bail!("--date must be a YYYY-MM-DD calendar date, got {:?}", d);
                }
            }
            apply(&settings, version.as_deref(), date.as_deref(), dry_run);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = settings::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        settings.url = url.clone();
    }
    if let Some(file) = &cli.file {
        settings.target_file = file.clone();
    }
    if let Some(strategy) = cli.strategy {
        settings.strategy = strategy;
    }
    if let Some(secs) = cli.timeout {
        settings.timeout_secs = secs;
    }
    settings.validate()?;
    Ok(settings)
}

/// Fetch → extract → update. Every failure past configuration is reported
/// and the run still ends normally.
async fn run(settings: &Settings, dry_run: bool) -> Option<UpdateOutcome> {
    let page = fetch_page(settings).await;

    if page.is_none() && !settings.date_on_fetch_failure {
        println!(
            "Nothing fetched; leaving {} untouched.",
            settings.target_file.display()
        );
        return None;
    }

    let strategy = parser::strategy_for(settings);
    let r = parser::extract(strategy.as_ref(), page.as_deref());
    match &r.version {
        Some(v) => println!("Version: {}", v),
        None => println!("Version: not found, version regions left as they are"),
    }
    match &r.date {
        Some(d) => println!("Date:    {}", d),
        None => println!("Date:    not found, using today"),
    }

    apply(settings, r.version.as_deref(), r.date.as_deref(), dry_run)
}

async fn fetch_page(settings: &Settings) -> Option<String> {
    let fetched = match Fetcher::new(settings) {
        Ok(f) => f.fetch().await,
        Err(e) => Err(e),
    };
    match fetched {
        Ok(body) => Some(body),
        Err(e) => {
            warn!("Fetch failed: {}", e);
            println!("Could not fetch the download page: {}", e);
            None
        }
    }
}

/// `None` when the document could not be read or written.
fn apply(
    settings: &Settings,
    version: Option<&str>,
    date: Option<&str>,
    dry_run: bool,
) -> Option<UpdateOutcome> {
    let path: &Path = &settings.target_file;
    let outcome = match updater::update_file(path, &settings.markers, version, date, dry_run) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Update failed: {}", e);
            println!("{} not updated: {}", path.display(), e);
            return None;
        }
    };
    match outcome {
        UpdateOutcome::Written => println!("Updated {}", path.display()),
        UpdateOutcome::Unchanged => {
            println!("{} is already up to date, nothing written.", path.display())
        }
        UpdateOutcome::WouldWrite => {
            println!("{} would change (dry run, nothing written).", path.display())
        }
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline(dir: &Path) -> Settings {
        Settings {
            url: "not a url".to_string(),
            target_file: dir.join("README.md"),
            ..Settings::default()
        }
    }

    #[test]
    fn missing_document_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = offline(dir.path());
        assert_eq!(apply(&settings, Some("V4.2.0"), None, false), None);
        assert!(!settings.target_file.exists());
    }

    #[tokio::test]
    async fn failed_fetch_still_stamps_today() {
        let dir = tempfile::tempdir().unwrap();
        let settings = offline(dir.path());
        let doc = "<!-- MUMU_VERSION_START --> V4.1.0 <!-- MUMU_VERSION_END -->\n\
            <!-- MUMU_UPDATE_DATE_START --> 2020-01-01 <!-- MUMU_UPDATE_DATE_END -->\n";
        std::fs::write(&settings.target_file, doc).unwrap();

        assert_eq!(run(&settings, false).await, Some(UpdateOutcome::Written));
        let out = std::fs::read_to_string(&settings.target_file).unwrap();
        assert!(out.contains("--> V4.1.0 <!--"));
        assert!(out.contains(&format!("--> {} <!--", updater::today())));
    }

    #[tokio::test]
    async fn failed_fetch_can_leave_document_alone() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            date_on_fetch_failure: false,
            ..offline(dir.path())
        };
        let doc = "<!-- MUMU_UPDATE_DATE_START --> 2020-01-01 <!-- MUMU_UPDATE_DATE_END -->";
        std::fs::write(&settings.target_file, doc).unwrap();

        assert_eq!(run(&settings, false).await, None);
        assert_eq!(std::fs::read_to_string(&settings.target_file).unwrap(), doc);
    }

    #[tokio::test]
    async fn missing_document_after_failed_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let settings = offline(dir.path());
        assert_eq!(run(&settings, false).await, None);
        assert!(!settings.target_file.exists());
    }
}
