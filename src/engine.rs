use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::classify::{classify, Classification};
use crate::config::RunConfig;
use crate::db::{self, StoreOutcome};
use crate::export;
use crate::extract::cast::extract_cast;
use crate::extract::detail::extract_detail;
use crate::extract::listing::discover_title_urls;
use crate::extract::userlist::extract_user_ratings;
use crate::extract::ExtractError;
use crate::normalize::normalize;
use crate::page::RawPage;
use crate::record::{CorrelationState, Record, UserRating};

const CONCURRENCY: usize = 10;
const CHANNEL_DEPTH: usize = CONCURRENCY * 2;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const FETCH_TIMEOUT_SECS: u64 = 30;

/// One HTTP fetch failed for good (transient failures only count once the
/// retries are exhausted).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    fn transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => matches!(*status, 429 | 500 | 502 | 503),
            FetchError::Transport(e) => e.is_timeout() || e.is_connect(),
        }
    }
}

/// Page-fetch collaborator. Owns the HTTP client and the request-concurrency
/// bound; the extraction pipeline only ever sees the bodies it returns.
pub struct CrawlEngine {
    client: reqwest::Client,
    semaphore: Semaphore,
}

impl CrawlEngine {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            semaphore: Semaphore::new(CONCURRENCY),
        })
    }

    /// Fetch one URL, retrying transient failures with exponential backoff.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore never closes");
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.transient() && attempt < MAX_RETRIES => {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(
                        url,
                        attempt = attempt + 1,
                        "transient fetch failure ({e}), backing off {:.1}s",
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// Terminal outcome of one title's two-phase fetch-and-extract chain.
enum EntityOutcome {
    Completed(Record),
    Skipped { url: String, reason: String },
    ExtractFailed { url: String, error: ExtractError },
    FetchFailed { url: String, error: FetchError },
}

/// Detail page → classify → extract → cast page → merge. The parsed page
/// handles never cross an await; only owned strings and the correlation
/// state thread through the two fetches.
async fn process_entity(engine: &CrawlEngine, url: String) -> EntityOutcome {
    let detail_html = match engine.fetch(&url).await {
        Ok(body) => body,
        Err(error) => return EntityOutcome::FetchFailed { url, error },
    };

    let state = {
        let page = RawPage::parse(&detail_html);
        match classify(&page) {
            Classification::OutOfScope(reason) => {
                return EntityOutcome::Skipped { url, reason }
            }
            Classification::InScope => match extract_detail(&page, &url) {
                Ok(partial) => CorrelationState::new(partial),
                Err(error) => return EntityOutcome::ExtractFailed { url, error },
            },
        }
    };
    drop(detail_html);

    let cast_html = match engine.fetch(state.cast_url()).await {
        Ok(body) => body,
        Err(error) => return EntityOutcome::FetchFailed { url, error },
    };

    let cast = {
        let page = RawPage::parse(&cast_html);
        extract_cast(&page)
    };
    EntityOutcome::Completed(state.complete(cast))
}

/// Per-run counters, printed at the end of every crawl.
#[derive(Debug, Default)]
pub struct RunStats {
    pub discovered: usize,
    pub completed: usize,
    pub skipped: usize,
    pub extract_failed: usize,
    pub fetch_failed: usize,
    pub stored: usize,
    pub store_failed: usize,
}

impl RunStats {
    pub fn print(&self) {
        println!("Discovered: {}", self.discovered);
        println!("Completed:  {}", self.completed);
        println!("Skipped:    {}", self.skipped);
        println!(
            "Dropped:    {} extraction, {} fetch",
            self.extract_failed, self.fetch_failed
        );
        println!("Stored:     {} ({} failed)", self.stored, self.store_failed);
    }
}

/// Crawl the top-shows index, extract every in-scope title, and stream
/// completed records into the sink and/or the JSON export buffer.
///
/// The connection is owned by this single receive loop; spawned tasks only
/// ever talk to it through the channel, which keeps all sink calls
/// serialized. Each store commits its own unit of work, so stopping the run
/// mid-flight loses at most the records still in tasks, never half a row.
pub async fn run_crawl(cfg: &RunConfig, conn: Option<&rusqlite::Connection>) -> Result<RunStats> {
    let engine = Arc::new(CrawlEngine::new(&cfg.user_agent)?);
    let mut stats = RunStats::default();

    // Phase 1: walk the index pages and collect detail URLs.
    let mut urls = Vec::new();
    for page_no in 1..=cfg.pages {
        let index_url = format!("{}/shows/top?page={}", cfg.base_url, page_no);
        match engine.fetch(&index_url).await {
            Ok(body) => {
                let found = {
                    let page = RawPage::parse(&body);
                    discover_title_urls(&page, &cfg.base_url)
                };
                debug!(page = page_no, count = found.len(), "index page discovered");
                urls.extend(found);
            }
            Err(e) => warn!(url = %index_url, "index page fetch failed: {e}"),
        }
    }
    stats.discovered = urls.len();
    info!(
        "Discovered {} detail pages across {} index pages",
        urls.len(),
        cfg.pages
    );

    // Phase 2: one task per title; both dependent fetches and all extraction
    // happen inside the task, results stream back here.
    let (tx, mut rx) = mpsc::channel::<EntityOutcome>(CHANNEL_DEPTH);
    for url in urls {
        let engine = Arc::clone(&engine);
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(process_entity(&engine, url).await).await;
        });
    }
    // rx closes once every task has reported
    drop(tx);

    let pb = ProgressBar::new(stats.discovered as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut records: Vec<Record> = Vec::new();
    while let Some(outcome) = rx.recv().await {
        match outcome {
            EntityOutcome::Completed(record) => {
                stats.completed += 1;
                if cfg.json_out.is_some() {
                    records.push(record.clone());
                }
                if let Some(conn) = conn {
                    match db::store(conn, &normalize(record)) {
                        StoreOutcome::Committed => stats.stored += 1,
                        StoreOutcome::Failed(reason) => {
                            warn!(reason = %reason, "record insert failed");
                            stats.store_failed += 1;
                        }
                    }
                }
            }
            EntityOutcome::Skipped { url, reason } => {
                debug!(url = %url, reason = %reason, "page out of scope");
                stats.skipped += 1;
            }
            EntityOutcome::ExtractFailed { url, error } => {
                warn!(url = %url, "dropping title: {error}");
                stats.extract_failed += 1;
            }
            EntityOutcome::FetchFailed { url, error } => {
                warn!(url = %url, "dropping title: {error}");
                stats.fetch_failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Some(path) = &cfg.json_out {
        export::write_json(path, &records)?;
        info!("Wrote {} records to {}", records.len(), path.display());
    }

    Ok(stats)
}

/// Scrape each user's completed list. Single-phase: no cast page and no
/// correlation state involved.
pub async fn run_user_lists(
    cfg: &RunConfig,
    users: &[String],
    conn: Option<&rusqlite::Connection>,
) -> Result<Vec<UserRating>> {
    let engine = CrawlEngine::new(&cfg.user_agent)?;
    let mut all = Vec::new();

    for user in users {
        let url = format!("{}/dramalist/{}/completed", cfg.base_url, user);
        match engine.fetch(&url).await {
            Ok(body) => {
                let ratings = {
                    let page = RawPage::parse(&body);
                    extract_user_ratings(&page, user)
                };
                info!(user = %user, count = ratings.len(), "user list scraped");
                all.extend(ratings);
            }
            Err(e) => warn!(user = %user, "user list fetch failed: {e}"),
        }
    }

    if let Some(conn) = conn {
        let inserted = db::insert_user_ratings(conn, &all)?;
        info!("Inserted {} user ratings", inserted);
    }
    if let Some(path) = &cfg.json_out {
        export::write_json(path, &all)?;
        info!("Wrote {} ratings to {}", all.len(), path.display());
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        for status in [429, 500, 502, 503] {
            let e = FetchError::Status {
                status,
                url: "https://example.com".into(),
            };
            assert!(e.transient(), "HTTP {status} should be retried");
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for status in [400, 403, 404] {
            let e = FetchError::Status {
                status,
                url: "https://example.com".into(),
            };
            assert!(!e.transient(), "HTTP {status} should not be retried");
        }
    }
}
