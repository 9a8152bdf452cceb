use std::future::Future;
use tokio::time::{Duration, Instant};
use tracing::{error, info};

pub mod airtable;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod soc;
pub mod subjects;
pub mod upload;

mod data;
mod error;
mod utils;

#[cfg(test)]
mod fakes;

pub use catalog::{Course, RawCell, RawRow, RowKind, Section, Subject};
pub use config::{Args, Config};
pub use crawler::{CrawlController, CrawlOptions, CrawlReport};
pub use data::{DryRunTable, RecordId, Table};
pub use error::{CrawlerError, RowError};
pub use upload::{UploadPipeline, UploadReport};

/// Elements whose presence marks a page as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    SearchForm,
    ResultsTable,
    NoResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Search,
    Page(u32),
}

/// Position reported by the pager, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current: u32,
    pub total: u32,
}

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What the crawl needs from whatever renders the catalog pages.
#[async_trait::async_trait]
pub trait Session: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), CrawlerError>;
    async fn probe(&mut self, landmark: Landmark) -> Result<bool, CrawlerError>;
    async fn subject_options(&mut self) -> Result<Vec<Subject>, CrawlerError>;
    async fn select_subject(&mut self, subject: &Subject) -> Result<(), CrawlerError>;
    async fn has_control(&mut self, control: Control) -> Result<bool, CrawlerError>;
    async fn click(&mut self, control: Control) -> Result<(), CrawlerError>;
    async fn rows(&mut self) -> Result<Vec<RawRow>, CrawlerError>;
    async fn page_info(&mut self) -> Result<Option<PageInfo>, CrawlerError>;

    /// Polls until one of `landmarks` is present, or returns `None` once
    /// `timeout` has passed.
    async fn wait_for(
        &mut self,
        landmarks: &[Landmark],
        timeout: Duration,
    ) -> Result<Option<Landmark>, CrawlerError> {
        let deadline = Instant::now() + timeout;
        loop {
            for &landmark in landmarks {
                if self.probe(landmark).await? {
                    return Ok(Some(landmark));
                }
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(left)).await;
        }
    }
}

/// Runs `fut` under `timeout`, mapping expiry to a navigation timeout.
pub(crate) async fn bounded<T, F>(what: &str, timeout: Duration, fut: F) -> Result<T, CrawlerError>
where
    F: Future<Output = Result<T, CrawlerError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CrawlerError::timeout(what, timeout)),
    }
}

/// Enumerates subjects and crawls them into the two tables.
pub async fn run_crawler<S, C, T>(
    session: S,
    courses: C,
    sections: T,
    config: &Config,
) -> CrawlReport
where
    S: Session,
    C: Table + Sync,
    T: Table + Sync,
{
    let options = CrawlOptions::from(config);
    let mut controller =
        CrawlController::new(session, UploadPipeline::new(courses, sections), options);

    let subjects = match subjects::enumerate(
        controller.session_mut(),
        &config.search_url,
        config.navigation_timeout,
        config.settle_timeout,
    )
    .await
    {
        Ok(subjects) => subjects::select(subjects, &config.subjects),
        Err(e) => {
            error!("Error getting subjects: {}", e);
            vec![]
        }
    };
    info!("Crawling {} subjects", subjects.len());

    controller.run(&subjects).await
}
