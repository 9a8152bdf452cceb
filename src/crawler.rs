use crate::{
    bounded,
    catalog::{self, Subject, TableParser},
    utils::get_now,
    Config, Control, CrawlerError, Landmark, Session, Table, UploadPipeline, UploadReport,
};
use chrono::{DateTime, FixedOffset};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub search_url: String,
    pub navigation_timeout: Duration,
    pub settle_timeout: Duration,
    pub max_pages: Option<u32>,
}

impl From<&Config> for CrawlOptions {
    fn from(config: &Config) -> Self {
        CrawlOptions {
            search_url: config.search_url.clone(),
            navigation_timeout: config.navigation_timeout,
            settle_timeout: config.settle_timeout,
            max_pages: config.max_pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectOutcome {
    Crawled { pages: u32 },
    NoResults,
}

#[derive(Debug, Default, Clone)]
pub struct CrawlReport {
    pub started_at: Option<DateTime<FixedOffset>>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    pub subjects_crawled: usize,
    pub subjects_empty: usize,
    pub subjects_failed: Vec<String>,
    pub pages: usize,
    pub courses_parsed: usize,
    pub courses_kept: usize,
    pub upload: UploadReport,
}

/// Drives the search form subject by subject, one page at a time.
pub struct CrawlController<S, C, T> {
    session: S,
    parser: TableParser,
    pipeline: UploadPipeline<C, T>,
    options: CrawlOptions,
}

impl<S, C, T> CrawlController<S, C, T>
where
    S: Session,
    C: Table + Sync,
    T: Table + Sync,
{
    pub fn new(session: S, pipeline: UploadPipeline<C, T>, options: CrawlOptions) -> Self {
        CrawlController {
            session,
            parser: TableParser::default(),
            pipeline,
            options,
        }
    }

    pub fn with_parser(mut self, parser: TableParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Crawls `subjects` in order. A failing subject is logged and skipped.
    pub async fn run(&mut self, subjects: &[Subject]) -> CrawlReport {
        let mut report = CrawlReport {
            started_at: Some(get_now()),
            ..Default::default()
        };

        for (i, subject) in subjects.iter().enumerate() {
            info!(
                "Processing subject {} of {}: {}",
                i + 1,
                subjects.len(),
                subject
            );
            match self.crawl_subject(subject, &mut report).await {
                Ok(SubjectOutcome::Crawled { pages }) => {
                    info!("Finished {} after {} pages", subject.code, pages);
                    report.subjects_crawled += 1;
                }
                Ok(SubjectOutcome::NoResults) => {
                    info!("No results found for {}", subject.code);
                    report.subjects_empty += 1;
                }
                Err(e) => {
                    error!("Skipping subject {}: {}", subject.code, e);
                    report.subjects_failed.push(subject.code.clone());
                }
            }
        }

        report.finished_at = Some(get_now());
        info!(
            "Finished processing all subjects: {} crawled, {} empty, {} failed, {} pages, {}/{} courses kept, {} courses and {} sections created",
            report.subjects_crawled,
            report.subjects_empty,
            report.subjects_failed.len(),
            report.pages,
            report.courses_kept,
            report.courses_parsed,
            report.upload.courses_created,
            report.upload.sections_created,
        );
        report
    }

    async fn crawl_subject(
        &mut self,
        subject: &Subject,
        report: &mut CrawlReport,
    ) -> Result<SubjectOutcome, CrawlerError> {
        let nav = self.options.navigation_timeout;
        let settle = self.options.settle_timeout;

        bounded(
            "search form",
            nav,
            self.session.navigate(&self.options.search_url),
        )
        .await?;
        self.session
            .wait_for(&[Landmark::SearchForm], settle)
            .await?
            .ok_or_else(|| CrawlerError::timeout("search form", settle))?;

        self.session.select_subject(subject).await?;
        debug!("Selected subject: {}", subject);
        bounded("search results", nav, self.session.click(Control::Search)).await?;

        let landmark = self
            .session
            .wait_for(&[Landmark::ResultsTable, Landmark::NoResults], settle)
            .await?
            .ok_or_else(|| CrawlerError::timeout("results table", settle))?;
        if landmark == Landmark::NoResults {
            return Ok(SubjectOutcome::NoResults);
        }

        let mut pages = 0;
        loop {
            let rows = self.session.rows().await?;
            let parsed = self.parser.parse(&rows, &subject.code);
            let parsed_count = parsed.len();
            let courses = catalog::filter(parsed);
            pages += 1;

            debug!(
                "{} page {}: {} rows, {} courses, {} kept",
                subject.code,
                pages,
                rows.len(),
                parsed_count,
                courses.len()
            );
            report.pages += 1;
            report.courses_parsed += parsed_count;
            report.courses_kept += courses.len();
            report.upload += self.pipeline.upload(&courses).await;

            let next = match self.next_page(pages).await? {
                Some(next) => next,
                None => break,
            };

            bounded(
                "next page",
                nav,
                self.session.click(Control::Page(next)),
            )
            .await?;
            self.session
                .wait_for(&[Landmark::ResultsTable], settle)
                .await?
                .ok_or_else(|| CrawlerError::timeout(format!("page {}", next), settle))?;

            if let Some(info) = self.session.page_info().await? {
                if info.current != next {
                    return Err(CrawlerError::UnexpectedPage(format!(
                        "asked for page {} but got page {}",
                        next, info.current
                    )));
                }
            }
        }

        Ok(SubjectOutcome::Crawled { pages })
    }

    /// Page to visit after `pages_done` pages, if the pager offers one.
    async fn next_page(&mut self, pages_done: u32) -> Result<Option<u32>, CrawlerError> {
        if let Some(max) = self.options.max_pages {
            if pages_done >= max {
                info!("Stopping after {} pages", max);
                return Ok(None);
            }
        }

        let info = match self.session.page_info().await? {
            Some(info) => info,
            None => {
                debug!("No page indicator, treating as last page");
                return Ok(None);
            }
        };
        info!("On page {} of {}", info.current, info.total);
        if info.current >= info.total {
            return Ok(None);
        }

        let next = info.current + 1;
        if !self.session.has_control(Control::Page(next)).await? {
            warn!("Could not find link to page {}", next);
            return Ok(None);
        }
        Ok(Some(next))
    }
}
