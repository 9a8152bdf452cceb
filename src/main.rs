use clap::Parser;
use soc_crawler::airtable::AirtableTable;
use soc_crawler::soc::HttpSession;
use soc_crawler::{run_crawler, Args, Config, CrawlReport, DryRunTable};
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let config = Config::from_args(Args::parse())?;
    let session = HttpSession::new(
        &config.search_url,
        config.term.clone(),
        config.navigation_timeout,
        config.request_delay,
    )?;

    let report = match &config.airtable {
        Some(airtable) => {
            let (courses, sections) = AirtableTable::pair(airtable, config.request_timeout)?;
            info!("Uploading to {} and {}", courses.url(), sections.url());
            run_crawler(session, courses, sections, &config).await
        }
        None => {
            warn!("Dry run, nothing will be written to Airtable");
            run_crawler(
                session,
                DryRunTable::new("courses"),
                DryRunTable::new("sections"),
                &config,
            )
            .await
        }
    };

    summarize(&report);
    Ok(())
}

fn summarize(report: &CrawlReport) {
    if let (Some(start), Some(end)) = (report.started_at, report.finished_at) {
        info!("Crawl took {}s", (end - start).num_seconds());
    }
    if !report.subjects_failed.is_empty() {
        warn!("Failed subjects: {}", report.subjects_failed.join(", "));
    }
    let upload = &report.upload;
    if upload.course_failures + upload.section_failures > 0 {
        warn!(
            "{} courses and {} sections could not be created",
            upload.course_failures, upload.section_failures
        );
    }
}
