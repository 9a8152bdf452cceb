use crate::{bounded, catalog::Subject, CrawlerError, Landmark, Session};
use itertools::Itertools;
use std::time::Duration;
use tracing::{info, warn};

/// Loads the search form and lists the subjects it offers, in form order.
pub async fn enumerate<S: Session>(
    session: &mut S,
    search_url: &str,
    navigation_timeout: Duration,
    settle_timeout: Duration,
) -> Result<Vec<Subject>, CrawlerError> {
    bounded(
        "search form",
        navigation_timeout,
        session.navigate(search_url),
    )
    .await?;
    session
        .wait_for(&[Landmark::SearchForm], settle_timeout)
        .await?
        .ok_or_else(|| CrawlerError::timeout("subject list", settle_timeout))?;

    let subjects: Vec<Subject> = session
        .subject_options()
        .await?
        .into_iter()
        .filter(|s| !s.code.trim().is_empty())
        .unique_by(|s| s.code.clone())
        .collect();

    info!("Found {} subjects", subjects.len());
    Ok(subjects)
}

/// Narrows `subjects` to the codes in `only`. An empty `only` keeps all.
pub fn select(subjects: Vec<Subject>, only: &[String]) -> Vec<Subject> {
    if only.is_empty() {
        return subjects;
    }

    for code in only {
        if !subjects.iter().any(|s| s.code.eq_ignore_ascii_case(code)) {
            warn!("Subject {} is not offered, ignoring", code);
        }
    }

    subjects
        .into_iter()
        .filter(|s| only.iter().any(|code| s.code.eq_ignore_ascii_case(code)))
        .collect()
}
