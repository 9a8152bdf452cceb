//! Schedule of Classes session over plain HTTP.

pub mod html;

use crate::{catalog::Subject, Control, CrawlerError, Landmark, PageInfo, RawRow, Session};
use tokio::time::{Duration, Instant};
use tracing::debug;

pub const SEARCH_URL: &str = "https://act.ucsd.edu/scheduleOfClasses/scheduleOfClassesStudent.htm";
const RESULT_PAGE: &str = "scheduleOfClassesStudentResult.htm";
const USER_AGENT: &str = concat!("soc-crawler/", env!("CARGO_PKG_VERSION"));

/// Holds the last fetched document; every request replaces it.
pub struct HttpSession {
    client: reqwest::Client,
    result_url: String,
    term: Option<String>,
    request_delay: Duration,
    last_request: Option<Instant>,
    document: String,
    selected: Option<(Subject, String)>,
}

impl HttpSession {
    pub fn new(
        search_url: &str,
        term: Option<String>,
        timeout: Duration,
        request_delay: Duration,
    ) -> Result<Self, CrawlerError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        let base = search_url
            .rsplit_once('/')
            .map_or(search_url, |(base, _)| base);

        Ok(HttpSession {
            client,
            result_url: format!("{}/{}", base, RESULT_PAGE),
            term,
            request_delay,
            last_request: None,
            document: String::new(),
            selected: None,
        })
    }

    async fn throttle(&mut self) {
        let now = Instant::now();
        if let Some(last_request) = self.last_request {
            let elapsed = now.duration_since(last_request);
            if elapsed < self.request_delay {
                tokio::time::sleep(self.request_delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    async fn load(&mut self, request: reqwest::RequestBuilder) -> Result<(), CrawlerError> {
        self.throttle().await;
        let response = request.send().await?.error_for_status()?;
        debug!("Loaded {}", response.url());
        self.document = response.text().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Session for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), CrawlerError> {
        self.selected = None;
        let request = self.client.get(url);
        self.load(request).await
    }

    async fn probe(&mut self, landmark: Landmark) -> Result<bool, CrawlerError> {
        Ok(html::has_landmark(&self.document, landmark))
    }

    async fn subject_options(&mut self) -> Result<Vec<Subject>, CrawlerError> {
        Ok(html::subjects(&self.document))
    }

    async fn select_subject(&mut self, subject: &Subject) -> Result<(), CrawlerError> {
        if !html::has_landmark(&self.document, Landmark::SearchForm) {
            return Err(CrawlerError::UnexpectedPage(
                "subject list is not on the current page".to_string(),
            ));
        }
        let term = self
            .term
            .clone()
            .or_else(|| html::selected_term(&self.document))
            .ok_or_else(|| CrawlerError::UnexpectedPage("no term on the search form".to_string()))?;
        self.selected = Some((subject.clone(), term));
        Ok(())
    }

    async fn has_control(&mut self, control: Control) -> Result<bool, CrawlerError> {
        Ok(match control {
            Control::Search => self.selected.is_some(),
            Control::Page(n) => html::has_page_link(&self.document, n),
        })
    }

    async fn click(&mut self, control: Control) -> Result<(), CrawlerError> {
        let request = match control {
            Control::Search => {
                let (subject, term) = self.selected.as_ref().ok_or_else(|| {
                    CrawlerError::UnexpectedPage("search submitted without a subject".to_string())
                })?;
                debug!("Searching {} in {}", subject.code, term);
                self.client.post(&self.result_url).form(&[
                    ("selectedTerm", term.as_str()),
                    ("xsoc_term", ""),
                    ("loggedIn", "false"),
                    ("tabNum", "tabs-sub"),
                    ("selectedSubjects", subject.code.as_str()),
                    ("_selectedSubjects", "1"),
                    ("schedOption1", "true"),
                    ("_schedOption1", "on"),
                    ("schedOption2", "true"),
                    ("_schedOption2", "on"),
                ])
            }
            Control::Page(n) => self
                .client
                .get(&self.result_url)
                .query(&[("page", n.to_string())]),
        };
        self.load(request).await
    }

    async fn rows(&mut self) -> Result<Vec<RawRow>, CrawlerError> {
        Ok(html::rows(&self.document))
    }

    async fn page_info(&mut self) -> Result<Option<PageInfo>, CrawlerError> {
        Ok(html::page_info(&self.document))
    }

    /// A fetched document never changes, so one look is enough.
    async fn wait_for(
        &mut self,
        landmarks: &[Landmark],
        _timeout: Duration,
    ) -> Result<Option<Landmark>, CrawlerError> {
        Ok(landmarks
            .iter()
            .copied()
            .find(|&l| html::has_landmark(&self.document, l)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn session() -> HttpSession {
        HttpSession::new(
            SEARCH_URL,
            None,
            Duration::from_secs(1),
            Duration::from_millis(0),
        )
        .unwrap()
    }

    #[test]
    fn result_page_sits_beside_search_form() {
        assert_eq!(
            session().result_url,
            "https://act.ucsd.edu/scheduleOfClasses/scheduleOfClassesStudentResult.htm"
        );
    }

    #[tokio::test]
    async fn selection_takes_term_from_form() {
        let mut s = session();
        let subject = Subject {
            code: "CSE".to_string(),
            label: "CSE - Computer Science & Engineering".to_string(),
        };
        assert!(s.select_subject(&subject).await.is_err());

        s.document = fs::read_to_string("tests/htmls/search.html").expect("Invalid file path");
        s.select_subject(&subject).await.unwrap();
        assert!(s.has_control(Control::Search).await.unwrap());
        assert_eq!(s.selected.as_ref().map(|(_, t)| t.as_str()), Some("WI25"));
        assert_eq!(
            s.wait_for(&[Landmark::ResultsTable, Landmark::SearchForm], Duration::ZERO)
                .await
                .unwrap(),
            Some(Landmark::SearchForm)
        );
    }
}
