use crate::{
    catalog::Subject, soc::html, Control, CrawlerError, Landmark, PageInfo, RawRow, RecordId,
    Session, Table,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use tokio::time::Duration;

/// Keeps every accepted record; rejects records whose `key` equals `value`.
pub struct RecordingTable {
    name: String,
    reject: Option<(String, Value)>,
    attempts: Mutex<usize>,
    records: Mutex<Vec<Value>>,
}

impl RecordingTable {
    pub fn new(name: &str) -> Self {
        RecordingTable {
            name: name.to_string(),
            reject: None,
            attempts: Mutex::new(0),
            records: Mutex::new(vec![]),
        }
    }

    pub fn failing_on(name: &str, key: &str, value: &str) -> Self {
        RecordingTable {
            reject: Some((key.to_string(), Value::from(value))),
            ..RecordingTable::new(name)
        }
    }

    pub fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Table for RecordingTable {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    async fn create<R: Serialize + Sync>(&self, record: &R) -> Result<RecordId, CrawlerError> {
        let value = serde_json::to_value(record)?;
        *self.attempts.lock().unwrap() += 1;
        if let Some((key, rejected)) = &self.reject {
            if value.get(key) == Some(rejected) {
                return Err(CrawlerError::RemoteCreate {
                    table: self.name.clone(),
                    status: 422,
                    body: "INVALID_VALUE_FOR_COLUMN".to_string(),
                });
            }
        }
        let mut records = self.records.lock().unwrap();
        records.push(value);
        Ok(format!("{}{}", self.name, records.len()))
    }
}

pub fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/htmls/{}", name)).expect("Invalid file path")
}

/// How the catalog answers a search for one subject.
pub enum Listing {
    Pages(Vec<String>),
    /// Search succeeds but the page never shows results or the empty notice.
    Blank,
    /// Search request takes this long to come back.
    Slow(Duration),
    Broken,
}

/// Serves canned documents through the real markup extraction.
pub struct FakeSession {
    pub search_form: String,
    pub listings: HashMap<String, Listing>,
    pub document: String,
    pub selected: Option<String>,
    pub clicks: Vec<Control>,
    pub navigations: usize,
}

impl FakeSession {
    pub fn new(listings: Vec<(&str, Listing)>) -> Self {
        FakeSession {
            search_form: fixture("search.html"),
            listings: listings
                .into_iter()
                .map(|(code, listing)| (code.to_string(), listing))
                .collect(),
            document: String::new(),
            selected: None,
            clicks: vec![],
            navigations: 0,
        }
    }
}

#[async_trait::async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), CrawlerError> {
        self.navigations += 1;
        self.selected = None;
        self.document = self.search_form.clone();
        Ok(())
    }

    async fn probe(&mut self, landmark: Landmark) -> Result<bool, CrawlerError> {
        Ok(html::has_landmark(&self.document, landmark))
    }

    async fn subject_options(&mut self) -> Result<Vec<Subject>, CrawlerError> {
        Ok(html::subjects(&self.document))
    }

    async fn select_subject(&mut self, subject: &Subject) -> Result<(), CrawlerError> {
        self.selected = Some(subject.code.clone());
        Ok(())
    }

    async fn has_control(&mut self, control: Control) -> Result<bool, CrawlerError> {
        Ok(match control {
            Control::Search => self.selected.is_some(),
            Control::Page(n) => html::has_page_link(&self.document, n),
        })
    }

    async fn click(&mut self, control: Control) -> Result<(), CrawlerError> {
        self.clicks.push(control);
        let code = self.selected.clone().unwrap_or_default();
        let listing = self.listings.get(&code);
        self.document = match (control, listing) {
            (Control::Search, Some(Listing::Pages(pages))) => match pages.first() {
                Some(page) => page.clone(),
                None => fixture("no_results.html"),
            },
            (Control::Page(n), Some(Listing::Pages(pages))) => pages
                .get(n as usize - 1)
                .cloned()
                .unwrap_or_default(),
            (_, Some(Listing::Slow(delay))) => {
                let delay = *delay;
                tokio::time::sleep(delay).await;
                fixture("no_results.html")
            }
            (_, Some(Listing::Broken)) => {
                return Err(CrawlerError::UnexpectedPage("HTTP 500".to_string()))
            }
            (_, Some(Listing::Blank)) | (_, None) => "<html><body></body></html>".to_string(),
        };
        Ok(())
    }

    async fn rows(&mut self) -> Result<Vec<RawRow>, CrawlerError> {
        Ok(html::rows(&self.document))
    }

    async fn page_info(&mut self) -> Result<Option<PageInfo>, CrawlerError> {
        Ok(html::page_info(&self.document))
    }
}
