use crate::CrawlerError;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

pub type RecordId = String;

/// A remote table that accepts new records.
#[async_trait::async_trait]
pub trait Table {
    fn get_name(&self) -> &str;

    /// Creates one record and returns the identifier the datastore assigned.
    async fn create<R: Serialize + Sync>(&self, record: &R) -> Result<RecordId, CrawlerError>;
}

#[async_trait::async_trait]
impl<'t, T: Table + Sync + ?Sized> Table for &'t T {
    fn get_name(&self) -> &str {
        (**self).get_name()
    }

    async fn create<R: Serialize + Sync>(&self, record: &R) -> Result<RecordId, CrawlerError> {
        (**self).create(record).await
    }
}

/// Logs records instead of sending them anywhere.
#[derive(Debug)]
pub struct DryRunTable {
    name: String,
    created: AtomicUsize,
}

impl DryRunTable {
    pub fn new<S: Into<String>>(name: S) -> Self {
        DryRunTable {
            name: name.into(),
            created: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Table for DryRunTable {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    async fn create<R: Serialize + Sync>(&self, record: &R) -> Result<RecordId, CrawlerError> {
        let fields = serde_json::to_string(record)?;
        let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[dry-run] {} #{}: {}", self.name, n, fields);
        Ok(format!("dry{}{}", self.name, n))
    }
}
