use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("Missing required configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("Timed out after {}s waiting for {what}", .after.as_secs())]
    NavigationTimeout { what: String, after: Duration },

    #[error("Unexpected page: {0}")]
    UnexpectedPage(String),

    #[error("Datastore rejected record in {table} ({status}): {body}")]
    RemoteCreate {
        table: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),
}

impl CrawlerError {
    pub fn timeout<S: Into<String>>(what: S, after: Duration) -> Self {
        CrawlerError::NavigationTimeout {
            what: what.into(),
            after,
        }
    }
}

/// Reason a single table row was dropped while parsing.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("section row has {found} cells, at least {required} required")]
    TooFewCells { found: usize, required: usize },

    #[error("header row is missing its {0}")]
    MissingField(&'static str),

    #[error("section row has no owning course header")]
    Orphan,
}
