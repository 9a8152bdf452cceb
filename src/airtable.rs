//! Airtable REST client for the course and section tables.

use crate::{config::AirtableConfig, CrawlerError, RecordId, Table};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct CreateRequest<'a, R> {
    fields: &'a R,
    typecast: bool,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: RecordId,
}

#[derive(Debug, Clone)]
pub struct AirtableTable {
    name: String,
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AirtableTable {
    pub fn new(client: reqwest::Client, config: &AirtableConfig, table_id: &str) -> Self {
        AirtableTable {
            name: table_id.to_string(),
            url: format!(
                "{}/{}/{}",
                config.api_url.trim_end_matches('/'),
                config.base_id,
                table_id
            ),
            api_key: config.api_key.clone(),
            client,
        }
    }

    /// Opens the course and section tables over one shared client.
    pub fn pair(
        config: &AirtableConfig,
        timeout: Duration,
    ) -> Result<(AirtableTable, AirtableTable), CrawlerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok((
            AirtableTable::new(client.clone(), config, &config.courses_table),
            AirtableTable::new(client, config, &config.sections_table),
        ))
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait::async_trait]
impl Table for AirtableTable {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    async fn create<R: Serialize + Sync>(&self, record: &R) -> Result<RecordId, CrawlerError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&CreateRequest {
                fields: record,
                typecast: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::RemoteCreate {
                table: self.name.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let created: CreateResponse = response.json().await?;
        Ok(created.id)
    }
}
