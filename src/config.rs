use crate::{soc::SEARCH_URL, utils::non_blank, CrawlerError};
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Crawl the Schedule of Classes into Airtable")]
pub struct Args {
    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    pub airtable_api_key: Option<String>,

    #[arg(long, env = "AIRTABLE_BASE_ID")]
    pub airtable_base_id: Option<String>,

    /// Courses table id, or a table path such as `tblXXX/viwYYY`
    #[arg(long, env = "AIRTABLE_TABLE_NAME_COURSES")]
    pub courses_table: Option<String>,

    /// Sections table id, or a table path such as `tblXXX/viwYYY`
    #[arg(long, env = "AIRTABLE_TABLE_NAME_SECTIONS")]
    pub sections_table: Option<String>,

    #[arg(long, env = "AIRTABLE_API_URL", default_value = "https://api.airtable.com/v0")]
    pub airtable_api_url: String,

    #[arg(long, env = "SOC_URL", default_value = SEARCH_URL)]
    pub search_url: String,

    /// Term code to search, defaults to the term preselected on the form
    #[arg(long, env = "SOC_TERM")]
    pub term: Option<String>,

    /// Only crawl these subject codes (repeatable)
    #[arg(long = "subject", value_name = "CODE")]
    pub subjects: Vec<String>,

    /// Stop each subject after this many result pages
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Seconds allowed for a navigation or search request
    #[arg(long, default_value_t = 10)]
    pub navigation_timeout: u64,

    /// Seconds to wait for a page to show its results or search form
    #[arg(long, default_value_t = 5)]
    pub settle_timeout: u64,

    /// Seconds allowed for a single datastore call
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    /// Minimum milliseconds between catalog requests
    #[arg(long, default_value_t = 1000)]
    pub request_delay: u64,

    /// Log records instead of creating them in Airtable
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtableConfig {
    pub api_url: String,
    pub api_key: String,
    pub base_id: String,
    pub courses_table: String,
    pub sections_table: String,
}

/// Validated settings, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` on a dry run.
    pub airtable: Option<AirtableConfig>,
    pub search_url: String,
    pub term: Option<String>,
    pub subjects: Vec<String>,
    pub max_pages: Option<u32>,
    pub navigation_timeout: Duration,
    pub settle_timeout: Duration,
    pub request_timeout: Duration,
    pub request_delay: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Config, CrawlerError> {
        let airtable = if args.dry_run {
            None
        } else {
            Some(AirtableConfig {
                api_url: args.airtable_api_url,
                api_key: required(args.airtable_api_key, "AIRTABLE_API_KEY")?,
                base_id: required(args.airtable_base_id, "AIRTABLE_BASE_ID")?,
                courses_table: table_id(&required(
                    args.courses_table,
                    "AIRTABLE_TABLE_NAME_COURSES",
                )?),
                sections_table: table_id(&required(
                    args.sections_table,
                    "AIRTABLE_TABLE_NAME_SECTIONS",
                )?),
            })
        };

        Ok(Config {
            airtable,
            search_url: args.search_url,
            term: args.term.and_then(non_blank),
            subjects: args
                .subjects
                .iter()
                .filter_map(non_blank)
                .map(|s| s.to_uppercase())
                .collect(),
            max_pages: args.max_pages,
            navigation_timeout: Duration::from_secs(args.navigation_timeout),
            settle_timeout: Duration::from_secs(args.settle_timeout),
            request_timeout: Duration::from_secs(args.request_timeout),
            request_delay: Duration::from_millis(args.request_delay),
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, CrawlerError> {
    value
        .and_then(non_blank)
        .ok_or(CrawlerError::ConfigurationMissing(name))
}

/// Airtable table paths look like `tblXXX/viwYYY`; only the table id is kept.
fn table_id(path: &str) -> String {
    path.split_once('/')
        .map_or(path, |(id, _)| id)
        .trim()
        .to_string()
}
