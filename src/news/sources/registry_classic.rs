//! Classic trial registry search (study_fields API)
//!
//! Queries the legacy ClinicalTrials.gov endpoint that returns every
//! field as a flat array of strings, one entry per study. Records with
//! no study identifier are unusable downstream and get skipped here.

use super::{RawRecord, SourceAdapter, SourceKind};
use crate::news::profile::Category;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const REGISTRY_API_BASE: &str = "https://clinicaltrials.gov";
const STUDY_PAGE_BASE: &str = "https://clinicaltrials.gov/ct2/show";
const REQUEST_TIMEOUT_SECS: u64 = 30;

const STUDY_FIELDS: &str =
    "NCTId,BriefTitle,BriefSummary,StartDate,CompletionDate,Phase,Condition";

#[derive(Debug, Deserialize)]
struct StudyFieldsBody {
    #[serde(rename = "StudyFieldsResponse")]
    response: StudyFieldsResponse,
}

#[derive(Debug, Deserialize)]
struct StudyFieldsResponse {
    #[serde(rename = "StudyFields", default)]
    studies: Vec<StudyFields>,
}

#[derive(Debug, Deserialize)]
struct StudyFields {
    #[serde(rename = "NCTId", default)]
    nct_id: Vec<String>,
    #[serde(rename = "BriefTitle", default)]
    brief_title: Vec<String>,
    #[serde(rename = "BriefSummary", default)]
    brief_summary: Vec<String>,
    #[serde(rename = "StartDate", default)]
    start_date: Vec<String>,
}

/// Search client for the flat-array registry endpoint.
pub struct ClassicRegistrySearch {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl ClassicRegistrySearch {
    pub fn new(max_results: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: REGISTRY_API_BASE.to_string(),
            max_results,
        }
    }

    /// Override the API host, mainly for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn search_studies(&self, query: &str) -> Result<Vec<RawRecord>, reqwest::Error> {
        let url = format!("{}/api/query/study_fields", self.base_url);
        let max_rnk = self.max_results.to_string();

        let body: StudyFieldsBody = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .query(&[
                ("expr", query),
                ("fields", STUDY_FIELDS),
                ("min_rnk", "1"),
                ("max_rnk", max_rnk.as_str()),
                ("fmt", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .response
            .studies
            .into_iter()
            .filter_map(study_to_record)
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for ClassicRegistrySearch {
    fn kind(&self) -> SourceKind {
        SourceKind::RegistryClassic
    }

    async fn fetch(&self, query: &str, category: Category) -> Vec<RawRecord> {
        match self.search_studies(query).await {
            Ok(records) => {
                debug!(
                    category = %category,
                    query = %query,
                    count = records.len(),
                    "Registry search completed"
                );
                records
            }
            Err(e) => {
                warn!(category = %category, query = %query, error = %e, "Registry search failed");
                Vec::new()
            }
        }
    }
}

fn study_to_record(study: StudyFields) -> Option<RawRecord> {
    let nct = study.nct_id.into_iter().find(|id| !id.is_empty())?;

    Some(RawRecord {
        title: study.brief_title.into_iter().next(),
        snippet: study.brief_summary.into_iter().next(),
        url: Some(format!("{}/{}", STUDY_PAGE_BASE, nct)),
        source: Some("ClinicalTrials.gov".to_string()),
        date: study.start_date.into_iter().next(),
        registry_id: Some(nct),
    })
}
