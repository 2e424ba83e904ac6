//! Modern trial registry search (v2 studies API)
//!
//! Queries the v2 ClinicalTrials.gov endpoint, which nests study data
//! under protocol sections instead of flat field arrays. Unlike the
//! classic endpoint this variant also filters on trial status: only
//! studies in a recruiting, active, or completed state are returned,
//! which keeps withdrawn and terminated trials out of the feed.

use super::{RawRecord, SourceAdapter, SourceKind};
use crate::news::profile::Category;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const REGISTRY_API_BASE: &str = "https://clinicaltrials.gov";
const STUDY_PAGE_BASE: &str = "https://clinicaltrials.gov/study";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Trial statuses worth surfacing as news.
const ACTIVE_STATUSES: [&str; 4] = [
    "RECRUITING",
    "NOT_YET_RECRUITING",
    "ACTIVE_NOT_RECRUITING",
    "COMPLETED",
];

#[derive(Debug, Deserialize)]
struct StudiesBody {
    #[serde(default)]
    studies: Vec<Study>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Study {
    #[serde(default)]
    protocol_section: ProtocolSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolSection {
    #[serde(default)]
    identification_module: IdentificationModule,
    #[serde(default)]
    status_module: StatusModule,
    #[serde(default)]
    description_module: DescriptionModule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationModule {
    nct_id: Option<String>,
    brief_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusModule {
    overall_status: Option<String>,
    start_date_struct: Option<DateStruct>,
}

#[derive(Debug, Default, Deserialize)]
struct DateStruct {
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptionModule {
    brief_summary: Option<String>,
}

/// Search client for the nested v2 registry endpoint.
pub struct RegistryV2Search {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl RegistryV2Search {
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
        let url = format!("{}/api/v2/studies", self.base_url);
        let page_size = self.max_results.to_string();

        let body: StudiesBody = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .query(&[("query.term", query), ("pageSize", page_size.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .studies
            .into_iter()
            .filter_map(study_to_record)
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for RegistryV2Search {
    fn kind(&self) -> SourceKind {
        SourceKind::RegistryV2
    }

    async fn fetch(&self, query: &str, category: Category) -> Vec<RawRecord> {
        match self.search_studies(query).await {
            Ok(records) => {
                debug!(
                    category = %category,
                    query = %query,
                    count = records.len(),
                    "Registry v2 search completed"
                );
                records
            }
            Err(e) => {
                warn!(category = %category, query = %query, error = %e, "Registry v2 search failed");
                Vec::new()
            }
        }
    }
}

fn study_to_record(study: Study) -> Option<RawRecord> {
    let section = study.protocol_section;

    let status = section.status_module.overall_status.as_deref().unwrap_or("");
    if !ACTIVE_STATUSES.contains(&status) {
        return None;
    }

    let IdentificationModule { nct_id, brief_title } = section.identification_module;
    let nct = nct_id.filter(|id| !id.is_empty())?;

    Some(RawRecord {
        title: brief_title,
        snippet: section.description_module.brief_summary,
        url: Some(format!("{}/{}", STUDY_PAGE_BASE, nct)),
        source: Some("ClinicalTrials.gov".to_string()),
        date: section.status_module.start_date_struct.and_then(|d| d.date),
        registry_id: Some(nct),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn study(nct: &str, status: &str) -> serde_json::Value {
        json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": nct,
                    "briefTitle": format!("Trial {}", nct)
                },
                "statusModule": {
                    "overallStatus": status,
                    "startDateStruct": {"date": "2024-06"}
                },
                "descriptionModule": {
                    "briefSummary": "A brief summary."
                }
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_filters_by_status() {
        let server = MockServer::start().await;

        let body = json!({
            "studies": [
                study("NCT00000001", "RECRUITING"),
                study("NCT00000002", "TERMINATED"),
                study("NCT00000003", "COMPLETED"),
                study("NCT00000004", "WITHDRAWN")
            ]
        });

        Mock::given(method("GET"))
            .and(path("/api/v2/studies"))
            .and(query_param("query.term", "diabetes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let search = RegistryV2Search::new(20).with_base_url(server.uri());
        let records = search.fetch("diabetes", Category::Clinical).await;

        let ids: Vec<_> = records
            .iter()
            .filter_map(|r| r.registry_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["NCT00000001", "NCT00000003"]);
        assert_eq!(
            records[0].url.as_deref(),
            Some("https://clinicaltrials.gov/study/NCT00000001")
        );
        assert_eq!(records[0].date.as_deref(), Some("2024-06"));
    }

    #[tokio::test]
    async fn test_fetch_skips_statusless_studies() {
        let server = MockServer::start().await;

        let body = json!({
            "studies": [
                {
                    "protocolSection": {
                        "identificationModule": {"nctId": "NCT00000005"}
                    }
                }
            ]
        });

        Mock::given(method("GET"))
            .and(path("/api/v2/studies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let search = RegistryV2Search::new(20).with_base_url(server.uri());
        assert!(search.fetch("anything", Category::Clinical).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_degrades_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/studies"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let search = RegistryV2Search::new(20).with_base_url(server.uri());
        assert!(search.fetch("anything", Category::Clinical).await.is_empty());
    }
}
