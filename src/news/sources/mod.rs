//! Upstream news sources
//!
//! Each source implements the same narrow contract: given one search
//! query and a category, return zero or more raw records. Adapters
//! never raise; any upstream failure (HTTP error, timeout, malformed
//! body) is logged and degrades to an empty list so one bad source
//! never blocks the others in a fan-out.

pub mod registry_classic;
pub mod registry_v2;
pub mod serp;

pub use registry_classic::ClassicRegistrySearch;
pub use registry_v2::RegistryV2Search;
pub use serp::SerpNewsSearch;

use super::profile::Category;
use async_trait::async_trait;

/// Raw hit from one upstream source before normalization.
///
/// Everything is optional; real feeds drop fields routinely and the
/// normalizer decides what is salvageable.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub date: Option<String>,
    /// Registry study identifier (e.g. an NCT number), registry sources only.
    pub registry_id: Option<String>,
}

/// Which upstream a record came from. Drives ID derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    WebSearch,
    RegistryClassic,
    RegistryV2,
}

impl SourceKind {
    /// Prefix for derived item identifiers.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            SourceKind::WebSearch => "web",
            SourceKind::RegistryClassic => "nih",
            SourceKind::RegistryV2 => "ctdata",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::WebSearch => "web_search",
            SourceKind::RegistryClassic => "registry_classic",
            SourceKind::RegistryV2 => "registry_v2",
        }
    }
}

/// One upstream news source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch raw records for one query. Degrades to an empty list on
    /// any upstream failure; a query with zero hits is not an error.
    async fn fetch(&self, query: &str, category: Category) -> Vec<RawRecord>;
}
