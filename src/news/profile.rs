//! News categories and user profiles
//!
//! The four coverage areas the pipeline tracks, plus the per-user
//! preference profile that drives query generation and scoring.

use crate::types::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four news coverage areas.
///
/// Every pipeline run fans out over all of these; chat sessions are
/// pinned to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Regulatory,
    Clinical,
    Market,
    Rwe,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Regulatory,
        Category::Clinical,
        Category::Market,
        Category::Rwe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Regulatory => "regulatory",
            Category::Clinical => "clinical",
            Category::Market => "market",
            Category::Rwe => "rwe",
        }
    }

    /// Human-readable subject line used in query-generation prompts.
    pub fn news_label(&self) -> &'static str {
        match self {
            Category::Regulatory => "regulatory alerts and compliance news",
            Category::Clinical => "clinical trial updates and research news",
            Category::Market => "market access and payer news",
            Category::Rwe => "real-world evidence and public health news",
        }
    }

    /// Longer description used in chat system prompts.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Regulatory => {
                "regulatory alerts, FDA approvals, safety alerts, and compliance updates"
            }
            Category::Clinical => {
                "clinical trial updates, research findings, and medical breakthroughs"
            }
            Category::Market => "market access, payer news, pricing, and reimbursement updates",
            Category::Rwe => "real-world evidence, public health data, and epidemiological studies",
        }
    }

    /// Domain focus phrase embedded in relevance-scoring prompts.
    pub fn domain_focus(&self) -> &'static str {
        match self {
            Category::Regulatory => "regulatory compliance and drug approval",
            Category::Clinical => "clinical trials and drug development",
            Category::Market => "market access and payer decisions",
            Category::Rwe => "real-world evidence and population health",
        }
    }

    /// Terms appended to every web search query for this category.
    pub fn search_suffix(&self) -> &'static str {
        match self {
            Category::Regulatory => "FDA EMA regulatory",
            Category::Clinical => "clinical trial results",
            Category::Market => "payer reimbursement coverage",
            Category::Rwe => "real world evidence outcomes",
        }
    }

    /// Focus areas listed in the query-generation prompt.
    pub fn query_focus(&self) -> &'static str {
        match self {
            Category::Regulatory => {
                "FDA approvals, EMA decisions, regulatory guidance, compliance alerts, drug recalls, policy changes"
            }
            Category::Clinical => {
                "clinical trial results, Phase III trials, drug development, biomarker studies, treatment efficacy"
            }
            Category::Market => {
                "payer coverage decisions, HEOR studies, cost-effectiveness, reimbursement, formulary changes"
            }
            Category::Rwe => {
                "real-world evidence studies, population health, epidemiology, public health policy, outcomes research"
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regulatory" => Ok(Category::Regulatory),
            "clinical" => Ok(Category::Clinical),
            "market" => Ok(Category::Market),
            "rwe" => Ok(Category::Rwe),
            other => Err(AppError::InvalidRequest(format!(
                "Unknown news category: {}",
                other
            ))),
        }
    }
}

/// Preference profile driving query generation and relevance scoring.
///
/// Expertise strings are carried verbatim into prompts. The oracle sees
/// "pediatric oncology" as written rather than a lossy keyword mapping,
/// so subspecialty phrasing survives all the way into search queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub expertise_areas: Vec<String>,
    pub therapeutic_areas: Vec<String>,
    pub regions: Vec<String>,
    pub keywords: Vec<String>,
    pub news_recency_days: i64,
}

impl UserProfile {
    /// First expertise string, or a generic stand-in when the profile is empty.
    pub fn primary_expertise(&self) -> &str {
        self.expertise_areas
            .first()
            .map(|s| s.as_str())
            .unwrap_or("healthcare")
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            expertise_areas: vec!["health economics and market access".to_string()],
            therapeutic_areas: vec!["oncology".to_string(), "cardiovascular".to_string()],
            regions: vec!["US".to_string(), "EU".to_string()],
            keywords: vec![
                "FDA".to_string(),
                "clinical trials".to_string(),
                "market access".to_string(),
            ],
            news_recency_days: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert!("finance".parse::<Category>().is_err());
        assert!("Regulatory".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Rwe).unwrap();
        assert_eq!(json, "\"rwe\"");
        let back: Category = serde_json::from_str("\"market\"").unwrap();
        assert_eq!(back, Category::Market);
    }

    #[test]
    fn test_default_profile() {
        let profile = UserProfile::default();
        assert_eq!(profile.primary_expertise(), "health economics and market access");
        assert_eq!(profile.news_recency_days, 7);
        assert!(profile.keywords.contains(&"FDA".to_string()));
    }

    #[test]
    fn test_primary_expertise_fallback() {
        let profile = UserProfile {
            expertise_areas: vec![],
            therapeutic_areas: vec![],
            regions: vec![],
            keywords: vec![],
            news_recency_days: 7,
        };
        assert_eq!(profile.primary_expertise(), "healthcare");
    }
}
