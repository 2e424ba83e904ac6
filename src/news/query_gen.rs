//! Search query generation
//!
//! Asks the completion oracle for targeted search strings built from
//! the user's raw expertise phrasing. The prompt carries the expertise
//! text verbatim instead of mapping it through a keyword table, so
//! "pediatric oncology" stays "pediatric oncology" instead of decaying
//! into generic cancer terms. Oracle failure or malformed output falls
//! back to deterministic templates; the pipeline never stalls here.

use super::profile::{Category, UserProfile};
use crate::llm::LLM;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MAX_QUERIES: usize = 7;
pub const MIN_QUERIES: usize = 3;

pub struct QueryGenerator {
    llm: Arc<LLM>,
}

impl QueryGenerator {
    pub fn new(llm: Arc<LLM>) -> Self {
        Self { llm }
    }

    /// Generate search queries for one category. Never returns an empty
    /// list.
    pub async fn generate(&self, profile: &UserProfile, category: Category) -> Vec<String> {
        let prompt = build_prompt(profile, category);

        let mut queries = match self.llm.complete(&prompt).await {
            Ok(response) => parse_query_list(&response),
            Err(e) => {
                warn!(category = %category, error = %e, "Query generation failed, using fallback queries");
                Vec::new()
            }
        };

        if queries.is_empty() {
            queries = fallback_queries(profile, category);
        }

        queries.truncate(MAX_QUERIES);

        // Top up from the fallback set when the oracle returned fewer
        // queries than the fan-out wants.
        if queries.len() < MIN_QUERIES {
            for candidate in fallback_queries(profile, category) {
                if queries.len() >= MIN_QUERIES {
                    break;
                }
                if !queries.contains(&candidate) {
                    queries.push(candidate);
                }
            }
        }

        debug!(category = %category, count = queries.len(), "Search queries ready");
        queries
    }
}

fn build_prompt(profile: &UserProfile, category: Category) -> String {
    format!(
        r#"Generate 4-5 highly specific search queries for {label}.

User's exact expertise: "{expertise}"
Therapeutic areas: {therapeutic}
Regions: {regions}
Keywords: {keywords}

Create queries that are precisely tailored to their expertise area. Use domain-specific terminology.
Focus on: {focus}.

Return as JSON array of strings. Make each query specific to their expertise."#,
        label = category.news_label(),
        expertise = profile.expertise_areas.join(", "),
        therapeutic = profile.therapeutic_areas.join(", "),
        regions = profile.regions.join(", "),
        keywords = profile.keywords.join(", "),
        focus = category.query_focus(),
    )
}

/// Strip a markdown code fence off an oracle response, if present.
pub(crate) fn strip_code_fences(response: &str) -> &str {
    if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response).trim()
    } else {
        response.trim()
    }
}

/// Parse a JSON string array out of an oracle response, tolerating
/// markdown code fences around the payload.
pub(crate) fn parse_query_list(response: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(strip_code_fences(response)) {
        Ok(queries) => queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Deterministic template queries used when the oracle is unavailable
/// or returns nothing usable. Pure string assembly, no network.
pub fn fallback_queries(profile: &UserProfile, category: Category) -> Vec<String> {
    let therapeutic = profile.therapeutic_areas.join(" ");
    let expertise = profile.expertise_areas.join(" ");

    let templates = match category {
        Category::Regulatory => vec![
            format!("FDA approval {}", therapeutic),
            format!("regulatory guidance {}", expertise),
            "drug recall alert".to_string(),
            "EMA decision pharmaceutical".to_string(),
        ],
        Category::Clinical => vec![
            format!("clinical trial {}", therapeutic),
            format!("Phase III results {}", expertise),
            "drug development breakthrough".to_string(),
            "biomarker study results".to_string(),
        ],
        Category::Market => vec![
            format!("payer coverage {}", therapeutic),
            format!("HEOR study {}", expertise),
            "formulary coverage decision".to_string(),
            "cost effectiveness analysis".to_string(),
        ],
        Category::Rwe => vec![
            format!("real world evidence {}", therapeutic),
            format!("population health {}", expertise),
            "epidemiology study results".to_string(),
            "public health policy update".to_string(),
        ],
    };

    templates
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::testing::ScriptedOracle;

    fn profile() -> UserProfile {
        UserProfile::default()
    }

    fn generator(oracle: ScriptedOracle) -> QueryGenerator {
        QueryGenerator::new(Arc::new(LLM::with_adapter(Box::new(oracle), "test-model")))
    }

    #[test]
    fn test_parse_query_list_plain_and_fenced() {
        let plain = r#"["FDA approval oncology", "EMA decision cardiology"]"#;
        assert_eq!(parse_query_list(plain).len(), 2);

        let fenced = "Here you go:\n```json\n[\"payer coverage oncology\"]\n```";
        assert_eq!(parse_query_list(fenced), vec!["payer coverage oncology"]);

        let bare_fence = "```\n[\"real world evidence diabetes\"]\n```";
        assert_eq!(parse_query_list(bare_fence), vec!["real world evidence diabetes"]);
    }

    #[test]
    fn test_parse_query_list_rejects_garbage() {
        assert!(parse_query_list("I could not think of any queries.").is_empty());
        assert!(parse_query_list("{\"queries\": []}").is_empty());
        assert_eq!(parse_query_list(r#"["", "  ", "valid query"]"#), vec!["valid query"]);
    }

    #[test]
    fn test_fallback_carries_raw_expertise() {
        let profile = UserProfile {
            expertise_areas: vec!["pediatric oncology".to_string()],
            therapeutic_areas: vec![],
            regions: vec!["US".to_string()],
            keywords: vec!["regulatory".to_string()],
            news_recency_days: 7,
        };

        let queries = fallback_queries(&profile, Category::Regulatory);
        assert!(queries
            .iter()
            .any(|q| q.contains("regulatory") && q.contains("pediatric oncology")));
        // empty therapeutic area list leaves no trailing whitespace
        assert!(queries.iter().all(|q| q == q.trim()));
    }

    #[tokio::test]
    async fn test_generate_uses_oracle_queries() {
        let oracle = ScriptedOracle::always(
            r#"["FDA approval pediatric oncology drugs", "EMA decision childhood cancer", "regulatory guidance pediatric trials", "compliance alert pediatric oncology"]"#,
        );
        let queries = generator(oracle).generate(&profile(), Category::Regulatory).await;

        assert_eq!(queries.len(), 4);
        assert_eq!(queries[0], "FDA approval pediatric oncology drugs");
    }

    #[tokio::test]
    async fn test_generate_caps_query_count() {
        let many: Vec<String> = (0..12).map(|i| format!("query number {}", i)).collect();
        let oracle = ScriptedOracle::always(serde_json::to_string(&many).unwrap());

        let queries = generator(oracle).generate(&profile(), Category::Clinical).await;
        assert_eq!(queries.len(), MAX_QUERIES);
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_oracle_failure() {
        let queries = generator(ScriptedOracle::failing())
            .generate(&profile(), Category::Market)
            .await;

        assert!(!queries.is_empty());
        assert!(queries.contains(&"formulary coverage decision".to_string()));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_empty_array() {
        let queries = generator(ScriptedOracle::always("[]"))
            .generate(&profile(), Category::Rwe)
            .await;

        assert!(queries.len() >= MIN_QUERIES);
        assert!(queries.contains(&"epidemiology study results".to_string()));
    }

    #[tokio::test]
    async fn test_generate_tops_up_short_responses() {
        let oracle = ScriptedOracle::always(r#"["single odd query"]"#);
        let queries = generator(oracle).generate(&profile(), Category::Regulatory).await;

        assert!(queries.len() >= MIN_QUERIES);
        assert_eq!(queries[0], "single odd query");
    }
}
