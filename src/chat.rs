//! Per-category news chat.
//!
//! A chat turn runs the same four stages every time: parse the message
//! into a structured intent, turn that intent into search queries, run
//! the queries through the aggregation pipeline, then summarize what
//! came back against the conversation history. Each stage has its own
//! fallback (default intent, templated queries, count-based summary),
//! so a turn always produces a usable response even when the oracle or
//! the search backends are down.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::DatabaseOperations;
use crate::llm::LLM;
use crate::models::{AppState, CategoryChatResponse, ChatMessageRecord};
use crate::news::query_gen::{parse_query_list, strip_code_fences, MAX_QUERIES};
use crate::news::{Category, NewsItem, UserProfile};
use crate::types::LLMMessage;

/// How many stored messages feed the summarizer as conversation context.
const HISTORY_LIMIT: i64 = 10;

/// Structured reading of a chat message, extracted by the oracle.
///
/// Every field is optional on the wire; whatever the oracle omits
/// parses to its empty default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatIntent {
    pub time_period: Option<String>,
    pub specific_topics: Vec<String>,
    pub geographic_regions: Vec<String>,
    pub news_sources: Vec<String>,
    pub specific_requirements: Vec<String>,
}

impl ChatIntent {
    /// Used when the message cannot be parsed into an intent.
    fn fallback() -> Self {
        Self {
            time_period: Some("recent".to_string()),
            ..Self::default()
        }
    }
}

/// Run one chat turn for a category-scoped session.
///
/// Profile and history come from the database; a missing profile falls
/// back to the documented defaults. Persistence failures are logged and
/// the turn continues, so a flaky database degrades history rather than
/// breaking chat.
pub async fn handle_category_chat(
    state: &AppState,
    category: Category,
    session_id: &str,
    message: &str,
) -> CategoryChatResponse {
    info!(category = %category, session_id = %session_id, "Chat turn started");

    let profile = match DatabaseOperations::get_user_by_session(&state.pool, session_id).await {
        Ok(Some(record)) => UserProfile::from(&record),
        Ok(None) => UserProfile::default(),
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Failed to load user profile, using defaults");
            UserProfile::default()
        }
    };

    // History is loaded before the incoming message is stored, so it
    // only contains prior turns.
    let history = match DatabaseOperations::get_chat_messages(
        &state.pool,
        session_id,
        category.as_str(),
        HISTORY_LIMIT,
    )
    .await
    {
        Ok(messages) => messages,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Failed to load chat history");
            Vec::new()
        }
    };

    if let Err(e) = DatabaseOperations::create_chat_message(
        &state.pool,
        session_id,
        category.as_str(),
        "user",
        message,
    )
    .await
    {
        warn!(session_id = %session_id, error = %e, "Failed to persist user message");
    }

    let intent = parse_intent(&state.llm, category, message).await;
    let queries = dynamic_queries(&state.llm, category, message, &intent, &profile).await;

    let search_profile = overlay_profile(&profile, &intent);
    let result = state
        .aggregator
        .run_with_queries(&search_profile, category, queries.clone())
        .await;

    let response_text = summarize(
        &state.llm,
        category,
        &profile,
        &history,
        message,
        &intent,
        &result.items,
    )
    .await;

    if let Err(e) = DatabaseOperations::create_chat_message(
        &state.pool,
        session_id,
        category.as_str(),
        "assistant",
        &response_text,
    )
    .await
    {
        warn!(session_id = %session_id, error = %e, "Failed to persist assistant message");
    }

    info!(
        category = %category,
        items = result.items.len(),
        queries = queries.len(),
        "Chat turn finished"
    );

    let error = result.error_message;
    CategoryChatResponse {
        success: error.is_none(),
        response: response_text,
        news_items: result.items,
        queries_used: queries,
        suggestions: suggestions(category),
        error,
    }
}

/// Extract a [`ChatIntent`] from the raw message.
async fn parse_intent(llm: &LLM, category: Category, message: &str) -> ChatIntent {
    let prompt = format!(
        r#"Parse this user message for {category} news:
"{message}"

Extract and return as JSON with these fields:
{{
    "time_period": "recent/last week/last month/specific date range",
    "specific_topics": ["list", "of", "specific", "topics", "drugs", "conditions"],
    "geographic_regions": ["list", "of", "regions", "countries"],
    "news_sources": ["preferred", "news", "sources"],
    "specific_requirements": ["approvals", "trials", "recalls", "coverage", "etc"]
}}

Be specific and extract all relevant information from the user's request."#,
        category = category.as_str(),
        message = message,
    );

    match llm.complete(&prompt).await {
        Ok(response) => match serde_json::from_str::<ChatIntent>(strip_code_fences(&response)) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(category = %category, error = %e, "Unparseable intent response, using defaults");
                ChatIntent::fallback()
            }
        },
        Err(e) => {
            warn!(category = %category, error = %e, "Intent extraction failed, using defaults");
            ChatIntent::fallback()
        }
    }
}

/// Turn the parsed intent into search queries for this turn.
///
/// Falls back to three templated queries built from the raw message, so
/// the search stage always has something to run.
async fn dynamic_queries(
    llm: &LLM,
    category: Category,
    message: &str,
    intent: &ChatIntent,
    profile: &UserProfile,
) -> Vec<String> {
    let prompt = format!(
        r#"Generate 3-5 specific search queries for {category} news based on:

User message: "{message}"
Time period: {time_period}
Specific topics: {topics:?}
Geographic regions: {regions:?}
Requirements: {requirements:?}
User expertise: {expertise:?}

Create highly specific queries that match the user's exact request.
Focus on the category: {category}

Return as JSON array of strings."#,
        category = category.as_str(),
        message = message,
        time_period = intent.time_period.as_deref().unwrap_or("recent"),
        topics = intent.specific_topics,
        regions = intent.geographic_regions,
        requirements = intent.specific_requirements,
        expertise = profile.expertise_areas,
    );

    let mut queries = match llm.complete(&prompt).await {
        Ok(response) => parse_query_list(&response),
        Err(e) => {
            warn!(category = %category, error = %e, "Query generation failed, using templates");
            Vec::new()
        }
    };

    if queries.is_empty() {
        queries = vec![
            format!("{} news {}", category.as_str(), message),
            format!("{} updates {}", category.as_str(), message),
            format!("{} latest {}", category.as_str(), message),
        ];
    }

    queries.truncate(MAX_QUERIES);
    queries
}

/// Apply message-level context on top of the stored profile.
///
/// Topics and regions named in the message override the stored ones for
/// this turn only; everything else scores against the saved profile.
fn overlay_profile(profile: &UserProfile, intent: &ChatIntent) -> UserProfile {
    let mut overlaid = profile.clone();
    if !intent.specific_topics.is_empty() {
        overlaid.keywords = intent.specific_topics.clone();
    }
    if !intent.geographic_regions.is_empty() {
        overlaid.regions = intent.geographic_regions.clone();
    }
    overlaid
}

/// Generate the conversational reply covering what the search found.
async fn summarize(
    llm: &LLM,
    category: Category,
    profile: &UserProfile,
    history: &[ChatMessageRecord],
    message: &str,
    intent: &ChatIntent,
    items: &[NewsItem],
) -> String {
    let intent_json = serde_json::to_string(intent).unwrap_or_default();
    let prompt = format!(
        r#"Generate a helpful, conversational response to the user's request for {category} news.

Original request: "{message}"
Parsed intent: {intent}
Found {count} relevant news items

Provide:
1. Acknowledge their specific request
2. Summarize what you found (number of items, key themes)
3. Highlight 2-3 most relevant findings
4. Offer to provide more specific results or different filters if needed

Keep it conversational and helpful. If no results found, suggest alternative searches."#,
        category = category.as_str(),
        message = message,
        intent = intent_json,
        count = items.len(),
    );

    let mut messages = vec![LLMMessage::system(system_prompt(category, profile))];
    for record in history {
        messages.push(LLMMessage::new(record.role.clone(), record.content.clone()));
    }
    messages.push(LLMMessage::user(prompt));

    match llm.complete_with_messages(messages).await {
        Ok(response) => response,
        Err(e) => {
            warn!(category = %category, error = %e, "Summary generation failed, using fallback");
            format!(
                "I found {} relevant news items for your request. Please let me know if you'd like more specific information.",
                items.len()
            )
        }
    }
}

fn system_prompt(category: Category, profile: &UserProfile) -> String {
    format!(
        r#"You are a specialized news assistant focused on {description} in healthcare and pharmaceuticals.

User Expertise: {expertise}
Therapeutic Areas: {therapeutic}
Regions: {regions}
Keywords: {keywords}

Your role is to:
1. Understand user queries about {description}
2. Generate relevant search queries to find the most recent and relevant news
3. Provide concise, informative responses with news items
4. Ask clarifying questions when needed
5. Suggest related topics or follow-up questions

Always focus on the {category} category and provide actionable insights."#,
        description = category.description(),
        expertise = profile.expertise_areas.join(", "),
        therapeutic = profile.therapeutic_areas.join(", "),
        regions = profile.regions.join(", "),
        keywords = profile.keywords.join(", "),
        category = category.as_str(),
    )
}

/// Follow-up prompts offered alongside every chat response.
pub fn suggestions(category: Category) -> Vec<String> {
    let fixed: [&str; 4] = match category {
        Category::Regulatory => [
            "Show me recent FDA approvals",
            "Any safety alerts this week?",
            "What's new in regulatory compliance?",
            "Tell me about breakthrough therapy designations",
        ],
        Category::Clinical => [
            "Show me Phase III trial results",
            "Any new clinical breakthroughs?",
            "What's happening in oncology trials?",
            "Tell me about COVID-19 research",
        ],
        Category::Market => [
            "Show me payer policy updates",
            "Any pricing news?",
            "What's new in reimbursement?",
            "Tell me about market access strategies",
        ],
        Category::Rwe => [
            "Show me real-world evidence studies",
            "Any public health updates?",
            "What's new in epidemiology?",
            "Tell me about health outcomes data",
        ],
    };
    fixed.iter().map(|s| s.to_string()).collect()
}
