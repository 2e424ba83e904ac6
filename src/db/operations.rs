use sqlx::PgPool;
use crate::models::{ChatMessageRecord, PreferencesRequest, UserRecord};
use anyhow::Result;
use uuid::Uuid;

pub struct DatabaseOperations;

impl DatabaseOperations {
    // User preference operations

    pub async fn get_user_by_session(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn upsert_preferences(
        pool: &PgPool,
        session_id: &str,
        prefs: &PreferencesRequest,
    ) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, session_id, expertise_areas, therapeutic_areas, regions, keywords, news_recency_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (session_id) DO UPDATE SET
                expertise_areas = EXCLUDED.expertise_areas,
                therapeutic_areas = EXCLUDED.therapeutic_areas,
                regions = EXCLUDED.regions,
                keywords = EXCLUDED.keywords,
                news_recency_days = EXCLUDED.news_recency_days,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(&prefs.expertise_areas)
        .bind(&prefs.therapeutic_areas)
        .bind(&prefs.regions)
        .bind(&prefs.keywords)
        .bind(prefs.news_recency_days as i32)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    // Chat message operations

    pub async fn create_chat_message(
        pool: &PgPool,
        session_id: &str,
        category: &str,
        role: &str,
        content: &str,
    ) -> Result<ChatMessageRecord> {
        let message = sqlx::query_as::<_, ChatMessageRecord>(
            r#"
            INSERT INTO messages (id, session_id, category, role, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(category)
        .bind(role)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Most recent `limit` messages for one (session, category), oldest first.
    pub async fn get_chat_messages(
        pool: &PgPool,
        session_id: &str,
        category: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessageRecord>> {
        let messages = sqlx::query_as::<_, ChatMessageRecord>(
            r#"
            SELECT * FROM (
                SELECT * FROM messages
                WHERE session_id = $1 AND category = $2
                ORDER BY created_at DESC
                LIMIT $3
            ) recent
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .bind(category)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn delete_chat_messages(
        pool: &PgPool,
        session_id: &str,
        category: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM messages WHERE session_id = $1 AND category = $2",
        )
        .bind(session_id)
        .bind(category)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
