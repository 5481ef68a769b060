use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RepoResult;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Feedback {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub feedback: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait FeedbackRepo: Send + Sync {
    async fn insert(&self, name: &str, email: &str, feedback: &str) -> RepoResult<Feedback>;
}

#[derive(Clone)]
pub struct PgFeedbackRepo {
    db: PgPool,
}

impl PgFeedbackRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FeedbackRepo for PgFeedbackRepo {
    async fn insert(&self, name: &str, email: &str, feedback: &str) -> RepoResult<Feedback> {
        let row = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (id, name, email, feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, feedback, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(feedback)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}
