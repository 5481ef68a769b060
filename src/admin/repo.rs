use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{RepoError, RepoResult};

/// Administrator record. The passkey hash never leaves the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub passkey_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait AdminRepo: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create(&self, username: &str, passkey_hash: &str) -> RepoResult<Admin>;
    /// Inserts only while the table is empty; `Ok(None)` once any admin exists.
    async fn create_first(&self, username: &str, passkey_hash: &str) -> RepoResult<Option<Admin>>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Admin>>;
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Admin>>;
    async fn list(&self) -> RepoResult<Vec<Admin>>;
    /// Never removes the last remaining admin; returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgAdminRepo {
    db: PgPool,
}

impl PgAdminRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminRepo for PgAdminRepo {
    async fn create(&self, username: &str, passkey_hash: &str) -> RepoResult<Admin> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, username, passkey_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, passkey_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(passkey_hash)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_write)
    }

    async fn create_first(&self, username: &str, passkey_hash: &str) -> RepoResult<Option<Admin>> {
        let mut tx = self.db.begin().await?;
        // serializes concurrent bootstrap attempts
        sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, username, passkey_hash)
            SELECT $1, $2, $3
             WHERE NOT EXISTS (SELECT 1 FROM admins)
            RETURNING id, username, passkey_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(passkey_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepoError::from_write)?;
        tx.commit().await?;
        Ok(admin)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, passkey_hash, created_at FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(admin)
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, passkey_hash, created_at FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(admin)
    }

    async fn list(&self) -> RepoResult<Vec<Admin>> {
        let admins = sqlx::query_as::<_, Admin>(
            "SELECT id, username, passkey_hash, created_at FROM admins ORDER BY created_at",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(admins)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.db.begin().await?;
        sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query(
            "DELETE FROM admins WHERE id = $1 AND (SELECT COUNT(*) FROM admins) > 1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(res.rows_affected() == 1)
    }
}
