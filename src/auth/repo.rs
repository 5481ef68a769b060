use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserPatch};
use crate::db::{RepoError, RepoResult};

const USER_COLUMNS: &str = "id, name, email, contact, address, photo, password_hash, created_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> RepoResult<User>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// `Ok(None)` when the user does not exist.
    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> RepoResult<Option<User>>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, contact, address, photo, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.contact)
        .bind(&user.address)
        .bind(&user.photo)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_write)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name    = COALESCE($2, name),
                   email   = COALESCE($3, email),
                   contact = COALESCE($4, contact),
                   address = COALESCE($5, address),
                   photo   = COALESCE($6, photo)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.contact)
        .bind(&patch.address)
        .bind(&patch.photo)
        .fetch_optional(&self.db)
        .await
        .map_err(RepoError::from_write)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
