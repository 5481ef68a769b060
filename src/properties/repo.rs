use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{City, NewProperty, Property, PropertyFilter, PropertyPatch};
use crate::db::RepoResult;

const PROPERTY_COLUMNS: &str = "id, user_id, image, image_key, name, kind, categories, size, \
     address, city, condition, approved, last_updated";

/// Listing storage. Approval rules live in the workflow, not here; the store only
/// guarantees that every insert and every patch leaves the listing unapproved.
#[async_trait]
pub trait PropertyRepo: Send + Sync {
    async fn insert(&self, listing: NewProperty) -> RepoResult<Property>;
    async fn find(&self, id: Uuid) -> RepoResult<Option<Property>>;
    /// Applies the patch, clears `approved` and bumps `last_updated`.
    async fn update(&self, id: Uuid, patch: PropertyPatch) -> RepoResult<Option<Property>>;
    async fn set_approved(&self, id: Uuid) -> RepoResult<Option<Property>>;
    async fn delete(&self, id: Uuid) -> RepoResult<Option<Property>>;
    async fn list(&self, filter: &PropertyFilter) -> RepoResult<Vec<Property>>;
    async fn cities(&self) -> RepoResult<Vec<City>>;
}

#[derive(Clone)]
pub struct PgPropertyRepo {
    db: PgPool,
}

impl PgPropertyRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PropertyRepo for PgPropertyRepo {
    async fn insert(&self, listing: NewProperty) -> RepoResult<Property> {
        let row = sqlx::query_as::<_, Property>(&format!(
            r#"
            INSERT INTO properties
                (id, user_id, image, image_key, name, kind, categories, size, address, city, condition, approved)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE)
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(listing.user_id)
        .bind(&listing.image)
        .bind(&listing.image_key)
        .bind(&listing.name)
        .bind(&listing.kind)
        .bind(&listing.categories)
        .bind(&listing.size)
        .bind(&listing.address)
        .bind(&listing.city)
        .bind(&listing.condition)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Property>> {
        let row = sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: PropertyPatch) -> RepoResult<Option<Property>> {
        let row = sqlx::query_as::<_, Property>(&format!(
            r#"
            UPDATE properties
               SET name         = COALESCE($2, name),
                   kind         = COALESCE($3, kind),
                   categories   = COALESCE($4, categories),
                   size         = COALESCE($5, size),
                   address      = COALESCE($6, address),
                   city         = COALESCE($7, city),
                   condition    = COALESCE($8, condition),
                   approved     = FALSE,
                   last_updated = now()
             WHERE id = $1
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.kind)
        .bind(&patch.categories)
        .bind(&patch.size)
        .bind(&patch.address)
        .bind(&patch.city)
        .bind(&patch.condition)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn set_approved(&self, id: Uuid) -> RepoResult<Option<Property>> {
        let row = sqlx::query_as::<_, Property>(&format!(
            "UPDATE properties SET approved = TRUE WHERE id = $1 RETURNING {PROPERTY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<Option<Property>> {
        let row = sqlx::query_as::<_, Property>(&format!(
            "DELETE FROM properties WHERE id = $1 RETURNING {PROPERTY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self, filter: &PropertyFilter) -> RepoResult<Vec<Property>> {
        let rows = sqlx::query_as::<_, Property>(&format!(
            r#"
            SELECT {PROPERTY_COLUMNS}
              FROM properties
             WHERE ($1::boolean IS NULL OR approved = $1)
               AND ($2::uuid    IS NULL OR user_id = $2)
               AND ($3::uuid    IS NULL OR id = $3)
               AND ($4::text    IS NULL OR city = $4)
               AND ($5::text    IS NULL OR kind = $5)
               AND ($6::text    IS NULL OR categories = $6)
             ORDER BY last_updated DESC
            "#
        ))
        .bind(filter.approved)
        .bind(filter.owner)
        .bind(filter.id)
        .bind(&filter.city)
        .bind(&filter.kind)
        .bind(&filter.categories)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn cities(&self) -> RepoResult<Vec<City>> {
        let rows = sqlx::query_as::<_, City>("SELECT id, name, state, kind FROM places ORDER BY name")
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}
