//! Listing approval lifecycle.
//!
//! A listing is either `Pending` or `Approved`. Creation and every owner edit land in
//! `Pending`; only an administrator moves a listing to `Approved`. Public queries only
//! ever see approved listings, owner queries see both.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    repo::PropertyRepo,
    repo_types::{City, NewProperty, Property, PropertyFilter, PropertyPatch},
};
use crate::{db::RepoError, error::ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
}

impl From<bool> for ApprovalState {
    fn from(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Pending
        }
    }
}

impl Property {
    pub fn approval(&self) -> ApprovalState {
        self.approved.into()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Property not found")]
    NotFound,
    #[error("Not allowed")]
    Forbidden,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::NotFound => ApiError::NotFound("Property not found"),
            WorkflowError::Forbidden => ApiError::Forbidden("Not allowed"),
            WorkflowError::Repo(e) => e.into(),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Optional narrowing for the public browse query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseFilter {
    pub city: Option<String>,
    pub kind: Option<String>,
    pub categories: Option<String>,
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    repo: Arc<dyn PropertyRepo>,
}

impl ApprovalWorkflow {
    pub fn new(repo: Arc<dyn PropertyRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, listing: NewProperty) -> WorkflowResult<Property> {
        let property = self.repo.insert(listing).await?;
        info!(property_id = %property.id, owner = %property.user_id, "listing created (pending)");
        Ok(property)
    }

    /// Owner edit. Any accepted edit sends the listing back to `Pending`.
    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        patch: PropertyPatch,
    ) -> WorkflowResult<Property> {
        self.owned(actor, id).await?;
        let property = self
            .repo
            .update(id, patch.normalized())
            .await?
            .ok_or(WorkflowError::NotFound)?;
        info!(property_id = %id, "listing updated, back to pending");
        Ok(property)
    }

    /// Approving an already approved listing is a successful no-op.
    pub async fn approve(&self, admin: Uuid, id: Uuid) -> WorkflowResult<Property> {
        let current = self.repo.find(id).await?.ok_or(WorkflowError::NotFound)?;
        if current.approval() == ApprovalState::Approved {
            debug!(property_id = %id, "listing already approved");
            return Ok(current);
        }
        let property = self
            .repo
            .set_approved(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        info!(property_id = %id, %admin, "property approved");
        Ok(property)
    }

    pub async fn delete(&self, actor: Uuid, id: Uuid) -> WorkflowResult<Property> {
        self.owned(actor, id).await?;
        let property = self.repo.delete(id).await?.ok_or(WorkflowError::NotFound)?;
        info!(property_id = %id, "listing deleted");
        Ok(property)
    }

    /// Any listing, whatever its approval state.
    pub async fn find(&self, id: Uuid) -> WorkflowResult<Property> {
        self.repo.find(id).await?.ok_or(WorkflowError::NotFound)
    }

    pub async fn owned_by(&self, owner: Uuid) -> WorkflowResult<Vec<Property>> {
        let filter = PropertyFilter {
            owner: Some(owner),
            ..Default::default()
        };
        Ok(self.repo.list(&filter).await?)
    }

    pub async fn browse(&self, browse: BrowseFilter) -> WorkflowResult<Vec<Property>> {
        let filter = PropertyFilter {
            approved: Some(true),
            city: browse.city,
            kind: browse.kind,
            categories: browse.categories,
            ..Default::default()
        };
        Ok(self.repo.list(&filter).await?)
    }

    pub async fn pending(&self) -> WorkflowResult<Vec<Property>> {
        let filter = PropertyFilter {
            approved: Some(false),
            ..Default::default()
        };
        Ok(self.repo.list(&filter).await?)
    }

    /// Single listing lookup restricted to one approval state, as a list.
    pub async fn by_id_in(&self, id: Uuid, state: ApprovalState) -> WorkflowResult<Vec<Property>> {
        let filter = PropertyFilter {
            approved: Some(state == ApprovalState::Approved),
            id: Some(id),
            ..Default::default()
        };
        Ok(self.repo.list(&filter).await?)
    }

    pub async fn cities(&self) -> WorkflowResult<Vec<City>> {
        Ok(self.repo.cities().await?)
    }

    async fn owned(&self, actor: Uuid, id: Uuid) -> WorkflowResult<Property> {
        let property = self.repo.find(id).await?.ok_or(WorkflowError::NotFound)?;
        if property.user_id != actor {
            warn!(property_id = %id, %actor, owner = %property.user_id, "listing access denied");
            return Err(WorkflowError::Forbidden);
        }
        Ok(property)
    }
}
