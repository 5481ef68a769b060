use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::{AuthAdmin, AuthUser},
    error::{ApiError, JsonBody},
    images::services::{discard_image, read_form, store_image, ImageFolder},
    properties::{
        dto::{
            ApprovedPropertyResponse, BrowseQuery, DeletedPropertyResponse,
            PropertyIdQuery, PropertyResponse, SavedPropertyResponse,
        },
        repo_types::{City, NewProperty, Property, PropertyPatch},
        workflow::{ApprovalState, BrowseFilter},
    },
    state::AppState,
};

const INVALID_ID: &str = "Invalid property ID format.";

pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route("/addproperty", post(add_property))
        .route("/updateproperty/:id", put(update_property))
        .route("/deleteproperty/:id", delete(delete_property))
        .route("/getallownproperty", get(own_properties))
        .route("/getallpropertyt", get(browse))
        .route("/getallproperty", get(by_category))
        .route("/getallpropertyappt", get(approved_by_id))
        .route("/getallpropertyapp", get(pending_by_id))
        .route("/approveproperty/:id", put(approve_property))
        .route("/pending", get(pending))
        .route("/cities", get(cities))
}

fn parse_property_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(INVALID_ID.into()))
}

#[instrument(skip(state, user, mp), fields(owner = %user.id, owner_name = %user.name))]
pub async fn add_property(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> Result<Json<SavedPropertyResponse>, ApiError> {
    let form = read_form(mp, "image").await?;
    let (
        Some(name),
        Some(kind),
        Some(categories),
        Some(size),
        Some(address),
        Some(city),
        Some(condition),
    ) = (
        form.non_blank("name"),
        form.non_blank("type"),
        form.non_blank("categories"),
        form.non_blank("size"),
        form.non_blank("address"),
        form.non_blank("city"),
        form.non_blank("condition"),
    )
    else {
        return Err(ApiError::BadRequest("All fields are required".into()));
    };
    let Some(item) = form.image else {
        return Err(ApiError::BadRequest("Property image is required".into()));
    };

    let stored = store_image(state.storage.as_ref(), ImageFolder::Property, item).await?;
    let created = state
        .listings
        .create(NewProperty {
            user_id: user.id,
            image: stored.url.clone(),
            image_key: stored.key.clone(),
            name,
            kind,
            categories,
            size,
            address,
            city,
            condition,
        })
        .await;

    match created {
        Ok(saved_property) => Ok(Json(SavedPropertyResponse { saved_property })),
        Err(e) => {
            discard_image(state.storage.as_ref(), &stored.key).await;
            Err(e.into())
        }
    }
}

#[instrument(skip(state, patch), fields(actor = %user.id))]
pub async fn update_property(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<PropertyPatch>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let id = parse_property_id(&id)?;
    let property = state.listings.update(user.id, id, patch).await?;
    Ok(Json(PropertyResponse { property }))
}

#[instrument(skip(state), fields(actor = %user.id))]
pub async fn delete_property(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedPropertyResponse>, ApiError> {
    let id = parse_property_id(&id)?;
    let property = state.listings.delete(user.id, id).await?;
    discard_image(state.storage.as_ref(), &property.image_key).await;
    Ok(Json(DeletedPropertyResponse {
        success: "Property has been deleted",
        property,
    }))
}

#[instrument(skip(state), fields(owner = %user.id))]
pub async fn own_properties(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(state.listings.owned_by(user.id).await?))
}

#[instrument(skip(state))]
pub async fn browse(
    State(state): State<AppState>,
    Query(q): Query<BrowseQuery>,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(state.listings.browse(q.into()).await?))
}

#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Query(q): Query<BrowseQuery>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let filter = BrowseFilter::from(BrowseQuery {
        categories: q.categories,
        ..Default::default()
    });
    Ok(Json(state.listings.browse(filter).await?))
}

#[instrument(skip(state))]
pub async fn approved_by_id(
    State(state): State<AppState>,
    Query(q): Query<PropertyIdQuery>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let id = parse_property_id(q.property_id.as_deref().unwrap_or_default())?;
    Ok(Json(
        state.listings.by_id_in(id, ApprovalState::Approved).await?,
    ))
}

#[instrument(skip(state))]
pub async fn pending_by_id(
    State(state): State<AppState>,
    _admin: AuthAdmin,
    Query(q): Query<PropertyIdQuery>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let id = parse_property_id(q.property_id.as_deref().unwrap_or_default())?;
    Ok(Json(
        state.listings.by_id_in(id, ApprovalState::Pending).await?,
    ))
}

#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn approve_property(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApprovedPropertyResponse>, ApiError> {
    let id = parse_property_id(&id)?;
    let property = state.listings.approve(admin.id, id).await?;
    Ok(Json(ApprovedPropertyResponse {
        message: "Property approved successfully",
        property,
    }))
}

#[instrument(skip(state))]
pub async fn pending(
    State(state): State<AppState>,
    _admin: AuthAdmin,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(state.listings.pending().await?))
}

pub async fn cities(State(state): State<AppState>) -> Result<Json<Vec<City>>, ApiError> {
    Ok(Json(state.listings.cities().await?))
}
