//! Property listing routes.
//!
//! Reads flow through the query compiler; writes that touch an address
//! component run the geocoding cascade before anything is persisted.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::common::PropertyId;
use crate::domains::properties::geocode::{resolve_if_changed, Address};
use crate::domains::properties::models::{
    ListingStatus, NewProperty, Property, PropertyType, SaleType, DEFAULT_PROPERTY_IMAGE,
};
use crate::domains::properties::query::{ListingQuery, QueryDefaults};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthAgent;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub house_number: String,
    pub street: String,
    pub city: String,
}

impl LocationInput {
    fn into_address(self) -> Address {
        Address {
            house_number: self.house_number,
            street: self.street,
            city: self.city,
        }
    }
}

/// Create payload. Required fields are optional here so the handler can
/// answer with the API's own 400 envelope instead of a deserialization
/// rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub title: Option<String>,
    pub property_type: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub area: Option<i32>,
    pub sale_type: Option<String>,
    pub location: Option<LocationInput>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub status: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub property_type: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub location: Option<LocationInput>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub status: Option<String>,
    pub images: Option<Vec<String>>,
}

impl UpdatePropertyRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.property_type.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.area.is_none()
            && self.status.is_none()
            && self.images.is_none()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_id(raw: &str) -> Result<PropertyId, ApiError> {
    PropertyId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid property ID".to_string()))
}

/// GET /api/properties
pub async fn list_properties(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let plan = ListingQuery::compile(params, QueryDefaults::default());
    let (properties, total) = Property::search(&plan, &state.db_pool).await?;

    if properties.is_empty() {
        return Err(ApiError::NotFound("No properties found".to_string()));
    }

    let properties: Vec<serde_json::Value> = properties
        .into_iter()
        .map(|p| serde_json::to_value(p).map(|v| plan.projection.apply(v)))
        .collect::<Result<_, _>>()
        .map_err(anyhow::Error::from)?;

    Ok(Json(json!({
        "status": "success",
        "totalProperties": total,
        "properties": properties,
    })))
}

/// GET /api/properties/:id
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&id)?;
    let property = Property::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "property": property,
    })))
}

/// POST /api/properties
pub async fn add_property(
    State(state): State<AppState>,
    agent: AuthAgent,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (
        Some(title),
        Some(property_type),
        Some(price),
        Some(description),
        Some(area),
        Some(sale_type),
        Some(location),
    ) = (
        non_empty(req.title),
        non_empty(req.property_type),
        req.price,
        non_empty(req.description),
        req.area,
        non_empty(req.sale_type),
        req.location,
    )
    else {
        return Err(ApiError::BadRequest(
            "Please provide all the required fields".to_string(),
        ));
    };

    if location.house_number.trim().is_empty()
        || location.street.trim().is_empty()
        || location.city.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Please provide all the required fields".to_string(),
        ));
    }

    let property_type: PropertyType = property_type
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;
    let sale_type: SaleType = sale_type
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;
    let status = match req.status {
        Some(s) => s
            .parse::<ListingStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => ListingStatus::Available,
    };

    // A new listing always resolves its address before the insert; a failed
    // cascade aborts the whole write.
    let address = location.into_address();
    let point = state.resolver.resolve(&address).await?;

    let new = NewProperty {
        agent_id: agent.0,
        title,
        property_type: property_type.to_string(),
        description,
        price,
        bedrooms: req.bedrooms.unwrap_or(1),
        bathrooms: req.bathrooms.unwrap_or(1),
        area,
        status: status.to_string(),
        sale_type: sale_type.to_string(),
        images: req
            .images
            .unwrap_or_else(|| vec![DEFAULT_PROPERTY_IMAGE.to_string()]),
        house_number: address.house_number,
        street: address.street,
        city: address.city,
    };
    let property = Property::create(new, point, &state.db_pool).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "property": property,
        })),
    ))
}

/// PATCH /api/properties/:id
pub async fn edit_property(
    State(state): State<AppState>,
    agent: AuthAgent,
    Path(id): Path<String>,
    Json(req): Json<UpdatePropertyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&id)?;
    let mut property = Property::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property not found".to_string()))?;

    if property.agent_id != agent.0 {
        return Err(ApiError::Forbidden(
            "You are not allowed to edit this property".to_string(),
        ));
    }
    if req.is_empty() {
        return Err(ApiError::BadRequest(
            "Please provide at least one field to update".to_string(),
        ));
    }

    let previous_address = Address {
        house_number: property.house_number.clone(),
        street: property.street.clone(),
        city: property.city.clone(),
    };

    if let Some(title) = non_empty(req.title) {
        property.title = title;
    }
    if let Some(property_type) = non_empty(req.property_type) {
        property.property_type = property_type
            .parse::<PropertyType>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .to_string();
    }
    if let Some(price) = req.price {
        property.price = price;
    }
    if let Some(description) = non_empty(req.description) {
        property.description = description;
    }
    if let Some(bedrooms) = req.bedrooms {
        property.bedrooms = bedrooms;
    }
    if let Some(bathrooms) = req.bathrooms {
        property.bathrooms = bathrooms;
    }
    if let Some(area) = req.area {
        property.area = area;
    }
    if let Some(status) = non_empty(req.status) {
        property.status = status
            .parse::<ListingStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .to_string();
    }
    if let Some(images) = req.images {
        property.images = images;
    }

    if let Some(location) = req.location {
        if location.house_number.trim().is_empty()
            || location.street.trim().is_empty()
            || location.city.trim().is_empty()
        {
            return Err(ApiError::BadRequest(
                "Please provide a complete address".to_string(),
            ));
        }
        let address = location.into_address();
        // Only a changed house number, street, or city re-runs the cascade;
        // an identical address keeps its stored coordinates untouched.
        if let Some(point) =
            resolve_if_changed(&state.resolver, Some(&previous_address), &address).await?
        {
            property.latitude = point.lat;
            property.longitude = point.lng;
            property.zoom = point.zoom;
        }
        property.house_number = address.house_number;
        property.street = address.street;
        property.city = address.city;
    }

    let property = property.update(&state.db_pool).await?;

    Ok(Json(json!({
        "status": "success",
        "property": property,
    })))
}

/// DELETE /api/properties/:id
pub async fn delete_property(
    State(state): State<AppState>,
    agent: AuthAgent,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&id)?;
    let property = Property::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property not found".to_string()))?;

    if property.agent_id != agent.0 {
        return Err(ApiError::Forbidden(
            "You are not allowed to delete this property".to_string(),
        ));
    }

    Property::delete(id, &state.db_pool).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Property has been deleted",
    })))
}
