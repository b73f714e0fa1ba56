//! All handlers for location sharing live in here

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json};
use actix_web::{get, patch, put, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::server::handler::{ApiError, ApiErrorResponse, ApiResult};
use crate::service::{LocationTracker, LocationUpdate};
use crate::store::{DbStore, LocationRecord};

/// The content of a location update
#[derive(Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    #[schema(example = 48.137)]
    latitude: f64,
    #[schema(example = 11.575)]
    longitude: f64,
    #[schema(example = 519.0)]
    altitude: Option<f64>,
    #[schema(example = 12.5)]
    accuracy: Option<f64>,
    /// If set, changes the visibility together with the coordinates
    visible_to_friends: Option<bool>,
}

/// A user's location as returned by the api
#[derive(Serialize, ToSchema)]
pub struct LocationResponse {
    pub(crate) user: Uuid,
    #[schema(example = 48.137)]
    pub(crate) latitude: f64,
    #[schema(example = 11.575)]
    pub(crate) longitude: f64,
    #[schema(example = 519.0)]
    pub(crate) altitude: Option<f64>,
    #[schema(example = 12.5)]
    pub(crate) accuracy: Option<f64>,
    pub(crate) visible_to_friends: bool,
    pub(crate) updated_at: chrono::NaiveDateTime,
}

impl From<LocationRecord> for LocationResponse {
    fn from(record: LocationRecord) -> Self {
        Self {
            user: record.user,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude: record.altitude,
            accuracy: record.accuracy,
            visible_to_friends: record.visible_to_friends,
            updated_at: record.updated_at,
        }
    }
}

/// Publish the current user's position.
///
/// The first update creates the location record, later updates overwrite it.
/// Out of range coordinates are rejected.
#[utoipa::path(
    tag = "Locations",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The stored location", body = LocationResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = UpdateLocationRequest,
    security(("session_cookie" = []))
)]
#[put("/locations/update")]
pub async fn update_location(
    req: Json<UpdateLocationRequest>,
    session: Session,
    locations: Data<LocationTracker<DbStore>>,
) -> ApiResult<Json<LocationResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let record = locations
        .update(
            uuid,
            LocationUpdate {
                latitude: req.latitude,
                longitude: req.longitude,
                altitude: req.altitude,
                accuracy: req.accuracy,
                visible_to_friends: req.visible_to_friends,
            },
        )
        .await?;

    Ok(Json(record.into()))
}

/// The content of a visibility change
#[derive(Deserialize, ToSchema)]
pub struct UpdateVisibilityRequest {
    visible: Option<bool>,
}

/// Change whether emergency contacts may see the current user's location.
///
/// Requires that the user has published a location before.
#[utoipa::path(
    tag = "Locations",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The stored location", body = LocationResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = UpdateVisibilityRequest,
    security(("session_cookie" = []))
)]
#[patch("/locations/visibility")]
pub async fn update_visibility(
    req: Json<UpdateVisibilityRequest>,
    session: Session,
    locations: Data<LocationTracker<DbStore>>,
) -> ApiResult<Json<LocationResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let visible = req.visible.ok_or(ApiError::MissingField("visible"))?;

    let record = locations.set_visibility(uuid, visible).await?;

    Ok(Json(record.into()))
}

/// The locations of all emergency contacts that share theirs
#[derive(Serialize, ToSchema)]
pub struct FriendsLocationsResponse {
    pub(crate) locations: Vec<LocationResponse>,
}

/// Retrieve the locations of the current user's emergency contacts.
///
/// Contacts that never published a location or hid it are left out.
#[utoipa::path(
    tag = "Locations",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The visible contact locations", body = FriendsLocationsResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/locations/friends")]
pub async fn get_friends_locations(
    session: Session,
    locations: Data<LocationTracker<DbStore>>,
) -> ApiResult<Json<FriendsLocationsResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let records = locations.friends_locations(uuid).await?;

    Ok(Json(FriendsLocationsResponse {
        locations: records.into_iter().map(LocationResponse::from).collect(),
    }))
}
