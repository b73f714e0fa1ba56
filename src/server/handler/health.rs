use actix_web::get;
use actix_web::web::{Data, Json};
use rorm::{query, Database, Model};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{User, UserLocation};
use crate::server::handler::{ApiErrorResponse, ApiResult};

/// The health data of this server
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = 1337)]
    registered_users: u64,
    #[schema(example = 420)]
    tracked_locations: u64,
}

/// Request health data from this server.
///
/// `registered_users` are the currently registered users on the server
/// `tracked_locations` are the users that have published a location
#[utoipa::path(
    tag = "Server status",
    context_path = "/api/v1/admin",
    responses(
        (status = 200, description = "Health data of this server", body = HealthResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/health")]
pub async fn health(db: Data<Database>) -> ApiResult<Json<HealthResponse>> {
    let users = query!(db.as_ref(), (User::F.uuid.count(),)).one().await?.0 as u64;

    let locations = query!(db.as_ref(), (UserLocation::F.uuid.count(),))
        .one()
        .await?
        .0 as u64;

    Ok(Json(HealthResponse {
        registered_users: users,
        tracked_locations: locations,
    }))
}
