//! Handlers for the user metadata mapping and its typed shortcuts.
//!
//! Metadata is a free-form string mapping per user. The typed endpoints below
//! write well-known keys so clients don't have to agree on spellings.

use std::collections::HashMap;

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json};
use actix_web::{get, put, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::server::handler::{ApiError, ApiErrorResponse, ApiResult};
use crate::service::{UserDirectory, PUSH_TOKEN_KEY};
use crate::store::DbStore;

/// Retrieve the full metadata mapping of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The user's metadata", body = HashMap<String, String>),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/users/me/metadata")]
pub async fn get_metadata(
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<Json<HashMap<String, String>>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    Ok(Json(directory.metadata(uuid).await?))
}

/// Merge entries into the metadata mapping of the current user.
///
/// Existing keys are overwritten, keys not named in the body are kept.
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The metadata after the merge", body = HashMap<String, String>),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = HashMap<String, String>,
    security(("session_cookie" = []))
)]
#[put("/users/me/metadata")]
pub async fn update_metadata(
    req: Json<HashMap<String, String>>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<Json<HashMap<String, String>>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    if req.is_empty() {
        return Err(ApiError::EmptyJson);
    }

    Ok(Json(directory.merge_metadata(uuid, req.into_inner()).await?))
}

/// The content of a push token registration
#[derive(Deserialize, ToSchema)]
pub struct SetPushTokenRequest {
    #[schema(example = "ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]")]
    token: String,
}

/// Register the device push token of the current user.
///
/// Without a token the user can not be alerted by emergency calls.
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The push token was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetPushTokenRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/push-token")]
pub async fn set_push_token(
    req: Json<SetPushTokenRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    if req.token.is_empty() {
        return Err(ApiError::MissingField("token"));
    }

    directory
        .set_attribute(uuid, PUSH_TOKEN_KEY, req.token.clone())
        .await?;

    Ok(HttpResponse::Ok().finish())
}

/// The content of a typed metadata update
#[derive(Deserialize, ToSchema)]
pub struct SetAttributeRequest {
    #[schema(example = "A+")]
    value: String,
}

async fn set_typed_attribute(
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
    key: &'static str,
    value: String,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    if value.is_empty() {
        return Err(ApiError::MissingField("value"));
    }

    directory.set_attribute(uuid, key, value).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Set the blood type of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The attribute was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetAttributeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/medical/blood-type")]
pub async fn set_blood_type(
    req: Json<SetAttributeRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    set_typed_attribute(session, directory, "bloodType", req.into_inner().value).await
}

/// Set the job of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The attribute was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetAttributeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/medical/job")]
pub async fn set_job(
    req: Json<SetAttributeRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    set_typed_attribute(session, directory, "job", req.into_inner().value).await
}

/// Set the allergies of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The attribute was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetAttributeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/medical/allergies")]
pub async fn set_allergies(
    req: Json<SetAttributeRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    set_typed_attribute(session, directory, "allergies", req.into_inner().value).await
}

/// Set the pre-existing conditions of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The attribute was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetAttributeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/medical/pre-existing-conditions")]
pub async fn set_pre_existing_conditions(
    req: Json<SetAttributeRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    set_typed_attribute(
        session,
        directory,
        "pre_existingConditions",
        req.into_inner().value,
    )
    .await
}

/// Set the medication of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The attribute was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetAttributeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/medical/medication")]
pub async fn set_medication(
    req: Json<SetAttributeRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    set_typed_attribute(session, directory, "medication", req.into_inner().value).await
}

/// Set the vaccination status of the current user
#[utoipa::path(
    tag = "Metadata",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The attribute was stored"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetAttributeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me/medical/vaccination-status")]
pub async fn set_vaccination_status(
    req: Json<SetAttributeRequest>,
    session: Session,
    directory: Data<UserDirectory<DbStore>>,
) -> ApiResult<HttpResponse> {
    set_typed_attribute(session, directory, "vaccinationStatus", req.into_inner().value).await
}
