//! The emergency call endpoint lives in here

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json};
use actix_web::post;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::server::handler::{ApiError, ApiErrorResponse, ApiResult};
use crate::service::EmergencyDispatcher;
use crate::store::DbStore;

/// The outcome of an emergency call
#[derive(Serialize, ToSchema)]
pub struct EmergencyCallResponse {
    /// Number of contacts a push notification was sent to
    #[schema(example = 3)]
    pub(crate) notified: usize,
    /// Number of contacts without a usable push token
    #[schema(example = 1)]
    pub(crate) skipped: usize,
}

/// Alert all emergency contacts of the current user.
///
/// Contacts without a registered push token are skipped, the call succeeds
/// as long as the contact list could be read.
#[utoipa::path(
    tag = "Emergency",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The alert was dispatched", body = EmergencyCallResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[post("/emergency-call")]
pub async fn emergency_call(
    session: Session,
    dispatcher: Data<EmergencyDispatcher<DbStore>>,
) -> ApiResult<Json<EmergencyCallResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let report = dispatcher.trigger(uuid).await?;

    Ok(Json(EmergencyCallResponse {
        notified: report.notified.len(),
        skipped: report.skipped.len(),
    }))
}
