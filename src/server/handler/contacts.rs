//! All handlers around emergency contacts: friend requests, the contact list
//! and user discovery

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, HttpResponse};
use log::warn;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::server::handler::{ApiError, ApiErrorResponse, ApiResult, PathUuid, UserResponse};
use crate::service::{DiscoveryResolver, FriendRequestEngine, FriendshipGraph};
use crate::store::DbStore;

/// Send a friend request to the user given by the path
#[utoipa::path(
    tag = "Contacts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Friend request was sent"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[post("/users/{uuid}/friend-request")]
pub async fn create_friend_request(
    path: Path<PathUuid>,
    session: Session,
    requests: Data<FriendRequestEngine<DbStore>>,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    requests.send(uuid, path.uuid).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Accept the friend request sent by the user given by the path
#[utoipa::path(
    tag = "Contacts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Friend request was accepted"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[post("/users/{uuid}/friend-request/accept")]
pub async fn accept_friend_request(
    path: Path<PathUuid>,
    session: Session,
    requests: Data<FriendRequestEngine<DbStore>>,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    requests.accept(path.uuid, uuid).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Decline the friend request sent by the user given by the path
#[utoipa::path(
    tag = "Contacts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Friend request was declined"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[post("/users/{uuid}/friend-request/decline")]
pub async fn decline_friend_request(
    path: Path<PathUuid>,
    session: Session,
    requests: Data<FriendRequestEngine<DbStore>>,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    requests.reject(path.uuid, uuid).await?;

    Ok(HttpResponse::Ok().finish())
}

/// The list of the current user's emergency contacts
#[derive(Serialize, ToSchema)]
pub struct EmergencyContactsResponse {
    pub(crate) contacts: Vec<UserResponse>,
}

/// Retrieve all emergency contacts of the currently logged-in user
#[utoipa::path(
    tag = "Contacts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The current user's emergency contacts", body = EmergencyContactsResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/emergency-contacts")]
pub async fn get_emergency_contacts(
    session: Session,
    friendships: Data<FriendshipGraph<DbStore>>,
) -> ApiResult<Json<EmergencyContactsResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let contacts = friendships
        .friends_of(uuid)
        .await?
        .into_iter()
        .map(|profile| UserResponse {
            uuid: profile.uuid,
            username: profile.username,
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
        })
        .collect();

    Ok(Json(EmergencyContactsResponse { contacts }))
}

/// Remove the user given by the path from the current user's emergency
/// contacts.
///
/// This also clears the answered friend request between both users, so a new
/// request can be sent afterwards.
#[utoipa::path(
    tag = "Contacts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The contact was removed"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[delete("/emergency-contacts/{uuid}")]
pub async fn delete_emergency_contact(
    path: Path<PathUuid>,
    session: Session,
    friendships: Data<FriendshipGraph<DbStore>>,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    friendships.remove(uuid, path.uuid).await?;

    Ok(HttpResponse::Ok().finish())
}

/// A user as shown in discovery
#[derive(Serialize, ToSchema)]
pub struct DiscoverableUserResponse {
    pub(crate) uuid: Uuid,
    #[schema(example = "user123")]
    pub(crate) username: String,
    #[schema(example = "user123@example.com")]
    pub(crate) email: String,
    #[schema(example = 3)]
    pub(crate) mutual_friends: usize,
    #[schema(example = "none")]
    pub(crate) status: &'static str,
}

/// The discovery listing
#[derive(Serialize, ToSchema)]
pub struct DiscoverUsersResponse {
    pub(crate) users: Vec<DiscoverableUserResponse>,
}

/// List all other users, annotated with their relation to the current user
/// and the number of shared emergency contacts.
///
/// Candidates whose mutual contact count could not be computed are still
/// listed, with the count degraded to 0.
#[utoipa::path(
    tag = "Contacts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "All discoverable users", body = DiscoverUsersResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/users/discover")]
pub async fn discover_users(
    session: Session,
    discovery: Data<DiscoveryResolver<DbStore>>,
) -> ApiResult<Json<DiscoverUsersResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let listing = discovery.discoverable_users(uuid).await?;

    for warning in &listing.warnings {
        warn!("Degraded discovery result for {uuid}: {warning}");
    }

    Ok(Json(DiscoverUsersResponse {
        users: listing
            .users
            .into_iter()
            .map(|user| DiscoverableUserResponse {
                uuid: user.uuid,
                username: user.username,
                email: user.email,
                mutual_friends: user.mutual_friends,
                status: user.status.as_str(),
            })
            .collect(),
    }))
}
