//! All handlers for the user account endpoints live in here

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json};
use actix_web::{get, post, put, HttpResponse};
use argon2::password_hash::{Error, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::thread_rng;
use rorm::{insert, query, update, Database, FieldAccess, Model};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{User, UserInsert};
use crate::server::handler::{ApiError, ApiErrorResponse, ApiResult};

/// The content to register a new user
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    #[schema(example = "user123")]
    username: String,
    #[schema(example = "user123@example.com")]
    email: String,
    #[schema(example = "Herbert")]
    first_name: String,
    #[schema(example = "Meier")]
    last_name: String,
    #[schema(example = "super-secure-password")]
    password: String,
}

/// Register a new user
#[utoipa::path(
    tag = "Users",
    responses(
        (status = 200, description = "User got created"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = RegisterUserRequest,
)]
#[post("/api/v1/users/register")]
pub async fn register_user(
    req: Json<RegisterUserRequest>,
    db: Data<Database>,
) -> ApiResult<HttpResponse> {
    if req.username.is_empty() {
        return Err(ApiError::MissingField("username"));
    }

    // A full rfc compliant check is not worth the trouble here
    if !req.email.contains('@') {
        return Err(ApiError::MissingField("email"));
    }

    if req.password.is_empty() {
        return Err(ApiError::InvalidPassword);
    }

    let mut tx = db.start_transaction().await?;

    if query!(&mut tx, (User::F.uuid,))
        .condition(User::F.username.equals(&req.username))
        .optional()
        .await?
        .is_some()
    {
        return Err(ApiError::UsernameAlreadyOccupied);
    }

    let salt = SaltString::generate(&mut thread_rng());
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)?
        .to_string();

    insert!(&mut tx, UserInsert)
        .single(&UserInsert {
            uuid: Uuid::new_v4(),
            username: req.username.clone(),
            email: req.email.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            password_hash,
        })
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().finish())
}

/// The user account data
#[derive(Serialize, Deserialize, ToSchema, Eq, Ord, PartialOrd, PartialEq, Clone, Debug)]
pub struct UserResponse {
    pub(crate) uuid: Uuid,
    #[schema(example = "user123")]
    pub(crate) username: String,
    #[schema(example = "user123@example.com")]
    pub(crate) email: String,
    #[schema(example = "Herbert")]
    pub(crate) first_name: String,
    #[schema(example = "Meier")]
    pub(crate) last_name: String,
}

/// Returns the user that is currently logged-in
#[utoipa::path(
    tag = "Users",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Returns the account data of the current user", body = UserResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/users/me")]
pub async fn get_me(db: Data<Database>, session: Session) -> ApiResult<Json<UserResponse>> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let user = query!(db.as_ref(), User)
        .condition(User::F.uuid.equals(uuid))
        .optional()
        .await?
        .ok_or(ApiError::SessionCorrupt)?;

    Ok(Json(UserResponse {
        uuid,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// Update account request data
///
/// All parameter are optional, but at least one of them is required.
#[derive(Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    #[schema(example = "user321")]
    username: Option<String>,
    #[schema(example = "user321@example.com")]
    email: Option<String>,
    #[schema(example = "Heeeerbeeeert")]
    first_name: Option<String>,
    #[schema(example = "Meier")]
    last_name: Option<String>,
}

/// Updates the currently logged-in user
///
/// All parameter are optional, but at least one of them is required.
#[utoipa::path(
    tag = "Users",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Account has been updated"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = UpdateMeRequest,
    security(("session_cookie" = []))
)]
#[put("/users/me")]
pub async fn update_me(
    req: Json<UpdateMeRequest>,
    db: Data<Database>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    let mut tx = db.start_transaction().await?;

    if let Some(username) = &req.username {
        if username.is_empty() {
            return Err(ApiError::MissingField("username"));
        }

        if query!(&mut tx, (User::F.uuid,))
            .condition(User::F.username.equals(username))
            .optional()
            .await?
            .is_some()
        {
            return Err(ApiError::UsernameAlreadyOccupied);
        }
    }

    if let Some(email) = &req.email {
        if !email.contains('@') {
            return Err(ApiError::MissingField("email"));
        }
    }

    update!(&mut tx, User)
        .condition(User::F.uuid.equals(uuid))
        .begin_dyn_set()
        .set_if(User::F.username, req.username.clone())
        .set_if(User::F.email, req.email.clone())
        .set_if(User::F.first_name, req.first_name.clone())
        .set_if(User::F.last_name, req.last_name.clone())
        .finish_dyn_set()
        .map_err(|_| ApiError::EmptyJson)?
        .exec()
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().finish())
}

/// The set password request data
///
/// The parameter `new_password` must not be empty
#[derive(Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    #[schema(example = "super-secure-password")]
    old_password: String,
    #[schema(example = "ultra-secure-password!!11!")]
    new_password: String,
}

/// Sets a new password for the currently logged-in user
#[utoipa::path(
    tag = "Users",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "New password has been set"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = SetPasswordRequest,
    security(("session_cookie" = []))
)]
#[post("/users/me/setPassword")]
pub async fn set_password(
    req: Json<SetPasswordRequest>,
    db: Data<Database>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let uuid: Uuid = session.get("uuid")?.ok_or(ApiError::SessionCorrupt)?;

    if req.new_password.is_empty() {
        return Err(ApiError::InvalidPassword);
    }

    let mut tx = db.start_transaction().await?;

    let (pw_hash,) = query!(&mut tx, (User::F.password_hash,))
        .condition(User::F.uuid.equals(uuid))
        .optional()
        .await?
        .ok_or(ApiError::SessionCorrupt)?;

    Argon2::default()
        .verify_password(req.old_password.as_bytes(), &PasswordHash::new(&pw_hash)?)
        .map_err(|e| match e {
            Error::Password => ApiError::LoginFailed,
            _ => ApiError::InvalidHash(e),
        })?;

    let salt = SaltString::generate(&mut thread_rng());
    let password_hash = Argon2::default()
        .hash_password(req.new_password.as_bytes(), &salt)?
        .to_string();

    update!(&mut tx, User)
        .condition(User::F.uuid.equals(uuid))
        .set(User::F.password_hash, password_hash)
        .exec()
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().finish())
}
