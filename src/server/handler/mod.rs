//! This module holds the handler of safenet

use std::fmt::{Display, Formatter};

use actix_toolbox::tb_middleware::actix_session::{SessionGetError, SessionInsertError};
use actix_web::body::BoxBody;
use actix_web::HttpResponse;
use log::{debug, error, info, trace, warn};
use serde::Deserialize;
use serde::Serialize;
use serde_repr::Serialize_repr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::service::ServiceError;
use crate::store::StoreError;

pub use crate::server::handler::accounts::*;
pub use crate::server::handler::auth::*;
pub use crate::server::handler::contacts::*;
pub use crate::server::handler::emergency::*;
pub use crate::server::handler::health::*;
pub use crate::server::handler::locations::*;
pub use crate::server::handler::metadata::*;

pub mod accounts;
pub mod auth;
pub mod contacts;
pub mod emergency;
pub mod health;
pub mod locations;
pub mod metadata;

/// The result that is used throughout the complete api.
pub type ApiResult<T> = Result<T, ApiError>;

/// A path parameter holding a single user uuid
#[derive(Deserialize, IntoParams)]
pub(crate) struct PathUuid {
    pub(crate) uuid: Uuid,
}

#[derive(Serialize_repr, ToSchema)]
#[repr(u16)]
pub(crate) enum ApiStatusCode {
    Unauthenticated = 1000,
    LoginFailed = 1001,
    UsernameAlreadyOccupied = 1002,
    InvalidUuid = 1003,
    SessionCorrupt = 1004,
    InvalidPassword = 1005,
    EmptyJson = 1006,
    MissingField = 1007,
    SelfRelation = 1008,
    AlreadyFriends = 1009,
    FriendRequestAlreadyExists = 1010,
    FriendRequestNotFound = 1011,
    NotRequestRecipient = 1012,
    RequestNotPending = 1013,
    FriendshipNotFound = 1014,
    InvalidCoordinates = 1015,
    NoLocationData = 1016,
    NotFound = 1017,
    InvalidJson = 1018,

    InternalServerError = 2000,
    DatabaseError = 2001,
    SessionError = 2002,
}

#[derive(Serialize, ToSchema)]
pub(crate) struct ApiErrorResponse {
    #[schema(example = "Error message is here")]
    message: String,
    #[schema(example = 1000)]
    status_code: ApiStatusCode,
}

impl ApiErrorResponse {
    pub(crate) fn new(status_code: ApiStatusCode, message: String) -> Self {
        Self {
            message,
            status_code,
        }
    }
}

/// This enum holds all possible error types that can occur in the API
#[derive(Debug)]
pub enum ApiError {
    /// The user is not allowed to access the resource
    Unauthenticated,
    /// Login was not successful. Can be caused by incorrect username / password
    LoginFailed,
    /// The username is already occupied
    UsernameAlreadyOccupied,
    /// The uuid does not point to an existing user
    InvalidUuid,
    /// The session is in an invalid state
    SessionCorrupt,
    /// The chosen password is empty
    InvalidPassword,
    /// The json body contained no usable fields
    EmptyJson,
    /// A required field is missing from the request
    MissingField(&'static str),
    /// The target of the operation is the requesting user itself
    SelfRelation,
    /// Users are already emergency contacts of each other
    AlreadyFriends,
    /// There is already a friend request between those users
    FriendRequestAlreadyExists,
    /// No friend request exists between those users
    FriendRequestNotFound,
    /// Only the recipient of a friend request may answer it
    NotRequestRecipient,
    /// The friend request was already answered
    RequestNotPending,
    /// The users are no emergency contacts of each other
    FriendshipNotFound,
    /// Latitude or longitude is out of range
    InvalidCoordinates,
    /// The user has never published a location
    NoLocationData,
    /// The request body could not be parsed as json
    InvalidJson,

    /// Unspecified internal error
    InternalServerError,
    /// All errors that are thrown by the database
    DatabaseError(rorm::Error),
    /// An invalid hash is retrieved from the database
    InvalidHash(argon2::password_hash::Error),
    /// An error occurred while retrieving data from the session
    SessionGet(SessionGetError),
    /// An error occurred while inserting data into the session
    SessionInsert(SessionInsertError),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::LoginFailed => write!(f, "The login was not successful"),
            ApiError::UsernameAlreadyOccupied => write!(f, "Username is already occupied"),
            ApiError::InvalidUuid => write!(f, "No user was found for the given uuid"),
            ApiError::SessionCorrupt => write!(f, "Corrupt session"),
            ApiError::InvalidPassword => write!(f, "Invalid password"),
            ApiError::EmptyJson => write!(f, "The json body must not be empty"),
            ApiError::MissingField(field) => write!(f, "Missing field: {field}"),
            ApiError::SelfRelation => write!(f, "This operation can not target yourself"),
            ApiError::AlreadyFriends => write!(f, "You are already emergency contacts"),
            ApiError::FriendRequestAlreadyExists => {
                write!(f, "There is already a friend request between you")
            }
            ApiError::FriendRequestNotFound => write!(f, "Friend request was not found"),
            ApiError::NotRequestRecipient => {
                write!(f, "Only the recipient can answer a friend request")
            }
            ApiError::RequestNotPending => write!(f, "The friend request was already answered"),
            ApiError::FriendshipNotFound => write!(f, "You are no emergency contacts"),
            ApiError::InvalidCoordinates => {
                write!(f, "Latitude must be in [-90, 90], longitude in [-180, 180]")
            }
            ApiError::NoLocationData => write!(f, "No location data available"),
            ApiError::InvalidJson => write!(f, "Invalid json received"),
            ApiError::InternalServerError
            | ApiError::DatabaseError(_)
            | ApiError::InvalidHash(_)
            | ApiError::SessionGet(_)
            | ApiError::SessionInsert(_) => write!(f, "Internal server error"),
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            ApiError::Unauthenticated => {
                trace!("Unauthenticated");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::Unauthenticated,
                    self.to_string(),
                ))
            }
            ApiError::LoginFailed => {
                debug!("Login request failed");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::LoginFailed,
                    self.to_string(),
                ))
            }
            ApiError::UsernameAlreadyOccupied => {
                debug!("Username is already occupied");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::UsernameAlreadyOccupied,
                    self.to_string(),
                ))
            }
            ApiError::InvalidUuid => HttpResponse::NotFound().json(ApiErrorResponse::new(
                ApiStatusCode::InvalidUuid,
                self.to_string(),
            )),
            ApiError::SessionCorrupt => {
                warn!("Corrupt session");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::SessionCorrupt,
                    self.to_string(),
                ))
            }
            ApiError::InvalidPassword => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::InvalidPassword,
                self.to_string(),
            )),
            ApiError::EmptyJson => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::EmptyJson,
                self.to_string(),
            )),
            ApiError::MissingField(_) => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::MissingField,
                self.to_string(),
            )),
            ApiError::SelfRelation => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::SelfRelation,
                self.to_string(),
            )),
            ApiError::AlreadyFriends => HttpResponse::Conflict().json(ApiErrorResponse::new(
                ApiStatusCode::AlreadyFriends,
                self.to_string(),
            )),
            ApiError::FriendRequestAlreadyExists => HttpResponse::Conflict().json(
                ApiErrorResponse::new(ApiStatusCode::FriendRequestAlreadyExists, self.to_string()),
            ),
            ApiError::FriendRequestNotFound => HttpResponse::NotFound().json(
                ApiErrorResponse::new(ApiStatusCode::FriendRequestNotFound, self.to_string()),
            ),
            ApiError::NotRequestRecipient => HttpResponse::Forbidden().json(ApiErrorResponse::new(
                ApiStatusCode::NotRequestRecipient,
                self.to_string(),
            )),
            ApiError::RequestNotPending => HttpResponse::Conflict().json(ApiErrorResponse::new(
                ApiStatusCode::RequestNotPending,
                self.to_string(),
            )),
            ApiError::FriendshipNotFound => HttpResponse::NotFound().json(ApiErrorResponse::new(
                ApiStatusCode::FriendshipNotFound,
                self.to_string(),
            )),
            ApiError::InvalidCoordinates => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::InvalidCoordinates,
                self.to_string(),
            )),
            ApiError::NoLocationData => HttpResponse::NotFound().json(ApiErrorResponse::new(
                ApiStatusCode::NoLocationData,
                self.to_string(),
            )),
            ApiError::InvalidJson => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::InvalidJson,
                self.to_string(),
            )),
            ApiError::InternalServerError => HttpResponse::InternalServerError().json(
                ApiErrorResponse::new(ApiStatusCode::InternalServerError, self.to_string()),
            ),
            ApiError::DatabaseError(err) => {
                error!("Database error: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::DatabaseError,
                    self.to_string(),
                ))
            }
            ApiError::InvalidHash(err) => {
                error!("Got invalid password hash from db: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::InternalServerError,
                    self.to_string(),
                ))
            }
            ApiError::SessionGet(err) => {
                error!("Could not retrieve data from session: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::SessionError,
                    self.to_string(),
                ))
            }
            ApiError::SessionInsert(err) => {
                error!("Could not insert data into session: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::SessionError,
                    self.to_string(),
                ))
            }
        }
    }
}

impl From<rorm::Error> for ApiError {
    fn from(value: rorm::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::InvalidHash(value)
    }
}

impl From<SessionGetError> for ApiError {
    fn from(value: SessionGetError) -> Self {
        Self::SessionGet(value)
    }
}

impl From<SessionInsertError> for ApiError {
    fn from(value: SessionInsertError) -> Self {
        Self::SessionInsert(value)
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::UserNotFound => Self::InvalidUuid,
            ServiceError::RequestNotFound => Self::FriendRequestNotFound,
            ServiceError::FriendshipNotFound => Self::FriendshipNotFound,
            ServiceError::NoLocationData => Self::NoLocationData,
            ServiceError::DuplicateRequest => Self::FriendRequestAlreadyExists,
            ServiceError::AlreadyFriends => Self::AlreadyFriends,
            ServiceError::SelfRequest => Self::SelfRelation,
            ServiceError::RequestNotPending => Self::RequestNotPending,
            ServiceError::NotRequestRecipient => Self::NotRequestRecipient,
            ServiceError::InvalidCoordinate => Self::InvalidCoordinates,
            ServiceError::MissingField(field) => Self::MissingField(field),
            ServiceError::Store(StoreError::Database(err)) => Self::DatabaseError(err),
            ServiceError::Store(StoreError::Unavailable(reason)) => {
                info!("Storage unavailable: {reason}");

                Self::InternalServerError
            }
        }
    }
}
