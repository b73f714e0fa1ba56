//! This module holds the definition of the swagger declaration

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::server::handler;

struct CookieSecurity;

impl Modify for CookieSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("id"))),
            )
        }
    }
}

/// Helper struct for the openapi definitions.
#[derive(OpenApi)]
#[openapi(
    paths(
        handler::register_user,
        handler::get_me,
        handler::update_me,
        handler::set_password,
        handler::login,
        handler::logout,
        handler::create_friend_request,
        handler::accept_friend_request,
        handler::decline_friend_request,
        handler::get_emergency_contacts,
        handler::delete_emergency_contact,
        handler::discover_users,
        handler::update_location,
        handler::update_visibility,
        handler::get_friends_locations,
        handler::emergency_call,
        handler::get_metadata,
        handler::update_metadata,
        handler::set_push_token,
        handler::set_blood_type,
        handler::set_job,
        handler::set_allergies,
        handler::set_pre_existing_conditions,
        handler::set_medication,
        handler::set_vaccination_status,
        handler::health,
    ),
    components(schemas(
        handler::ApiErrorResponse,
        handler::ApiStatusCode,
        handler::RegisterUserRequest,
        handler::LoginRequest,
        handler::UserResponse,
        handler::SetPasswordRequest,
        handler::UpdateMeRequest,
        handler::EmergencyContactsResponse,
        handler::DiscoverableUserResponse,
        handler::DiscoverUsersResponse,
        handler::UpdateLocationRequest,
        handler::UpdateVisibilityRequest,
        handler::LocationResponse,
        handler::FriendsLocationsResponse,
        handler::EmergencyCallResponse,
        handler::SetPushTokenRequest,
        handler::SetAttributeRequest,
        handler::HealthResponse,
    )),
    modifiers(&CookieSecurity)
)]
pub struct ApiDoc;
