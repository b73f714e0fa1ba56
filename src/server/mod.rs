//! This module holds the server definition

use std::net::SocketAddr;
use std::sync::Arc;

use actix_toolbox::tb_middleware::{
    setup_logging_mw, DBSessionStore, LoggingMiddlewareConfig, PersistentSession,
    SessionMiddleware,
};
use actix_web::cookie::time::Duration;
use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::middleware::{Compress, ErrorHandlers};
use actix_web::web::{scope, Data, JsonConfig, PayloadConfig};
use actix_web::{App, HttpServer};
use base64::prelude::*;
use log::info;
use rorm::Database;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::chan::PushManagerChan;
use crate::config::Config;
use crate::server::error::StartServerError;
use crate::server::handler::{
    accept_friend_request, create_friend_request, decline_friend_request,
    delete_emergency_contact, discover_users, emergency_call, get_emergency_contacts,
    get_friends_locations, get_me, get_metadata, health, login, logout, register_user,
    set_allergies, set_blood_type, set_job, set_medication, set_password,
    set_pre_existing_conditions, set_push_token, set_vaccination_status, update_location,
    update_me, update_metadata, update_visibility,
};
use crate::server::middleware::{handle_not_found, json_extractor_error, AuthenticationRequired};
use crate::server::swagger::ApiDoc;
use crate::service::{
    DiscoveryResolver, EmergencyDispatcher, FriendRequestEngine, FriendshipGraph,
    LocationTracker, UserDirectory,
};
use crate::store::DbStore;

pub mod error;
pub mod handler;
pub mod middleware;
pub mod swagger;

/// Start the safenet server
///
/// **Parameter**:
/// - `config`: Reference to a [Config] struct
/// - `db`: [Database]
/// - `push_manager_chan`: [PushManagerChan] : The channel the push notifier listens on
pub async fn start_server(
    config: &Config,
    db: Database,
    push_manager_chan: PushManagerChan,
) -> Result<(), StartServerError> {
    let s_addr = SocketAddr::new(config.server.listen_address, config.server.listen_port);

    info!("Starting to listen on {}", s_addr);

    let key = BASE64_STANDARD
        .decode(&config.server.secret_key)
        .map_err(|_| StartServerError::InvalidSecretKey)?;
    let key = Key::try_from(key.as_slice()).map_err(|_| StartServerError::InvalidSecretKey)?;

    let store = Arc::new(DbStore::new(db.clone()));

    let friend_requests = Data::new(FriendRequestEngine::new(store.clone()));
    let friendships = Data::new(FriendshipGraph::new(store.clone()));
    let discovery = Data::new(DiscoveryResolver::new(store.clone()));
    let locations = Data::new(LocationTracker::new(store.clone()));
    let directory = Data::new(UserDirectory::new(store.clone()));
    let dispatcher = Data::new(EmergencyDispatcher::new(store, push_manager_chan));

    HttpServer::new(move || {
        App::new()
            .app_data(PayloadConfig::default())
            .app_data(JsonConfig::default().error_handler(json_extractor_error))
            .app_data(Data::new(db.clone()))
            .app_data(friend_requests.clone())
            .app_data(friendships.clone())
            .app_data(discovery.clone())
            .app_data(locations.clone())
            .app_data(directory.clone())
            .app_data(dispatcher.clone())
            .wrap(setup_logging_mw(LoggingMiddlewareConfig::default()))
            .wrap(
                SessionMiddleware::builder(DBSessionStore::new(db.clone()), key.clone())
                    .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(30)))
                    .build(),
            )
            .wrap(Compress::default())
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, handle_not_found))
            .service(SwaggerUi::new("/docs/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
            .service(register_user)
            .service(scope("/api/v1/auth").service(login).service(logout))
            .service(
                scope("/api/v1")
                    .wrap(AuthenticationRequired)
                    .service(get_me)
                    .service(update_me)
                    .service(set_password)
                    .service(create_friend_request)
                    .service(accept_friend_request)
                    .service(decline_friend_request)
                    .service(get_emergency_contacts)
                    .service(delete_emergency_contact)
                    .service(discover_users)
                    .service(update_location)
                    .service(update_visibility)
                    .service(get_friends_locations)
                    .service(emergency_call)
                    .service(get_metadata)
                    .service(update_metadata)
                    .service(set_push_token)
                    .service(set_blood_type)
                    .service(set_job)
                    .service(set_allergies)
                    .service(set_pre_existing_conditions)
                    .service(set_medication)
                    .service(set_vaccination_status)
                    .service(scope("/admin").service(health)),
            )
    })
    .bind(s_addr)?
    .run()
    .await?;

    Ok(())
}
