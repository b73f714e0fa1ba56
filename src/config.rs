//! This module holds the configuration for the server

use std::net::IpAddr;

use actix_toolbox::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Configuration regarding the server
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ServerConfig {
    /// The address the server should bind to
    pub listen_address: IpAddr,
    /// The port the server should bind to
    pub listen_port: u16,
    /// Base64 encoded secret key used for signing session cookies.
    ///
    /// Must decode to at least 64 bytes.
    pub secret_key: String,
}

/// Configuration regarding the database
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct DBConfig {
    /// Host the database is running on
    pub host: String,
    /// Port the database is running on
    pub port: u16,
    /// Name of the database
    pub name: String,
    /// User to connect with
    pub user: String,
    /// Password to connect with
    pub password: String,
}

/// Configuration regarding the push notification gateway
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct NotifierConfig {
    /// Base endpoint of the push gateway
    pub endpoint: String,
    /// Timeout for a single push request, in seconds
    pub request_timeout: u64,
}

/// This struct can be parsed from the configuration file
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Configuration regarding the server
    pub server: ServerConfig,
    /// Configuration regarding the database
    pub database: DBConfig,
    /// Configuration regarding the push notification gateway
    pub notifier: NotifierConfig,
    /// The logging configuration
    pub logging: LoggingConfig,
}
