use rorm::fields::types::ForeignModel;
use rorm::{Model, Patch};
use uuid::Uuid;

use crate::models::User;

/// The current location of a user.
///
/// There is at most one row per user. Coordinate updates rewrite it in place,
/// so the row is always the latest known position.
#[derive(Model)]
pub struct UserLocation {
    /// The primary key of a location
    #[rorm(primary_key)]
    pub uuid: Uuid,

    /// The user this location belongs to
    #[rorm(on_delete = "Cascade", on_update = "Cascade", unique)]
    pub user: ForeignModel<User>,

    /// Latitude in degrees, in [-90, 90]
    pub latitude: f64,

    /// Longitude in degrees, in [-180, 180]
    pub longitude: f64,

    /// Altitude in meters, if the device reported one
    pub altitude: Option<f64>,

    /// Reported accuracy in meters
    pub accuracy: Option<f64>,

    /// Whether friends may see this location
    pub visible_to_friends: bool,

    /// The last time coordinates or visibility changed
    #[rorm(auto_create_time, auto_update_time)]
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Patch)]
#[rorm(model = "UserLocation")]
pub(crate) struct UserLocationInsert {
    pub(crate) uuid: Uuid,
    pub(crate) user: ForeignModel<User>,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) altitude: Option<f64>,
    pub(crate) accuracy: Option<f64>,
    pub(crate) visible_to_friends: bool,
}
