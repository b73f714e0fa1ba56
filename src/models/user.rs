use rorm::fields::types::{BackRef, ForeignModel};
use rorm::{field, Model, Patch};
use uuid::Uuid;

/// A registered user
#[derive(Model)]
pub struct User {
    /// The primary key of a user.
    ///
    /// This will be a uuid.
    #[rorm(primary_key)]
    pub uuid: Uuid,

    /// The username of the user
    #[rorm(max_length = 255, unique)]
    pub username: String,

    /// The email address of the user
    #[rorm(max_length = 255)]
    pub email: String,

    /// The first name of the user
    #[rorm(max_length = 255)]
    pub first_name: String,

    /// The last name of the user
    #[rorm(max_length = 255)]
    pub last_name: String,

    /// The password hash of the user.
    #[rorm(max_length = 1024)]
    pub password_hash: String,

    /// Free-form profile attributes of this user.
    ///
    /// Medical data and the device push token live in here.
    pub meta: BackRef<field!(UserMetaEntry::F.user)>,

    /// The point in time the user registered
    #[rorm(auto_create_time)]
    pub created_at: chrono::NaiveDateTime,

    /// The last time the user record was changed
    #[rorm(auto_create_time, auto_update_time)]
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Patch)]
#[rorm(model = "User")]
pub(crate) struct UserInsert {
    pub(crate) uuid: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) password_hash: String,
}

/// A single key value entry of a user's metadata mapping.
///
/// Writes are last-writer-wins merges per key, the merge logic keeps at most
/// one row per `(user, key)`.
#[derive(Model)]
pub struct UserMetaEntry {
    /// Primary key of this entry
    #[rorm(id)]
    pub id: i64,

    /// The user this entry belongs to
    #[rorm(on_delete = "Cascade", on_update = "Cascade")]
    pub user: ForeignModel<User>,

    /// Name of the attribute
    #[rorm(max_length = 255)]
    pub key: String,

    /// Value of the attribute
    #[rorm(max_length = 1024)]
    pub value: String,
}

#[derive(Patch)]
#[rorm(model = "UserMetaEntry")]
pub(crate) struct UserMetaEntryInsert {
    pub(crate) user: ForeignModel<User>,
    pub(crate) key: String,
    pub(crate) value: String,
}
