//! All the database models live here.

pub use friend::*;
pub use location::*;
pub use pair::*;
pub use user::*;

mod friend;
mod location;
mod pair;
mod user;
