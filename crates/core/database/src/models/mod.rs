mod reminders;
mod users;

pub use reminders::*;
pub use users::*;

use crate::ReferenceDb;
#[cfg(feature = "mongodb")]
use crate::MongoDb;
use crate::Database;

pub trait AbstractDatabase:
    Sync + Send + reminders::AbstractReminders + users::AbstractUsers
{
}

impl AbstractDatabase for ReferenceDb {}
#[cfg(feature = "mongodb")]
impl AbstractDatabase for MongoDb {}

impl std::ops::Deref for Database {
    type Target = dyn AbstractDatabase;

    fn deref(&self) -> &Self::Target {
        match &self {
            Database::Reference(dummy) => dummy,
            #[cfg(feature = "mongodb")]
            Database::MongoDb(mongo) => mongo,
        }
    }
}
