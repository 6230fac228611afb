use remind_result::Result;

use crate::User;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractUsers: Sync + Send {
    /// Fetch a user from the database
    async fn fetch_user(&self, id: &str) -> Result<User>;

    /// Insert a new user
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Delete a user by their id
    async fn delete_user(&self, id: &str) -> Result<()>;
}
