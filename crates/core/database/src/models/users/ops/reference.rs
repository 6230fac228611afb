use remind_result::Result;

use super::AbstractUsers;
use crate::{ReferenceDb, User};

#[async_trait]
impl AbstractUsers for ReferenceDb {
    async fn fetch_user(&self, id: &str) -> Result<User> {
        let users = self.users.lock().await;
        users
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) {
            return Err(create_error!(InvalidOperation));
        }

        users.insert(user.id.to_string(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        let mut users = self.users.lock().await;
        users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| create_error!(NotFound))
    }
}
