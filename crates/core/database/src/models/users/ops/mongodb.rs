use remind_result::Result;

use super::AbstractUsers;
use crate::{MongoDb, User};

static COL: &str = "users";

#[async_trait]
impl AbstractUsers for MongoDb {
    async fn fetch_user(&self, id: &str) -> Result<User> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        query!(self, insert_one, COL, user).map(|_| ())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        query!(self, delete_one_by_id, COL, id).map(|_| ())
    }
}
