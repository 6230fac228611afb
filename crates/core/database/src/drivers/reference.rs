use std::{collections::HashMap, sync::Arc};

use futures::lock::Mutex;

use crate::{Reminder, User};

database_derived!(
    /// Reference implementation
    #[derive(Default)]
    pub struct ReferenceDb {
        pub reminders: Arc<Mutex<HashMap<String, Reminder>>>,
        pub users: Arc<Mutex<HashMap<String, User>>>,
    }
);

impl ReferenceDb {
    /// Remove all stored data
    pub async fn clear(&self) {
        self.reminders.lock().await.clear();
        self.users.lock().await.clear();
    }
}
