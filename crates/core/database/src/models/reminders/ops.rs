use crate::models::reminders::{FieldsReminder, PartialReminder, Reminder};
use crate::util::date_keys::DateKeys;
use remind_result::Result;

#[cfg(feature = "mongodb")]
mod mongodb;
mod reference;

#[async_trait]
pub trait AbstractReminders: Sync + Send {
    /// Fetch a reminder by its id
    async fn fetch_reminder(&self, id: &str) -> Result<Reminder>;

    /// Fetch all reminders whose stored date matches any of today's or
    /// tomorrow's comparison keys and that have not been notified today.
    ///
    /// This is a coarse pre-filter; [`Reminder::is_due`] makes the precise
    /// decision per record.
    async fn fetch_due_candidates(&self, keys: &DateKeys) -> Result<Vec<Reminder>>;

    /// Insert a new reminder
    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()>;

    /// Update an existing reminder
    async fn update_reminder(
        &self,
        id: &str,
        partial: &PartialReminder,
        remove: Vec<FieldsReminder>,
    ) -> Result<()>;

    /// Delete a reminder by its id
    async fn delete_reminder(&self, id: &str) -> Result<()>;
}
