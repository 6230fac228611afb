use remind_result::Result;

use super::AbstractReminders;
use crate::{DateKeys, FieldsReminder, PartialReminder, ReferenceDb, Reminder};

#[async_trait]
impl AbstractReminders for ReferenceDb {
    async fn fetch_reminder(&self, id: &str) -> Result<Reminder> {
        let reminders = self.reminders.lock().await;
        reminders
            .get(id)
            .cloned()
            .ok_or_else(|| create_error!(NotFound))
    }

    async fn fetch_due_candidates(&self, keys: &DateKeys) -> Result<Vec<Reminder>> {
        let candidate_keys = [
            keys.today_mmdd.as_str(),
            keys.tomorrow_mmdd.as_str(),
            keys.today_iso.as_str(),
            keys.tomorrow_iso.as_str(),
            keys.today_weekday.as_str(),
            keys.tomorrow_weekday.as_str(),
            keys.today_day.as_str(),
            keys.tomorrow_day.as_str(),
        ];

        let reminders = self.reminders.lock().await;
        Ok(reminders
            .values()
            .filter(|reminder| candidate_keys.contains(&reminder.event_date.as_str()))
            .filter(|reminder| {
                reminder
                    .last_sent
                    .map_or(true, |at| at < keys.start_of_today)
            })
            .cloned()
            .collect())
    }

    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        let mut reminders = self.reminders.lock().await;
        if reminders.contains_key(&reminder.id) {
            return Err(create_error!(InvalidOperation));
        }

        reminders.insert(reminder.id.to_string(), reminder.clone());
        Ok(())
    }

    async fn update_reminder(
        &self,
        id: &str,
        partial: &PartialReminder,
        remove: Vec<FieldsReminder>,
    ) -> Result<()> {
        let mut reminders = self.reminders.lock().await;
        let reminder = reminders
            .get_mut(id)
            .ok_or_else(|| create_error!(NotFound))?;

        reminder.apply_options(partial);
        for field in &remove {
            reminder.remove_field(field);
        }

        Ok(())
    }

    async fn delete_reminder(&self, id: &str) -> Result<()> {
        let mut reminders = self.reminders.lock().await;
        reminders
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| create_error!(NotFound))
    }
}
