use bson::Document;
use mongodb::bson::doc;
use remind_result::Result;

use super::AbstractReminders;
use crate::{DateKeys, FieldsReminder, IntoDocumentPath, MongoDb, PartialReminder, Reminder};

static COL: &str = "reminders";

fn due_candidates_filter(keys: &DateKeys) -> Document {
    doc! {
        "$or": [
            // Yearly events (birthdays, anniversaries) store MM/DD
            {
                "eventDate": { "$in": [keys.today_mmdd.as_str(), keys.tomorrow_mmdd.as_str()] },
                "isRecurringEvent": true
            },
            // One-off events store YYYY-MM-DD; MM/DD listed as well for
            // records written before date normalization
            {
                "eventDate": { "$in": [
                    keys.today_iso.as_str(),
                    keys.tomorrow_iso.as_str(),
                    keys.today_mmdd.as_str(),
                    keys.tomorrow_mmdd.as_str()
                ] },
                "isRecurringEvent": { "$ne": true }
            },
            // Weekly events store a weekday name
            {
                "eventDate": { "$in": [keys.today_weekday.as_str(), keys.tomorrow_weekday.as_str()] },
                "recurringFrequency": "weekly"
            },
            // Monthly events store a day number
            {
                "eventDate": { "$in": [keys.today_day.as_str(), keys.tomorrow_day.as_str()] },
                "recurringFrequency": "monthly"
            }
        ],
        "$and": [
            {
                "$or": [
                    { "lastSent": { "$exists": false } },
                    { "lastSent": { "$lt": bson::DateTime::from_chrono(keys.start_of_today) } }
                ]
            }
        ]
    }
}

#[async_trait]
impl AbstractReminders for MongoDb {
    async fn fetch_reminder(&self, id: &str) -> Result<Reminder> {
        query!(self, find_one_by_id, COL, id)?.ok_or_else(|| create_error!(NotFound))
    }

    async fn fetch_due_candidates(&self, keys: &DateKeys) -> Result<Vec<Reminder>> {
        query!(self, find, COL, due_candidates_filter(keys))
    }

    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        query!(self, insert_one, COL, reminder).map(|_| ())
    }

    async fn update_reminder(
        &self,
        id: &str,
        partial: &PartialReminder,
        remove: Vec<FieldsReminder>,
    ) -> Result<()> {
        query!(
            self,
            update_one_by_id,
            COL,
            id,
            partial,
            remove.iter().map(|x| x as &dyn IntoDocumentPath).collect()
        )
        .map(|_| ())
    }

    async fn delete_reminder(&self, id: &str) -> Result<()> {
        query!(self, delete_one_by_id, COL, id).map(|_| ())
    }
}
