use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use ulid::Ulid;

use crate::util::{date_keys::DateKeys, iso_bson_chrono};
use crate::Database;
#[cfg(feature = "mongodb")]
use crate::IntoDocumentPath;
use remind_result::Result;

auto_derived!(
    /// Kind of event a reminder tracks
    #[serde(rename_all = "lowercase")]
    pub enum EventType {
        Birthday,
        Anniversary,
        Appointment,
        Other,
    }

    /// When the notification fires relative to the event date
    #[serde(rename_all = "snake_case")]
    pub enum ReminderType {
        DayOf,
        DayBefore,
        Both,
    }

    /// Cadence governing how a stored event date is interpreted
    #[serde(rename_all = "lowercase")]
    pub enum RecurringFrequency {
        Yearly,
        Monthly,
        Weekly,
    }
);

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Birthday => write!(f, "birthday"),
            EventType::Anniversary => write!(f, "anniversary"),
            EventType::Appointment => write!(f, "appointment"),
            EventType::Other => write!(f, "other"),
        }
    }
}

auto_derived!(
    /// Reminder
    ///
    /// Field names follow the collection written by the original web app, so
    /// both can operate on the same documents.
    #[serde(rename_all = "camelCase")]
    pub struct Reminder {
        /// Reminder Id
        #[serde(rename = "_id")]
        pub id: String,
        /// Id of the owning user
        pub user: String,

        /// Kind of event
        pub event_type: EventType,
        /// Display name for the event
        pub event_name: String,
        /// Stored event date; its format depends on the recurrence, see
        /// [`RecurrenceRule`]
        pub event_date: String,
        /// Optional clock time, display-only, never used for matching
        #[serde(skip_serializing_if = "Option::is_none")]
        pub event_time: Option<String>,

        /// Lead-time preference
        pub reminder_type: ReminderType,
        /// Whether the event repeats; implied for birthdays and anniversaries
        #[serde(skip_serializing_if = "crate::if_false", default)]
        pub is_recurring_event: bool,
        /// Cadence for recurring events, absent for one-offs
        #[serde(skip_serializing_if = "Option::is_none")]
        pub recurring_frequency: Option<RecurringFrequency>,

        /// Free text interpolated into the notification
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,

        /// When a notification for this record last went out; guards against
        /// duplicate sends within the same day
        #[serde(
            skip_serializing_if = "Option::is_none",
            default,
            serialize_with = "iso_bson_chrono::option::serialize",
            deserialize_with = "iso_bson_chrono::option::deserialize"
        )]
        pub last_sent: Option<DateTime<Utc>>,

        /// Creation timestamp
        #[serde(
            serialize_with = "iso_bson_chrono::serialize",
            deserialize_with = "iso_bson_chrono::deserialize"
        )]
        pub created_at: DateTime<Utc>,
    }

    /// Partial reminder for updates
    #[derive(Default)]
    #[serde(rename_all = "camelCase")]
    pub struct PartialReminder {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub event_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub event_date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub event_time: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(
            skip_serializing_if = "Option::is_none",
            default,
            serialize_with = "iso_bson_chrono::option::serialize",
            deserialize_with = "iso_bson_chrono::option::deserialize"
        )]
        pub last_sent: Option<DateTime<Utc>>,
    }

    /// Optional fields on reminder object
    pub enum FieldsReminder {
        EventTime,
        Notes,
        LastSent,
    }
);

#[cfg(feature = "mongodb")]
impl IntoDocumentPath for FieldsReminder {
    fn as_path(&self) -> Option<&'static str> {
        match self {
            FieldsReminder::EventTime => "eventTime".into(),
            FieldsReminder::Notes => "notes".into(),
            FieldsReminder::LastSent => "lastSent".into(),
        }
    }
}

/// How a stored event date recurs.
///
/// The `eventDate` string overloads four formats; which one applies is fully
/// determined by the record's kind and recurrence fields, never sniffed from
/// the string itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceRule {
    /// `eventDate` is an English weekday name, e.g. "Monday"
    Weekly(Weekday),
    /// `eventDate` is a day-of-month number, "1".."31"
    Monthly(u32),
    /// `eventDate` is zero-padded "MM/DD"; the year never participates
    Yearly { month: u32, day: u32 },
    /// `eventDate` is "YYYY-MM-DD"
    Once(NaiveDate),
    /// One-off records written before date normalization stored "MM/DD";
    /// migration shim, matched like a yearly date but retired like a one-off
    LegacyOnce { month: u32, day: u32 },
}

/// Whether a reminder should fire, and on which leg it matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Not,
    Today,
    Tomorrow,
}

fn parse_month_day(value: &str) -> Option<(u32, u32)> {
    let (month, day) = value.split_once('/')?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;

    if (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some((month, day))
    } else {
        None
    }
}

impl Reminder {
    /// Interpret this record's `eventDate` under its declared recurrence
    pub fn recurrence(&self) -> Result<RecurrenceRule> {
        let date = self.event_date.as_str();
        let malformed = || {
            create_error!(MalformedDate {
                date: self.event_date.clone()
            })
        };

        // Birthdays and anniversaries are yearly regardless of flags
        if matches!(
            self.event_type,
            EventType::Birthday | EventType::Anniversary
        ) {
            return parse_month_day(date)
                .map(|(month, day)| RecurrenceRule::Yearly { month, day })
                .ok_or_else(malformed);
        }

        match self.recurring_frequency {
            Some(RecurringFrequency::Weekly) => date
                .parse::<Weekday>()
                .map(RecurrenceRule::Weekly)
                .map_err(|_| malformed()),
            Some(RecurringFrequency::Monthly) => date
                .parse::<u32>()
                .ok()
                .filter(|day| (1..=31).contains(day))
                .map(RecurrenceRule::Monthly)
                .ok_or_else(malformed),
            Some(RecurringFrequency::Yearly) => parse_month_day(date)
                .map(|(month, day)| RecurrenceRule::Yearly { month, day })
                .ok_or_else(malformed),
            None if self.is_recurring_event => parse_month_day(date)
                .map(|(month, day)| RecurrenceRule::Yearly { month, day })
                .ok_or_else(malformed),
            None => {
                if let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                    Ok(RecurrenceRule::Once(date))
                } else if let Some((month, day)) = parse_month_day(date) {
                    Ok(RecurrenceRule::LegacyOnce { month, day })
                } else {
                    Err(malformed())
                }
            }
        }
    }

    /// Whether a notification already went out since the start of today
    pub fn sent_today(&self, keys: &DateKeys) -> bool {
        self.last_sent
            .map_or(false, |at| at >= keys.start_of_today)
    }

    /// Decide whether today is a day this reminder should fire.
    ///
    /// A malformed `eventDate` is simply not due; one bad record must never
    /// abort a whole scheduler batch.
    pub fn is_due(&self, keys: &DateKeys) -> DueStatus {
        let rule = match self.recurrence() {
            Ok(rule) => rule,
            Err(_) => return DueStatus::Not,
        };

        let (today, tomorrow) = match rule {
            RecurrenceRule::Weekly(weekday) => (
                keys.today.weekday() == weekday,
                keys.tomorrow.weekday() == weekday,
            ),
            RecurrenceRule::Monthly(day) => (
                keys.today_day == day.to_string(),
                keys.tomorrow_day == day.to_string(),
            ),
            RecurrenceRule::Yearly { month, day }
            | RecurrenceRule::LegacyOnce { month, day } => {
                let key = format!("{month:02}/{day:02}");
                (key == keys.today_mmdd, key == keys.tomorrow_mmdd)
            }
            RecurrenceRule::Once(date) => {
                let key = date.format("%Y-%m-%d").to_string();
                (key == keys.today_iso, key == keys.tomorrow_iso)
            }
        };

        match self.reminder_type {
            ReminderType::DayOf if today => DueStatus::Today,
            ReminderType::DayBefore if tomorrow => DueStatus::Tomorrow,
            // A date matching both legs counts as today's send
            ReminderType::Both if today => DueStatus::Today,
            ReminderType::Both if tomorrow => DueStatus::Tomorrow,
            _ => DueStatus::Not,
        }
    }

    /// Whether this record has served its single purpose once notified on the
    /// event day itself, and should be removed rather than stamped
    pub fn retires_after_send(&self, due: DueStatus) -> bool {
        due == DueStatus::Today
            && !matches!(self.reminder_type, ReminderType::DayBefore)
            && matches!(
                self.recurrence(),
                Ok(RecurrenceRule::Once(_)) | Ok(RecurrenceRule::LegacyOnce { .. })
            )
    }

    /// Persist this reminder, generating an id if none is set
    pub async fn create(&mut self, db: &Database) -> Result<()> {
        if self.id.is_empty() {
            self.id = Ulid::new().to_string();
        }

        db.insert_reminder(self).await
    }

    /// Stamp the per-day de-duplication marker after a confirmed delivery
    pub async fn mark_sent(&mut self, db: &Database, now: DateTime<Utc>) -> Result<()> {
        self.last_sent = Some(now);
        db.update_reminder(
            &self.id,
            &PartialReminder {
                last_sent: Some(now),
                ..Default::default()
            },
            vec![],
        )
        .await
    }

    /// Remove this reminder from storage
    pub async fn delete(&self, db: &Database) -> Result<()> {
        db.delete_reminder(&self.id).await
    }

    /// Apply a partial update in place, used by the reference driver
    pub fn apply_options(&mut self, partial: &PartialReminder) {
        if let Some(event_name) = &partial.event_name {
            self.event_name = event_name.clone();
        }

        if let Some(event_date) = &partial.event_date {
            self.event_date = event_date.clone();
        }

        if let Some(event_time) = &partial.event_time {
            self.event_time = Some(event_time.clone());
        }

        if let Some(notes) = &partial.notes {
            self.notes = Some(notes.clone());
        }

        if let Some(last_sent) = partial.last_sent {
            self.last_sent = Some(last_sent);
        }
    }

    /// Unset an optional field, used by the reference driver
    pub fn remove_field(&mut self, field: &FieldsReminder) {
        match field {
            FieldsReminder::EventTime => self.event_time = None,
            FieldsReminder::Notes => self.notes = None,
            FieldsReminder::LastSent => self.last_sent = None,
        }
    }
}
