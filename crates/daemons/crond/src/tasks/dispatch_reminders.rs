use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use log::{info, warn};
use remind_config::config;
use remind_database::{Database, DateKeys, DueStatus};
use remind_mailer::templates;
use remind_mailer::Notifier;
use remind_result::Result;
use tokio::time::sleep;

/// Outcome counts for a single dispatch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub sent: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Dispatch loop: sleep until the next scheduled occurrence, run one batch,
/// repeat. Runs are strictly sequential; a tick that would fire while a batch
/// is still in flight simply becomes the next upcoming occurrence.
pub async fn task<N: Notifier>(db: Database, notifier: N) -> Result<()> {
    let schedule = config().await.crond.reminders.schedule;
    let schedule = Schedule::from_str(&schedule).expect("valid cron expression");

    loop {
        if let Some(next) = schedule.upcoming(Utc).next() {
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            sleep(wait).await;
        }

        match run_once(&db, &notifier, Utc::now()).await {
            Ok(stats) => {
                if stats != RunStats::default() {
                    info!("Reminder dispatch complete: {stats:?}");
                }
            }
            // A failed fetch aborts only this run; the next tick is independent
            Err(err) => warn!("Reminder dispatch failed: {err:?}"),
        }
    }
}

/// Run a single dispatch batch for the given instant.
///
/// Walks fetch, per-record evaluation, notification and reconciliation. Any
/// per-record failure is logged and skipped so one bad record cannot abort
/// the rest of the batch.
pub async fn run_once(
    db: &Database,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<RunStats> {
    let config = config().await;
    let keys = DateKeys::for_instant(now);
    let send_timeout = Duration::from_secs(config.crond.reminders.send_timeout_seconds);

    let reminders = db.fetch_due_candidates(&keys).await?;
    let mut stats = RunStats::default();

    for mut reminder in reminders {
        // The fetch already filters on lastSent; re-checked here so the
        // per-day guarantee does not depend on driver behaviour
        if reminder.sent_today(&keys) {
            stats.skipped += 1;
            continue;
        }

        let due = reminder.is_due(&keys);
        if due == DueStatus::Not {
            stats.skipped += 1;
            continue;
        }

        let user = match db.fetch_user(&reminder.user).await {
            Ok(user) if !user.email.is_empty() => user,
            _ => {
                warn!("Skipping reminder {}: user email not found", reminder.id);
                stats.skipped += 1;
                continue;
            }
        };

        let kind = reminder.event_type.to_string();
        let subject = templates::subject(&kind, &reminder.event_name);
        let html = templates::render(
            templates::template(&kind),
            &templates::ReminderContext {
                event_name: reminder.event_name.clone(),
                event_date: reminder.event_date.clone(),
                event_type: kind,
                event_time: reminder.event_time.clone(),
                notes: reminder.notes.clone(),
                logo_url: format!("{}/assets/bell.png", config.hosts.app),
                app_url: config.hosts.app.clone(),
            },
        );

        let delivered = match tokio::time::timeout(
            send_timeout,
            notifier.send(&user.email, &subject, &html),
        )
        .await
        {
            Ok(delivered) => delivered,
            Err(_) => {
                warn!("Send for reminder {} timed out", reminder.id);
                false
            }
        };

        if !delivered {
            // Left untouched: lastSent did not advance, so the next run
            // picks this record up again
            warn!("Failed to deliver reminder {}", reminder.id);
            stats.failed += 1;
            continue;
        }

        if reminder.retires_after_send(due) {
            // One-off events notified on the day have served their purpose
            info!("Deleting one-off event: {}", reminder.event_name);
            match reminder.delete(db).await {
                Ok(()) => stats.deleted += 1,
                Err(err) => warn!(
                    "Failed to delete reminder {} after send: {err:?}",
                    reminder.id
                ),
            }
        } else if let Err(err) = reminder.mark_sent(db, now).await {
            warn!(
                "Failed to stamp reminder {} after send: {err:?}",
                reminder.id
            );
        }

        stats.sent += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use remind_database::{
        Database, DatabaseInfo, EventType, Reminder, ReminderType, RecurringFrequency, User,
    };
    use remind_mailer::Notifier;

    use super::{run_once, RunStats};

    /// Notifier fake that records sends and answers with a fixed outcome
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        accept: bool,
    }

    impl RecordingNotifier {
        fn accepting() -> RecordingNotifier {
            RecordingNotifier {
                sent: Mutex::new(Vec::new()),
                accept: true,
            }
        }

        fn rejecting() -> RecordingNotifier {
            RecordingNotifier {
                sent: Mutex::new(Vec::new()),
                accept: false,
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, address: &str, subject: &str, _html: &str) -> bool {
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), subject.to_string()));
            self.accept
        }
    }

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn reminder(id: &str, event_date: &str, reminder_type: ReminderType) -> Reminder {
        Reminder {
            id: id.to_string(),
            user: "user".to_string(),
            event_type: EventType::Appointment,
            event_name: format!("Event {id}"),
            event_date: event_date.to_string(),
            event_time: None,
            reminder_type,
            is_recurring_event: false,
            recurring_frequency: None,
            notes: None,
            last_sent: None,
            created_at: instant("2023-01-01T00:00:00Z"),
        }
    }

    async fn database_with_user() -> Database {
        let db = DatabaseInfo::Reference.connect().await.unwrap();
        db.insert_user(&User {
            id: "user".to_string(),
            email: "stas@example.com".to_string(),
            display_name: None,
            google_id: None,
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn dispatch_sends_deletes_and_stamps() {
        let db = database_with_user().await;
        let now = instant("2023-05-15T10:00:00Z");

        // A: yearly birthday, survives with a lastSent stamp
        let mut a = reminder("a", "05/15", ReminderType::DayOf);
        a.event_type = EventType::Birthday;
        a.create(&db).await.unwrap();

        // B: one-off appointment on the day, deleted after send
        let mut b = reminder("b", "2023-05-15", ReminderType::DayOf);
        b.create(&db).await.unwrap();

        // C: already notified this morning, excluded
        let mut c = reminder("c", "2023-05-15", ReminderType::DayOf);
        c.last_sent = Some(instant("2023-05-15T01:00:00Z"));
        c.create(&db).await.unwrap();

        let notifier = RecordingNotifier::accepting();
        let stats = run_once(&db, &notifier, now).await.unwrap();

        assert_eq!(
            stats,
            RunStats {
                sent: 2,
                deleted: 1,
                skipped: 0,
                failed: 0
            }
        );

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(address, _)| address == "stas@example.com"));
        assert!(sent
            .iter()
            .any(|(_, subject)| subject.contains("Birthday Reminder")));

        let stamped = db.fetch_reminder("a").await.unwrap();
        assert_eq!(stamped.last_sent, Some(now));
        assert!(db.fetch_reminder("b").await.is_err());

        let untouched = db.fetch_reminder("c").await.unwrap();
        assert_eq!(untouched.last_sent, Some(instant("2023-05-15T01:00:00Z")));
    }

    #[tokio::test]
    async fn day_before_matches_stamp_instead_of_deleting() {
        let db = database_with_user().await;
        let now = instant("2023-05-15T10:00:00Z");

        let mut eve = reminder("eve", "2023-05-16", ReminderType::Both);
        eve.create(&db).await.unwrap();

        let notifier = RecordingNotifier::accepting();
        let stats = run_once(&db, &notifier, now).await.unwrap();

        assert_eq!(stats.sent, 1);
        assert_eq!(stats.deleted, 0);

        // Matched on the tomorrow leg only, so the record survives for the
        // day-of send
        let stamped = db.fetch_reminder("eve").await.unwrap();
        assert_eq!(stamped.last_sent, Some(now));
    }

    #[tokio::test]
    async fn failed_sends_leave_the_record_for_retry() {
        let db = database_with_user().await;
        let now = instant("2023-05-15T10:00:00Z");

        reminder("r", "2023-05-15", ReminderType::DayOf)
            .create(&db)
            .await
            .unwrap();

        let rejecting = RecordingNotifier::rejecting();
        let stats = run_once(&db, &rejecting, now).await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.sent, 0);

        // Untouched, so a later run retries and succeeds
        let untouched = db.fetch_reminder("r").await.unwrap();
        assert!(untouched.last_sent.is_none());

        let accepting = RecordingNotifier::accepting();
        let retry = run_once(&db, &accepting, now).await.unwrap();
        assert_eq!(retry.sent, 1);
        assert_eq!(retry.deleted, 1);
    }

    #[tokio::test]
    async fn a_second_run_on_the_same_day_sends_nothing() {
        let db = database_with_user().await;
        let now = instant("2023-05-15T08:00:00Z");

        let mut weekly = reminder("w", "Monday", ReminderType::Both);
        weekly.is_recurring_event = true;
        weekly.recurring_frequency = Some(RecurringFrequency::Weekly);
        weekly.create(&db).await.unwrap();

        let notifier = RecordingNotifier::accepting();
        let first = run_once(&db, &notifier, now).await.unwrap();
        assert_eq!(first.sent, 1);

        let afternoon = run_once(&db, &notifier, instant("2023-05-15T16:00:00Z"))
            .await
            .unwrap();
        assert_eq!(afternoon.sent, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn records_without_a_reachable_owner_are_skipped() {
        let db = DatabaseInfo::Reference.connect().await.unwrap();
        let now = instant("2023-05-15T10:00:00Z");

        reminder("orphan", "2023-05-15", ReminderType::DayOf)
            .create(&db)
            .await
            .unwrap();

        db.insert_user(&User {
            id: "silent".to_string(),
            email: String::new(),
            display_name: None,
            google_id: None,
        })
        .await
        .unwrap();
        let mut no_email = reminder("no-email", "2023-05-15", ReminderType::DayOf);
        no_email.user = "silent".to_string();
        no_email.create(&db).await.unwrap();

        let notifier = RecordingNotifier::accepting();
        let stats = run_once(&db, &notifier, now).await.unwrap();

        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.sent, 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_dates_do_not_abort_the_batch() {
        let db = database_with_user().await;
        let now = instant("2023-05-15T10:00:00Z");

        // A weekly record whose date does not parse as a weekday; it still
        // lands in the candidate set via the literal key match
        let mut broken = reminder("broken", "15", ReminderType::DayOf);
        broken.is_recurring_event = true;
        broken.recurring_frequency = Some(RecurringFrequency::Weekly);
        broken.create(&db).await.unwrap();

        reminder("fine", "2023-05-15", ReminderType::DayOf)
            .create(&db)
            .await
            .unwrap();

        let notifier = RecordingNotifier::accepting();
        let stats = run_once(&db, &notifier, now).await.unwrap();

        assert_eq!(stats.sent, 1);
        assert_eq!(stats.skipped, 1);
        assert!(db.fetch_reminder("broken").await.is_ok());
    }
}
