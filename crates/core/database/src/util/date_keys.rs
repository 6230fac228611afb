use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Comparison keys derived from a single instant.
///
/// Every recurrence scheme matches a stored `eventDate` string against one of
/// these keys, so they are computed once per scheduler run and passed around
/// as a value.
#[derive(Debug, Clone)]
pub struct DateKeys {
    pub today: NaiveDate,
    pub tomorrow: NaiveDate,

    /// Zero-padded `MM/DD`, matched by yearly events
    pub today_mmdd: String,
    pub tomorrow_mmdd: String,

    /// `YYYY-MM-DD`, matched by one-off events
    pub today_iso: String,
    pub tomorrow_iso: String,

    /// English weekday name, matched by weekly events
    pub today_weekday: String,
    pub tomorrow_weekday: String,

    /// Day of month as an unpadded string, matched by monthly events
    pub today_day: String,
    pub tomorrow_day: String,

    /// Midnight at the start of today, for the `lastSent` de-duplication guard
    pub start_of_today: DateTime<Utc>,
}

impl DateKeys {
    /// Compute all comparison keys for the given instant.
    ///
    /// "Tomorrow" is `now + 24h`, not the next calendar day in local time;
    /// around DST transitions the `day_before` leg can shift by an hour.
    /// Kept as-is since changing it would move observable send times.
    pub fn for_instant(now: DateTime<Utc>) -> DateKeys {
        let today = now.date_naive();
        let tomorrow = (now + Duration::hours(24)).date_naive();

        DateKeys {
            today_mmdd: today.format("%m/%d").to_string(),
            tomorrow_mmdd: tomorrow.format("%m/%d").to_string(),
            today_iso: today.format("%Y-%m-%d").to_string(),
            tomorrow_iso: tomorrow.format("%Y-%m-%d").to_string(),
            today_weekday: today.format("%A").to_string(),
            tomorrow_weekday: tomorrow.format("%A").to_string(),
            today_day: today.day().to_string(),
            tomorrow_day: tomorrow.day().to_string(),
            start_of_today: today
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid")
                .and_utc(),
            today,
            tomorrow,
        }
    }
}
