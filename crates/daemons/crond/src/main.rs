use remind_config::configure;
use remind_database::DatabaseInfo;
use remind_mailer::SmtpNotifier;
use remind_result::Result;
use tasks::dispatch_reminders;
use tokio::try_join;

pub mod tasks;

#[tokio::main]
async fn main() -> Result<()> {
    configure!(crond);

    let db = DatabaseInfo::Auto.connect().await.expect("database");
    let notifier = SmtpNotifier::from_config()
        .await
        .expect("smtp configuration");

    try_join!(dispatch_reminders::task(db, notifier)).map(|_| ())
}
