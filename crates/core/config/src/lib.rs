use cached::proc_macro::cached;
use config::{Config, Environment, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Remind.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Remind.toml").exists() {
            builder = builder.add_source(File::new("Remind.toml", FileFormat::Toml));
        }

        // e.g. REMIND_smtp__host overrides smtp.host
        builder = builder.add_source(Environment::with_prefix("REMIND").separator("__"));

        builder.build().unwrap()
    })
});

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub mongodb: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Hosts {
    pub app: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Smtp {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CrondReminders {
    pub schedule: String,
    pub send_timeout_seconds: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Crond {
    pub reminders: CrondReminders,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: Database,
    pub hosts: Hosts,
    pub smtp: Smtp,
    pub crond: Crond,
}

pub async fn init() {
    println!(
        ":: Remind Alerts Configuration ::\n\x1b[32m{:?}\x1b[0m",
        config().await
    );
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read().await.try_deserialize::<Settings>().unwrap()
}

/// Initialise logging for a daemon or service
pub fn setup_logging(application: &str) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    pretty_env_logger::init_timed();
    log::info!("Starting {application}");
}

#[macro_export]
macro_rules! configure {
    ( $application: ident ) => {
        $crate::setup_logging(stringify!($application));
        $crate::init().await;
    };
}
