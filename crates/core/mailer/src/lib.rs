#[macro_use]
extern crate log;

#[macro_use]
extern crate async_trait;

pub mod templates;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use remind_config::config;
use remind_result::{create_error, Result};

/// Send contract consumed by the dispatch engine.
///
/// Returns whether the message was accepted for delivery; failures are
/// reported, never silently swallowed.
#[async_trait]
pub trait Notifier: Sync + Send {
    async fn send(&self, address: &str, subject: &str, html: &str) -> bool;
}

/// Notifier delivering over the configured SMTP relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build a notifier from the smtp section of the configuration
    pub async fn from_config() -> Result<SmtpNotifier> {
        let config = config().await;

        if config.smtp.host.is_empty() {
            return Err(create_error!(InvalidOperation));
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp.host)
            .map_err(|_| create_error!(Delivery))?
            .port(config.smtp.port)
            .credentials(Credentials::new(config.smtp.username, config.smtp.password))
            .build();

        let from = config
            .smtp
            .from_address
            .parse()
            .map_err(|_| create_error!(InvalidOperation))?;

        Ok(SmtpNotifier { transport, from })
    }
}

fn generate_multipart(text: &str, html: &str) -> MultiPart {
    MultiPart::alternative()
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(text.to_string()),
        )
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html.to_string()),
        )
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, address: &str, subject: &str, html: &str) -> bool {
        let to: Mailbox = match address.parse() {
            Ok(to) => to,
            Err(err) => {
                warn!("Refusing to send to invalid address {address}: {err}");
                return false;
            }
        };

        let message = match Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(generate_multipart(subject, html))
        {
            Ok(message) => message,
            Err(err) => {
                warn!("Failed to build reminder email: {err}");
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => true,
            Err(err) => {
                error!("Failed to send reminder email: {err}");
                false
            }
        }
    }
}
