// dsm_notifier - Precipitation alerts from NWS daily summary bulletins
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::config::SmtpConfig;
use crate::pipeline::Detection;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum NotifyError {
    InvalidAddress(String, lettre::address::AddressError),
    Message(lettre::error::Error),
    Transport(lettre::transport::smtp::Error),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(addr, e) => write!(f, "invalid email address {}: {}", addr, e),
            Self::Message(e) => write!(f, "unable to build message: {}", e),
            Self::Transport(e) => write!(f, "unable to deliver message: {}", e),
        }
    }
}

impl error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidAddress(_, e) => Some(e),
            Self::Message(e) => Some(e),
            Self::Transport(e) => Some(e),
        }
    }
}

/// Subject and body of the alert sent when precipitation is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(pil: &str, detection: &Detection, at: DateTime<Tz>) -> Self {
        Notification {
            subject: format!("{} Precipitation: {}\"", pil, detection.reading),
            body: format!(
                "Found precipitation value {} at {} for product {}",
                detection.reading,
                at.to_rfc3339_opts(SecondsFormat::Secs, false),
                detection.product_id
            ),
        }
    }
}

/// Delivers a notification somewhere a person will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Sends notifications as email over SMTPS with username and password authentication.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.user)?;
        let to = parse_mailbox(&config.recipient)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(NotifyError::Transport)?
            .port(config.port)
            .credentials(Credentials::new(config.user, config.password))
            .build();

        Ok(SmtpNotifier { transport, from, to })
    }
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(NotifyError::Message)?;

        let res = self.transport.send(message).await.map_err(NotifyError::Transport)?;
        tracing::debug!(message = "email accepted by SMTP server", to = %self.to, code = %res.code());
        Ok(())
    }
}

/// Logs notifications instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(message = "dry run, not sending notification", subject = %notification.subject, body = %notification.body);
        Ok(())
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress(addr.to_owned(), e))
}

#[cfg(test)]
mod test {
    use super::{Notification, NotifyError, SmtpNotifier};
    use crate::config::SmtpConfig;
    use crate::pipeline::Detection;
    use crate::reading::PrecipitationReading;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn config(user: &str, recipient: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_owned(),
            port: 465,
            user: user.to_owned(),
            password: "hunter2".to_owned(),
            recipient: recipient.to_owned(),
        }
    }

    #[test]
    fn test_notification_content() {
        let detection = Detection {
            product_id: "202503052124-KOKX-CDUS41-DSMNYC".to_owned(),
            reading: PrecipitationReading::Trace,
        };
        let at = New_York.with_ymd_and_hms(2025, 3, 5, 16, 14, 30).unwrap();
        let notification = Notification::new("DSMNYC", &detection, at);

        assert_eq!("DSMNYC Precipitation: T\"", notification.subject);
        assert_eq!(
            "Found precipitation value T at 2025-03-05T16:14:30-05:00 for product 202503052124-KOKX-CDUS41-DSMNYC",
            notification.body
        );
    }

    #[test]
    fn test_smtp_notifier_invalid_recipient() {
        let res = SmtpNotifier::new(config("alerts@example.com", "not an address"));
        assert!(matches!(res, Err(NotifyError::InvalidAddress(addr, _)) if addr == "not an address"));
    }

    #[test]
    fn test_smtp_notifier_invalid_sender() {
        let res = SmtpNotifier::new(config("alerts", "someone@example.com"));
        assert!(matches!(res, Err(NotifyError::InvalidAddress(addr, _)) if addr == "alerts"));
    }
}
