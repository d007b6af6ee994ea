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

use std::env;
use std::error;
use std::fmt;

pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_SMTP_PASS: &str = "SMTP_PASS";
pub const ENV_EMAIL_TO: &str = "EMAIL_TO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "{} must be set in the environment", var),
        }
    }
}

impl error::Error for ConfigError {}

/// Server, credentials, and recipient for email notifications.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub recipient: String,
}

impl SmtpConfig {
    /// Load credentials from the process environment, reading a `.env` file first if one exists.
    ///
    /// `SMTP_USER` and `SMTP_PASS` are required. `EMAIL_TO` defaults to `SMTP_USER`.
    pub fn from_env<S: Into<String>>(host: S, port: u16) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(host, port, |k| env::var(k).ok())
    }

    pub fn from_lookup<S, F>(host: S, port: u16, lookup: F) -> Result<Self, ConfigError>
    where
        S: Into<String>,
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &'static str| lookup(k).filter(|v| !v.is_empty());

        let user = get(ENV_SMTP_USER).ok_or(ConfigError::Missing(ENV_SMTP_USER))?;
        let password = get(ENV_SMTP_PASS).ok_or(ConfigError::Missing(ENV_SMTP_PASS))?;
        let recipient = get(ENV_EMAIL_TO).unwrap_or_else(|| user.clone());

        Ok(SmtpConfig {
            host: host.into(),
            port,
            user,
            password,
            recipient,
        })
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::{ConfigError, SmtpConfig};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn test_recipient_defaults_to_user() {
        let config = SmtpConfig::from_lookup(
            "smtp.gmail.com",
            465,
            lookup(&[("SMTP_USER", "alerts@example.com"), ("SMTP_PASS", "hunter2")]),
        )
        .unwrap();

        assert_eq!("alerts@example.com", config.recipient);
        assert_eq!("smtp.gmail.com", config.host);
        assert_eq!(465, config.port);
    }

    #[test]
    fn test_explicit_recipient() {
        let config = SmtpConfig::from_lookup(
            "smtp.gmail.com",
            465,
            lookup(&[
                ("SMTP_USER", "alerts@example.com"),
                ("SMTP_PASS", "hunter2"),
                ("EMAIL_TO", "someone@example.com"),
            ]),
        )
        .unwrap();

        assert_eq!("someone@example.com", config.recipient);
    }

    #[test]
    fn test_missing_credentials() {
        assert_eq!(
            Err(ConfigError::Missing("SMTP_USER")),
            SmtpConfig::from_lookup("smtp.gmail.com", 465, lookup(&[("SMTP_PASS", "hunter2")]))
        );
        assert_eq!(
            Err(ConfigError::Missing("SMTP_PASS")),
            SmtpConfig::from_lookup("smtp.gmail.com", 465, lookup(&[("SMTP_USER", "alerts@example.com"), ("SMTP_PASS", "")]))
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SmtpConfig::from_lookup(
            "smtp.gmail.com",
            465,
            lookup(&[("SMTP_USER", "alerts@example.com"), ("SMTP_PASS", "hunter2")]),
        )
        .unwrap();

        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
