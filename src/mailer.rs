//! Notification dispatch over SMTP.
//!
//! Dispatch failure is logged by the caller and never rolls back the
//! storage append; storage durability outranks notification delivery.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::RadarError;

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, RadarError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.relay)
            .map_err(|e| RadarError::Dispatch(e.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), RadarError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| RadarError::Dispatch(format!("bad from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| RadarError::Dispatch(format!("bad recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| RadarError::Dispatch(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| RadarError::Dispatch(e.to_string()))?;

        info!(%to, %subject, "Notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            relay: "smtp.gmail.com".to_string(),
            username: "radar@example.com".to_string(),
            password: "app-password".to_string(),
            from: "NewsRadar <radar@example.com>".to_string(),
        }
    }

    #[test]
    fn test_from_config_builds_transport() {
        assert!(Mailer::from_config(&smtp_config()).is_ok());
    }

    #[tokio::test]
    async fn test_send_rejects_malformed_recipient() {
        let mailer = Mailer::from_config(&smtp_config()).unwrap();
        let err = mailer
            .send("not an address", "subject", "body")
            .await
            .unwrap_err();
        assert!(matches!(err, RadarError::Dispatch(_)));
    }
}
