// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridPeak.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! SMTP delivery for alerts.
//!
//! The engine is synchronous, so the notifier owns a current-thread Tokio
//! runtime and blocks on the async lettre transport for each alert.

use anyhow::{Context, Result};
use gridpeak_core::{Alert, AlertDispatcher, PeakError};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::config::EmailSettings;

#[derive(Debug)]
pub struct EmailNotifier {
    runtime: Runtime,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<String>,
}

impl EmailNotifier {
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .with_context(|| format!("Invalid from_address: {}", config.from_address))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime for SMTP")?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .with_context(|| format!("Failed to create SMTP relay: {}", config.smtp_host))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };
        let mut builder = builder.port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            runtime,
            transport: builder.build(),
            from,
            recipients: config.recipients.clone(),
        })
    }

    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Send one message per recipient. Bad addresses and failed deliveries
    /// are logged and skipped; only a message that cannot be built fails.
    async fn send_to_all(&self, subject: &str, body: &str) -> Result<usize> {
        let mut delivered = 0;
        for recipient in &self.recipients {
            let to: Mailbox = match recipient.parse() {
                Ok(m) => m,
                Err(e) => {
                    error!(recipient = %recipient, error = %e, "Invalid recipient address, skipping");
                    continue;
                }
            };

            let message = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject)
                .body(body.to_owned())
                .context("Failed to build email message")?;

            match self.transport.send(message).await {
                Ok(_) => {
                    delivered += 1;
                    info!(recipient = %recipient, subject = %subject, "Email sent");
                }
                Err(e) => error!(recipient = %recipient, error = %e, "Failed to send email"),
            }
        }

        Ok(delivered)
    }
}

impl AlertDispatcher for EmailNotifier {
    fn dispatch(&self, alert: &Alert) -> gridpeak_core::Result<()> {
        let delivered = self
            .runtime
            .block_on(self.send_to_all(&alert.subject, &alert.body))
            .map_err(|e| PeakError::Alert(format!("{e:#}")))?;
        if delivered == 0 {
            error!(subject = %alert.subject, "Alert was not delivered to any recipient");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(from: &str) -> EmailSettings {
        EmailSettings {
            smtp_host: "localhost".to_owned(),
            smtp_port: 2525,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: from.to_owned(),
            use_tls: false,
            recipients: vec!["not an address".to_owned()],
        }
    }

    #[test]
    fn test_invalid_from_address() {
        assert!(EmailNotifier::new(&settings("nobody")).is_err());
    }

    #[test]
    fn test_invalid_recipients_are_skipped() {
        let notifier = EmailNotifier::new(&settings("GridPeak <gridpeak@example.com>")).unwrap();
        assert_eq!(notifier.recipients(), ["not an address".to_owned()]);
        // Nothing is sent, so no SMTP server is needed
        assert!(notifier.dispatch(&Alert::new("subject", "body")).is_ok());
    }
}
