//! Outbound email. Every send is fire-and-forget: dispatched to the
//! blocking pool, failures logged and never surfaced to the caller, so the
//! email subsystem's latency cannot delay or fail a request.

use anyhow::Result;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailConfig;

pub struct Mailer {
    config: EmailConfig,
    app_name: String,
}

impl Mailer {
    #[must_use]
    pub const fn new(config: EmailConfig, app_name: String) -> Self {
        Self { config, app_name }
    }

    pub fn send_welcome(&self, to: &str, username: &str) {
        let subject = format!("Welcome to {}", self.app_name);
        let body = format!(
            "Hi {username},\n\
            \n\
            Your {app} account is ready. Sign in to start your first\n\
            conversation, and visit your preferences to tune the experience.\n\
            \n\
            The {app} Team",
            app = self.app_name,
        );

        self.dispatch(to.to_string(), subject, body);
    }

    pub fn send_password_reset(&self, to: &str, token: &str) {
        let subject = format!("{} password reset", self.app_name);
        let body = format!(
            "Hello,\n\
            \n\
            A password reset was requested for your {app} account.\n\
            \n\
            Reset your password within the next hour using this link:\n\
            \n\
            {base}/reset-password?token={token}\n\
            \n\
            If you did not request this reset, you can ignore this email;\n\
            your password stays unchanged.\n\
            \n\
            The {app} Team",
            app = self.app_name,
            base = self.config.app_base_url,
        );

        self.dispatch(to.to_string(), subject, body);
    }

    fn dispatch(&self, to: String, subject: String, body: String) {
        if !self.config.enabled {
            tracing::debug!(%to, %subject, "Email disabled, dropping message");
            return;
        }

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = send_blocking(&config, &to, &subject, &body) {
                tracing::warn!(%to, %subject, "Failed to send email: {e}");
            } else {
                tracing::info!(%to, %subject, "Email sent");
            }
        });
    }
}

fn send_blocking(config: &EmailConfig, to: &str, subject: &str, body: &str) -> Result<()> {
    let email = Message::builder()
        .from(
            config
                .from_address
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid from address: {e}"))?,
        )
        .to(to
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid to address: {e}"))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to build email: {e}"))?;

    let mut builder = SmtpTransport::relay(&config.smtp_host)
        .map_err(|e| anyhow::anyhow!("Failed to create SMTP transport: {e}"))?
        .port(config.smtp_port)
        .timeout(Some(std::time::Duration::from_secs(10)));

    if !config.smtp_username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ));
    }

    let mailer = builder.build();
    mailer
        .send(&email)
        .map_err(|e| anyhow::anyhow!("Failed to send email: {e}"))?;

    Ok(())
}
