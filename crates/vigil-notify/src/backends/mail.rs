// mail.rs - Notifiers that send one email per failure-related event.
//
// Two flavours share this type: `smtp` (plain, unauthenticated relay) and
// `esmtp` (STARTTLS required, with credentials). Only failure, ongoing
// failure and recovery produce mail.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::runtime::Handle;
use vigil_state::LifecycleEvent;

use super::{required, runtime_handle};
use crate::config::MailSettings;
use crate::error::NotifyError;
use crate::notifier::Notifier;

/// Subject line of every notification mail.
pub const SUBJECT: &str = "vigil service notification";

const SMTP_PORT: u16 = 25;
const SUBMISSION_PORT: u16 = 587;

pub struct MailNotifier {
    name: &'static str,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    handle: Handle,
}

impl MailNotifier {
    /// Plain SMTP: no TLS, no authentication. Port defaults to 25.
    pub fn smtp(settings: &MailSettings) -> Result<Self, NotifyError> {
        let name = "smtp";
        let host = required(name, &settings.host, "host")?;
        let from = mailbox(name, &settings.from, "from")?;
        let to = mailbox(name, &settings.to, "to")?;
        let handle = runtime_handle(name)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(settings.port.unwrap_or(SMTP_PORT))
            .build();

        Ok(Self {
            name,
            transport,
            from,
            to,
            handle,
        })
    }

    /// SMTP submission with mandatory STARTTLS and credentials. Port
    /// defaults to 587.
    pub fn esmtp(settings: &MailSettings) -> Result<Self, NotifyError> {
        let name = "esmtp";
        let host = required(name, &settings.host, "host")?;
        let from = mailbox(name, &settings.from, "from")?;
        let to = mailbox(name, &settings.to, "to")?;
        let user = required(name, &settings.user, "user")?;
        let password = settings
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(NotifyError::MissingSetting {
                notifier: name,
                setting: "password",
            })?;
        let handle = runtime_handle(name)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .map_err(|e| NotifyError::InvalidSetting {
                notifier: name,
                setting: "host",
                details: e.to_string(),
            })?
            .port(settings.port.unwrap_or(SUBMISSION_PORT))
            .credentials(Credentials::new(user, password))
            .build();

        Ok(Self {
            name,
            transport,
            from,
            to,
            handle,
        })
    }

    /// Build the message for `text`.
    pub fn compose(&self, text: &str) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| NotifyError::Delivery {
                notifier: self.name,
                details: e.to_string(),
            })
    }

    /// Queue a mail for `event`. Delivery happens on a background task;
    /// SMTP errors are logged there. Events that are not failure related
    /// are not mailed.
    fn send(&self, unit: &str, event: LifecycleEvent) -> Result<(), NotifyError> {
        if !event.is_failure_related() {
            return Ok(());
        }
        let message = self.compose(&event.summary(unit))?;
        let transport = self.transport.clone();
        let name = self.name;
        let unit = unit.to_string();
        self.handle.spawn(async move {
            match transport.send(message).await {
                Ok(_) => tracing::debug!(notifier = name, unit = %unit, event = %event, "mail sent"),
                Err(e) => tracing::warn!(
                    notifier = name,
                    unit = %unit,
                    event = %event,
                    error = %e,
                    "failed to send notification mail"
                ),
            }
        });
        Ok(())
    }
}

fn mailbox(
    notifier: &'static str,
    value: &Option<String>,
    setting: &'static str,
) -> Result<Mailbox, NotifyError> {
    let raw = required(notifier, value, setting)?;
    raw.parse().map_err(|e: lettre::address::AddressError| NotifyError::InvalidSetting {
        notifier,
        setting,
        details: format!("'{}': {}", raw, e),
    })
}

impl Notifier for MailNotifier {
    fn name(&self) -> &str {
        self.name
    }

    fn normal_start(&self, unit: &str) -> Result<(), NotifyError> {
        self.send(unit, LifecycleEvent::NormalStart)
    }

    fn normal_stop(&self, unit: &str) -> Result<(), NotifyError> {
        self.send(unit, LifecycleEvent::NormalStop)
    }

    fn failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.send(unit, LifecycleEvent::Failure)
    }

    fn ongoing_failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.send(unit, LifecycleEvent::OngoingFailure)
    }

    fn recovery(&self, unit: &str) -> Result<(), NotifyError> {
        self.send(unit, LifecycleEvent::Recovery)
    }

    fn change_from_unknown(&self, unit: &str) -> Result<(), NotifyError> {
        self.send(unit, LifecycleEvent::ChangeFromUnknown)
    }
}
