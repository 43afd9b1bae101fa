pub mod templates;

use std::sync::Mutex;

use lettre::{
    message::{Mailbox, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use thiserror::Error;
use tracing::{event, Level};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP failure: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outgoing mail delivery. The SMTP transport is the real thing; the other
/// two variants exist for local development and tests.
pub enum Mailer {
    Smtp {
        transport: SmtpTransport,
        from: Mailbox,
    },
    /// Logs each message instead of delivering it.
    Log,
    /// Captures messages so tests can assert on them.
    Memory(Mutex<Vec<EmailMessage>>),
}

impl Mailer {
    pub fn smtp(host: &str, username: &str, password: &str, from: &str) -> Result<Self, Error> {
        let transport = SmtpTransport::relay(host)?
            .credentials(Credentials::new(
                username.to_string(),
                password.to_string(),
            ))
            .build();

        Ok(Self::Smtp {
            transport,
            from: from.parse()?,
        })
    }

    pub fn memory() -> Self {
        Self::Memory(Mutex::new(Vec::new()))
    }

    /// Sends one message. This blocks on the SMTP round trip, so callers on
    /// an async runtime should run it inside `spawn_blocking`.
    pub fn send(&self, email: &EmailMessage) -> Result<(), Error> {
        match self {
            Self::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(email.to.parse()?)
                    .subject(email.subject.clone())
                    .singlepart(SinglePart::html(email.html.clone()))?;

                transport.send(&message)?;
                Ok(())
            }
            Self::Log => {
                event!(Level::INFO, to = %email.to, subject = %email.subject,
                    "mail delivery disabled, dropping message");
                Ok(())
            }
            Self::Memory(sent) => {
                sent.lock().unwrap().push(email.clone());
                Ok(())
            }
        }
    }

    /// Messages captured by a [`Mailer::Memory`]. Empty for other variants.
    pub fn sent(&self) -> Vec<EmailMessage> {
        match self {
            Self::Memory(sent) => sent.lock().unwrap().clone(),
            _ => Vec::new(),
        }
    }
}
