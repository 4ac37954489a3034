use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::email::EmailCredentials;
use crate::error::GlanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    City,
    Category,
    Sender,
    Password,
    Receiver,
    SmtpHost,
    SmtpPort,
}

impl Field {
    pub const fn all() -> &'static [Field] {
        &[
            Field::City,
            Field::Category,
            Field::Sender,
            Field::Password,
            Field::Receiver,
            Field::SmtpHost,
            Field::SmtpPort,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::City => "city",
            Field::Category => "category",
            Field::Sender => "sender",
            Field::Password => "password",
            Field::Receiver => "receiver",
            Field::SmtpHost => "smtp-host",
            Field::SmtpPort => "smtp-port",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Field {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase().replace('_', "-");
        Field::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Field::all().iter().map(Field::as_str).collect();
                format!("Unknown field '{value}'. Fields: {}.", names.join(", "))
            })
    }
}

/// The values of every form field at one instant.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub city: String,
    pub category: String,
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub smtp_host: String,
    pub smtp_port: String,
}

impl fmt::Debug for FormSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSnapshot")
            .field("city", &self.city)
            .field("category", &self.category)
            .field("sender", &self.sender)
            .field("password", &"***")
            .field("receiver", &self.receiver)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

/// Trimmed city and category, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub city: String,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct SendRequest {
    pub query: FetchQuery,
    pub credentials: EmailCredentials,
}

impl FormSnapshot {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::City => &self.city,
            Field::Category => &self.category,
            Field::Sender => &self.sender,
            Field::Password => &self.password,
            Field::Receiver => &self.receiver,
            Field::SmtpHost => &self.smtp_host,
            Field::SmtpPort => &self.smtp_port,
        }
    }

    pub fn fetch_query(&self) -> Result<FetchQuery, GlanceError> {
        let city = self.city.trim();
        let category = self.category.trim();
        if city.is_empty() || category.is_empty() {
            return Err(GlanceError::input("Please enter a city and news category."));
        }
        Ok(FetchQuery {
            city: city.to_string(),
            category: category.to_string(),
        })
    }

    /// Validates everything a send needs, including the port, before any network work.
    pub fn send_request(&self) -> Result<SendRequest, GlanceError> {
        let sender = self.sender.trim();
        let receiver = self.receiver.trim();
        let smtp_host = self.smtp_host.trim();
        let smtp_port = self.smtp_port.trim();

        let required = [
            sender,
            self.password.as_str(),
            receiver,
            smtp_host,
            smtp_port,
            self.city.trim(),
            self.category.trim(),
        ];
        if required.iter().any(|v| v.is_empty()) {
            return Err(GlanceError::input("Please fill in all email and data fields."));
        }

        let smtp_port = parse_port(smtp_port)?;
        let query = self.fetch_query()?;

        Ok(SendRequest {
            query,
            credentials: EmailCredentials {
                sender: sender.to_string(),
                password: self.password.clone(),
                receiver: receiver.to_string(),
                smtp_host: smtp_host.to_string(),
                smtp_port,
            },
        })
    }
}

fn parse_port(raw: &str) -> Result<u16, GlanceError> {
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(GlanceError::input("Please enter a valid SMTP port number.")),
    }
}

/// Form fields shared between the shell and the scheduler.
///
/// Each field sits behind its own lock and no lock is held across a snapshot,
/// so an edit made while a snapshot is being taken may or may not be seen.
#[derive(Debug, Default)]
pub struct LiveForm {
    city: RwLock<String>,
    category: RwLock<String>,
    sender: RwLock<String>,
    password: RwLock<String>,
    receiver: RwLock<String>,
    smtp_host: RwLock<String>,
    smtp_port: RwLock<String>,
}

impl LiveForm {
    pub fn new(initial: FormSnapshot) -> Self {
        Self {
            city: RwLock::new(initial.city),
            category: RwLock::new(initial.category),
            sender: RwLock::new(initial.sender),
            password: RwLock::new(initial.password),
            receiver: RwLock::new(initial.receiver),
            smtp_host: RwLock::new(initial.smtp_host),
            smtp_port: RwLock::new(initial.smtp_port),
        }
    }

    fn slot(&self, field: Field) -> &RwLock<String> {
        match field {
            Field::City => &self.city,
            Field::Category => &self.category,
            Field::Sender => &self.sender,
            Field::Password => &self.password,
            Field::Receiver => &self.receiver,
            Field::SmtpHost => &self.smtp_host,
            Field::SmtpPort => &self.smtp_port,
        }
    }

    pub fn get(&self, field: Field) -> String {
        self.slot(field)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, field: Field, value: impl Into<String>) {
        *self.slot(field).write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    pub fn current_form_snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            city: self.get(Field::City),
            category: self.get(Field::Category),
            sender: self.get(Field::Sender),
            password: self.get(Field::Password),
            receiver: self.get(Field::Receiver),
            smtp_host: self.get(Field::SmtpHost),
            smtp_port: self.get(Field::SmtpPort),
        }
    }
}
