//! Domain models that mirror the `contacts` table and get passed throughout the
//! TUI. They stay plain data holders so the persistence and presentation layers
//! can own the interesting logic.

use std::fmt;

use thiserror::Error;

/// Column limit for `name`, matching `VARCHAR(40)` in the schema.
pub const NAME_MAX_LEN: usize = 40;
/// Column limit for `phone`, matching `VARCHAR(10)` in the schema.
pub const PHONE_MAX_LEN: usize = 10;
/// Column limit for `email`, matching `VARCHAR(40)` in the schema.
pub const EMAIL_MAX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A stored contact row.
pub struct Contact {
    /// Primary key assigned by SQLite. Delete and update flows bubble it back
    /// to the model.
    pub id: i64,
    pub name: String,
    /// Phone is the only optional column; an empty form field is stored as
    /// `NULL`.
    pub phone: Option<String>,
    pub email: String,
}

impl Contact {
    /// Phone number for display, with a dash standing in for a missing value.
    pub fn phone_display(&self) -> &str {
        self.phone.as_deref().unwrap_or("-")
    }

    /// `mailto:` URI handed to the system mail client.
    pub fn mailto(&self) -> String {
        format!("mailto:{}", self.email)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Editable fields of a contact, used by the form widgets and by the model's
/// insert/update helpers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Phone,
    Email,
}

impl ContactField {
    /// Label shown next to the field and used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            ContactField::Name => "Name",
            ContactField::Phone => "Phone",
            ContactField::Email => "Email",
        }
    }

    pub fn max_len(self) -> usize {
        match self {
            ContactField::Name => NAME_MAX_LEN,
            ContactField::Phone => PHONE_MAX_LEN,
            ContactField::Email => EMAIL_MAX_LEN,
        }
    }

    /// Whether the form refuses to submit while the field is blank.
    pub fn is_required(self) -> bool {
        !matches!(self, ContactField::Phone)
    }
}

/// Reasons a draft is rejected before it reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("You must provide a contact's {}", .0.label())]
    MissingField(ContactField),
    #[error("{} must be at most {max} characters", .field.label())]
    TooLong { field: ContactField, max: usize },
}

/// Contact fields that have not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
}

impl ContactDraft {
    pub fn new(name: impl Into<String>, phone: Option<&str>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.map(str::to_string),
            email: email.into(),
        }
    }

    /// Trim every field, fold a blank phone into `None`, and enforce the
    /// required-field and column-length rules.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty());

        if name.is_empty() {
            return Err(ValidationError::MissingField(ContactField::Name));
        }
        if email.is_empty() {
            return Err(ValidationError::MissingField(ContactField::Email));
        }

        let lengths = [
            (ContactField::Name, name.chars().count()),
            (
                ContactField::Phone,
                phone.as_deref().map_or(0, |p| p.chars().count()),
            ),
            (ContactField::Email, email.chars().count()),
        ];
        for (field, len) in lengths {
            if len > field.max_len() {
                return Err(ValidationError::TooLong {
                    field,
                    max: field.max_len(),
                });
            }
        }

        Ok(Self { name, phone, email })
    }
}

impl From<&Contact> for ContactDraft {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
        }
    }
}
