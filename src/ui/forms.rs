use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Contact, ContactDraft, ContactField, ValidationError};

/// Editable buffers behind the add dialog and the inline edit page.
#[derive(Clone, Debug)]
pub(crate) struct ContactForm {
    pub(crate) name: String,
    pub(crate) phone: String,
    pub(crate) email: String,
    pub(crate) active: ContactField,
    pub(crate) error: Option<String>,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            active: ContactField::Name,
            error: None,
        }
    }
}

impl ContactForm {
    /// Populate the form from an existing contact when editing.
    pub(crate) fn from_contact(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone().unwrap_or_default(),
            email: contact.email.clone(),
            ..Self::default()
        }
    }

    /// Cycle focus Name → Phone → Email → Name.
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            ContactField::Name => ContactField::Phone,
            ContactField::Phone => ContactField::Email,
            ContactField::Email => ContactField::Name,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            ContactField::Name => ContactField::Email,
            ContactField::Phone => ContactField::Name,
            ContactField::Email => ContactField::Phone,
        };
    }

    /// Append a character to the active field. Control characters and input
    /// past the column limit are refused.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let field = self.active;
        if self.value_len(field) >= field.max_len() {
            return false;
        }
        self.value_mut(field).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Validate the buffers and hand back a draft ready for the model.
    pub(crate) fn parse_inputs(&self) -> Result<ContactDraft, ValidationError> {
        ContactDraft {
            name: self.name.clone(),
            phone: Some(self.phone.clone()),
            email: self.email.clone(),
        }
        .validate()
    }

    pub(crate) fn value(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Phone => &self.phone,
            ContactField::Email => &self.email,
        }
    }

    fn value_mut(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Phone => &mut self.phone,
            ContactField::Email => &mut self.email,
        }
    }

    pub(crate) fn value_len(&self, field: ContactField) -> usize {
        self.value(field).chars().count()
    }

    /// Render one `Label: value` line, highlighting the focused field and
    /// ghosting empty placeholders.
    pub(crate) fn build_line(&self, field: ContactField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            if field.is_required() {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(field_prefix(field)),
            Span::styled(display, style),
        ])
    }
}

/// `"Name: "`-style prefix, shared with cursor placement.
pub(crate) fn field_prefix(field: ContactField) -> String {
    format!("{}: ", field.label())
}

/// Pending single-row deletion.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl From<&Contact> for ConfirmDelete {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            name: contact.name.clone(),
        }
    }
}

/// Pending removal of every row.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmClearAll {
    pub(crate) count: usize,
}
