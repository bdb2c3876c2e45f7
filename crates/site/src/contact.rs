//! Contact form: payload, validation and the mailto handoff
//!
//! Nothing is sent from the page. A valid submission is turned into a
//! `mailto:` URL and handed to whatever mail client the visitor's system has
//! registered.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::SiteConfig;
use crate::dom::Dom;
use crate::error::{SiteResult, ValidationError};
use crate::notification::{NotificationCenter, Severity};

/// Contact form fields, all required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    /// Checked in this order; the first empty one is reported
    pub const REQUIRED: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Subject => "subject",
            Field::Message => "message",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::REQUIRED.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Whether `email` has the `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

/// Values submitted through the contact form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactPayload {
    /// Collect known fields from `(name, value)` pairs; unknown names are ignored
    /// and a repeated name keeps its last value
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut payload = Self::default();
        for (name, value) in fields {
            if let Some(field) = Field::from_name(name.as_ref()) {
                *payload.get_mut(field) = value.into();
            }
        }
        payload
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Subject => &mut self.subject,
            Field::Message => &mut self.message,
        }
    }

    /// Every field non-blank, then the email shape
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(field) = Field::REQUIRED
            .into_iter()
            .find(|f| self.get(*f).trim().is_empty())
        {
            return Err(ValidationError::MissingField(field));
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }

    /// Build the `mailto:` URL; subject and body are percent-encoded
    pub fn mailto(&self, recipient: &str, config: &SiteConfig) -> String {
        let copy = &config.copy;
        let body = format!(
            "{}: {}\n{}: {}\n\n{}:\n{}",
            copy.name_label, self.name, copy.email_label, self.email, copy.message_label, self.message,
        );
        format!(
            "mailto:{}?subject={}&body={}",
            recipient,
            urlencoding::encode(&self.subject),
            urlencoding::encode(&body),
        )
    }
}

/// Handle a submit of the contact form
///
/// Invalid input shows an error notification and leaves the form untouched.
/// Valid input shows a success notification, navigates to the mailto URL and
/// resets the form.
pub fn submit<D: Dom>(
    dom: &mut D,
    form: &D::Node,
    config: &SiteConfig,
    notifications: &mut NotificationCenter<D::Node>,
) -> SiteResult<String> {
    let payload = ContactPayload::from_fields(dom.form_fields(form));

    if let Err(e) = payload.validate() {
        debug!("Contact form rejected: {}", e);
        notifications.show(dom, &config.copy.form_invalid, Severity::Error);
        return Err(e.into());
    }

    let recipient = dom
        .attribute(form, "data-recipient")
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| config.recipient.clone());
    let url = payload.mailto(&recipient, config);

    notifications.show(dom, &config.copy.form_sending, Severity::Success);
    dom.navigate(&url);
    dom.reset_form(form);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeId};
    use crate::error::SiteError;
    use proptest::prelude::*;
    use test_case::test_case;

    fn valid() -> ContactPayload {
        ContactPayload {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Let's talk.".to_string(),
        }
    }

    #[test_case("ada@example.com", true ; "plain")]
    #[test_case("a.b+tag@mail.example.co", true ; "dotted local and subdomain")]
    #[test_case("ada@example", false ; "no tld")]
    #[test_case("ada.example.com", false ; "no at")]
    #[test_case("ada @example.com", false ; "space")]
    #[test_case("@example.com", false ; "empty local")]
    #[test_case("ada@@example.com", false ; "double at")]
    fn test_email_shape(email: &str, expected: bool) {
        assert_eq!(is_valid_email(email), expected);
    }

    #[test]
    fn test_from_fields_ignores_unknown_names() {
        let payload = ContactPayload::from_fields([
            ("name", "Ada"),
            ("website", "ignored"),
            ("name", "Ada L."),
        ]);
        assert_eq!(payload.name, "Ada L.");
        assert!(payload.email.is_empty());
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        let mut payload = valid();
        payload.subject = "   ".to_string();
        payload.message.clear();
        assert_eq!(payload.validate(), Err(ValidationError::MissingField(Field::Subject)));
    }

    #[test]
    fn test_mailto_encodes_subject_and_body() {
        let mut payload = valid();
        payload.subject = "Hi & welcome".to_string();
        let url = payload.mailto("me@example.com", &SiteConfig::default());

        assert!(url.starts_with("mailto:me@example.com?subject=Hi%20%26%20welcome&body="));
        assert!(url.contains("Name%3A%20Ada%20Lovelace%0AEmail%3A%20ada%40example.com%0A%0AMessage%3A%0A"));
    }

    #[test]
    fn test_email_pattern_compiles() {
        assert!(EMAIL.is_some());
    }

    fn contact_form(dom: &mut MemoryDom, email: &str) -> NodeId {
        let body = dom.body();
        let form = dom.append(body, "form", &[("id", "contact-form")]);
        for field in Field::REQUIRED {
            let input = dom.append(form, "input", &[("name", field.as_str())]);
            let value = if field == Field::Email { email } else { "Ada" };
            dom.set_value(input, value);
        }
        form
    }

    #[test]
    fn test_submit_rejects_through_site_error() {
        let mut dom = MemoryDom::new();
        let form = contact_form(&mut dom, "ada.example.com");
        let mut notifications = NotificationCenter::new();

        let result = submit(&mut dom, &form, &SiteConfig::default(), &mut notifications);

        assert_eq!(result, Err(SiteError::Validation(ValidationError::InvalidEmail)));
        assert!(dom.navigations().is_empty());
        assert_eq!(dom.count(".notification-error"), 1);
    }

    #[test]
    fn test_submit_hands_off_valid_form() {
        let mut dom = MemoryDom::new();
        let form = contact_form(&mut dom, "ada@example.com");
        let mut notifications = NotificationCenter::new();

        let url = submit(&mut dom, &form, &SiteConfig::default().with_recipient("me@example.com"), &mut notifications)
            .unwrap();

        assert!(url.starts_with("mailto:me@example.com?subject=Ada&body="));
        assert_eq!(dom.navigations(), &[url]);
    }

    proptest! {
        #[test]
        fn prop_any_blank_field_fails(index in 0usize..4, blank in "[ \t]{0,3}") {
            let mut payload = valid();
            let field = Field::REQUIRED[index];
            *payload.get_mut(field) = blank;
            prop_assert_eq!(payload.validate(), Err(ValidationError::MissingField(field)));
        }

        #[test]
        fn prop_shaped_emails_pass(local in "[a-z0-9._]{1,12}", domain in "[a-z0-9-]{1,12}", tld in "[a-z]{2,6}") {
            let mut payload = valid();
            payload.email = format!("{local}@{domain}.{tld}");
            prop_assert!(payload.validate().is_ok());
        }
    }
}
