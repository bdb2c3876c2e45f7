//! Site configuration and user-facing copy

/// Page-level settings
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Default mailto recipient when the form carries no `data-recipient`
    pub recipient: String,

    /// Text shown to visitors
    pub copy: SiteCopy,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            recipient: "hello@example.com".to_string(),
            copy: SiteCopy::default(),
        }
    }
}

impl SiteConfig {
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }
}

/// Labels and messages, overridable for a translated page
#[derive(Debug, Clone)]
pub struct SiteCopy {
    pub name_label: String,
    pub email_label: String,
    pub message_label: String,
    pub form_invalid: String,
    pub form_sending: String,
    pub skip_link: String,
}

impl Default for SiteCopy {
    fn default() -> Self {
        Self {
            name_label: "Name".to_string(),
            email_label: "Email".to_string(),
            message_label: "Message".to_string(),
            form_invalid: "Please fill in every field with a valid email address.".to_string(),
            form_sending: "Opening your email client...".to_string(),
            skip_link: "Skip to main content".to_string(),
        }
    }
}
