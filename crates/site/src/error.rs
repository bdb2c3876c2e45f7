//! Error types for the page behaviour layer

use thiserror::Error;

use crate::contact::Field;

/// Result type alias for site operations
pub type SiteResult<T> = Result<T, SiteError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiteError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Form rejected: {0}")]
    Validation(#[from] ValidationError),
}

/// Reasons a contact form payload is refused before the mailto handoff
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field '{0}' is empty")]
    MissingField(Field),

    #[error("email address is not of the form local@domain.tld")]
    InvalidEmail,
}
