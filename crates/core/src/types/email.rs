//! Contact email for the delivery form.

use serde::{Deserialize, Serialize};

/// Why a string was not accepted as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {} characters", Email::MAX_LENGTH)]
    TooLong,
    #[error("email must look like name@domain")]
    Malformed,
}

/// The payer's email, as sent to the order service and pre-filled in the
/// gateway widget.
///
/// Checked about as strictly as a browser's `type="email"` input: something
/// on both sides of a single `@`, no whitespace, at most 254 characters.
///
/// ```
/// use quickbite_core::Email;
///
/// assert!(Email::parse("diner@quickbite.in").is_ok());
/// assert!(Email::parse("diner@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Parse a trimmed email.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] for blank, overlong or malformed input.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let email = raw.trim();
        if email.is_empty() {
            return Err(EmailError::Empty);
        }
        if email.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        let well_formed = email
            .split_once('@')
            .is_some_and(|(mailbox, host)| {
                !mailbox.is_empty() && !host.is_empty() && !host.contains('@')
            })
            && !email.contains(char::is_whitespace);
        if !well_formed {
            return Err(EmailError::Malformed);
        }

        Ok(Self(email.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
