//! Delivery address collected at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::email::{Email, EmailError};

/// Errors produced when validating a [`DeliveryAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty.
    #[error("{} is required", .0.label())]
    Missing(AddressField),
    /// The email field does not look like an email address.
    #[error("invalid email: {0}")]
    InvalidEmail(String),
}

impl From<EmailError> for AddressError {
    fn from(err: EmailError) -> Self {
        Self::InvalidEmail(err.to_string())
    }
}

/// One field of the delivery address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    FirstName,
    LastName,
    Email,
    Street,
    City,
    State,
    Zipcode,
    Country,
    Phone,
}

impl AddressField {
    /// All fields, in form order.
    pub const ALL: [Self; 9] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Street,
        Self::City,
        Self::State,
        Self::Zipcode,
        Self::Country,
        Self::Phone,
    ];

    /// The form/wire name of the field (camelCase).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Street => "street",
            Self::City => "city",
            Self::State => "state",
            Self::Zipcode => "zipcode",
            Self::Country => "country",
            Self::Phone => "phone",
        }
    }

    /// Human-readable label, used as the input placeholder.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Email => "Email address",
            Self::Street => "Street",
            Self::City => "City",
            Self::State => "State",
            Self::Zipcode => "Zip code",
            Self::Country => "Country",
            Self::Phone => "Phone",
        }
    }

    /// Look a field up by its form name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the order is delivered, and who to contact about it.
///
/// Construct via [`DeliveryAddress::validated`]; every field is a trimmed,
/// non-empty string and the email has been parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

impl DeliveryAddress {
    /// Build an address from raw field values.
    ///
    /// `value` is called once per field in form order; the first empty field
    /// is reported.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Missing`] for the first blank field, or
    /// [`AddressError::InvalidEmail`] if the email cannot be parsed.
    pub fn validated<'a, F>(mut value: F) -> Result<Self, AddressError>
    where
        F: FnMut(AddressField) -> &'a str,
    {
        let mut required = |field: AddressField| -> Result<String, AddressError> {
            let raw = value(field).trim();
            if raw.is_empty() {
                return Err(AddressError::Missing(field));
            }
            Ok(raw.to_owned())
        };

        let first_name = required(AddressField::FirstName)?;
        let last_name = required(AddressField::LastName)?;
        let email = Email::parse(&required(AddressField::Email)?)?;
        let street = required(AddressField::Street)?;
        let city = required(AddressField::City)?;
        let state = required(AddressField::State)?;
        let zipcode = required(AddressField::Zipcode)?;
        let country = required(AddressField::Country)?;
        let phone = required(AddressField::Phone)?;

        Ok(Self {
            first_name,
            last_name,
            email,
            street,
            city,
            state,
            zipcode,
            country,
            phone,
        })
    }

    /// Full name as shown to the payment gateway ("First Last").
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
