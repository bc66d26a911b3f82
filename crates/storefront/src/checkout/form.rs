//! Delivery form state and validation.
//!
//! [`CheckoutForm`] holds what the customer typed into the delivery form,
//! the chosen payment method, and the form's submission ID. It is rebuilt
//! from the posted pairs on every submit and re-rendered (values kept) when
//! the submission fails.

use std::collections::HashMap;

use quickbite_core::{AddressError, AddressField, DeliveryAddress, PaymentMethod};
use thiserror::Error;
use uuid::Uuid;

/// Form field carrying the payment method.
pub const PAYMENT_FIELD: &str = "payment";

/// Form field carrying the submission ID.
pub const SUBMISSION_FIELD: &str = "submissionId";

/// A form field name that is not part of the delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field: {0}")]
pub struct UnknownField(pub String);

/// Why a checkout form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An address field is blank or the email is malformed.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The posted payment method is not one we offer.
    #[error("unsupported payment method: {0}")]
    PaymentMethod(String),

    /// The form was posted without a usable submission ID.
    #[error("the form has expired, please submit it again")]
    MissingSubmissionId,
}

impl ValidationError {
    /// The address field at fault, if any.
    #[must_use]
    pub const fn field(&self) -> Option<AddressField> {
        match self {
            Self::Address(AddressError::Missing(field)) => Some(*field),
            Self::Address(AddressError::InvalidEmail(_)) => Some(AddressField::Email),
            _ => None,
        }
    }
}

/// The checkout form controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    values: HashMap<AddressField, String>,
    payment_method: PaymentMethod,
    rejected_payment_method: Option<String>,
    submission_id: Option<Uuid>,
}

impl CheckoutForm {
    /// An empty form, cash on delivery selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one address field by its form name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] if `name` is not an address field.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), UnknownField> {
        let field = AddressField::from_name(name).ok_or_else(|| UnknownField(name.to_string()))?;
        self.values.insert(field, value.into());
        Ok(())
    }

    /// Current value of an address field, as typed. Empty if never set.
    #[must_use]
    pub fn value(&self, field: AddressField) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    /// The selected payment method.
    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Select a payment method.
    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
        self.rejected_payment_method = None;
    }

    /// The submission ID the form was rendered with.
    #[must_use]
    pub const fn submission_id(&self) -> Option<Uuid> {
        self.submission_id
    }

    /// Build the form from posted `(name, value)` pairs.
    ///
    /// Fields that are neither address fields, the payment method nor the
    /// submission ID are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut form = Self::new();

        for (name, value) in pairs {
            match name.as_ref() {
                PAYMENT_FIELD => {
                    let value = value.into();
                    match PaymentMethod::from_form_value(value.trim()) {
                        Some(method) => form.select_payment_method(method),
                        None => form.rejected_payment_method = Some(value),
                    }
                }
                SUBMISSION_FIELD => {
                    form.submission_id = Uuid::parse_str(value.into().trim()).ok();
                }
                other => {
                    if let Err(e) = form.set_field(other, value) {
                        tracing::debug!("Ignoring checkout form field: {e}");
                    }
                }
            }
        }

        form
    }

    /// Check the form and produce the delivery address.
    ///
    /// Fields are checked in form order and the first problem is reported.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if any address field is blank, the email
    /// is malformed, the payment method is unsupported, or the submission ID
    /// is missing.
    pub fn validate(&self) -> Result<DeliveryAddress, ValidationError> {
        let address = DeliveryAddress::validated(|field| self.value(field))?;

        if let Some(rejected) = &self.rejected_payment_method {
            return Err(ValidationError::PaymentMethod(rejected.clone()));
        }
        if self.submission_id.is_none() {
            return Err(ValidationError::MissingSubmissionId);
        }

        Ok(address)
    }

    /// Input descriptions for rendering, in form order.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldView<'_>> {
        AddressField::ALL
            .into_iter()
            .map(|field| FieldView {
                name: field.name(),
                label: field.label(),
                input_type: if field == AddressField::Email {
                    "email"
                } else {
                    "text"
                },
                value: self.value(field),
            })
            .collect()
    }
}

/// One rendered input of the delivery form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldView<'a> {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SUBMISSION: &str = "6f1c4f1e-4d7a-4a47-9a53-2c1a8e0b5d11";

    fn filled_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("firstName", "Ravi"),
            ("lastName", "Kumar"),
            ("email", "ravi@quickbite.in"),
            ("street", "12 MG Road"),
            ("city", "Bengaluru"),
            ("state", "Karnataka"),
            ("zipcode", "560001"),
            ("country", "India"),
            ("phone", "9876543210"),
            ("payment", "online"),
            ("submissionId", SUBMISSION),
        ]
    }

    #[test]
    fn test_set_field_and_value() {
        let mut form = CheckoutForm::new();
        form.set_field("city", "Pune").unwrap();
        assert_eq!(form.value(AddressField::City), "Pune");

        form.set_field("city", "Mumbai").unwrap();
        assert_eq!(form.value(AddressField::City), "Mumbai");
    }

    #[test]
    fn test_set_unknown_field() {
        let mut form = CheckoutForm::new();
        let err = form.set_field("favouriteDish", "Dosa").unwrap_err();
        assert_eq!(err, UnknownField("favouriteDish".to_string()));
    }

    #[test]
    fn test_unset_fields_read_empty() {
        let mut form = CheckoutForm::new();
        form.set_field("phone", "9876543210").unwrap();

        for field in AddressField::ALL {
            let expected = if field == AddressField::Phone { "9876543210" } else { "" };
            assert_eq!(form.value(field), expected, "{field:?}");
        }
    }

    #[test]
    fn test_default_payment_method_is_cod() {
        let form = CheckoutForm::new();
        assert_eq!(form.payment_method(), PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_from_pairs_complete_form() {
        let form = CheckoutForm::from_pairs(filled_pairs());

        assert_eq!(form.payment_method(), PaymentMethod::Online);
        assert_eq!(form.submission_id(), Some(Uuid::parse_str(SUBMISSION).unwrap()));

        let address = form.validate().unwrap();
        assert_eq!(address.full_name(), "Ravi Kumar");
        assert_eq!(address.zipcode, "560001");
    }

    #[test]
    fn test_blank_field_fails_validation() {
        let pairs = filled_pairs()
            .into_iter()
            .map(|(k, v)| if k == "street" { (k, "   ") } else { (k, v) });
        let form = CheckoutForm::from_pairs(pairs);

        let err = form.validate().unwrap_err();
        assert_eq!(err.field(), Some(AddressField::Street));
        assert_eq!(err.to_string(), "Street is required");
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        let form = CheckoutForm::from_pairs([("submissionId", SUBMISSION)]);
        let err = form.validate().unwrap_err();
        assert_eq!(err.field(), Some(AddressField::FirstName));
    }

    #[test]
    fn test_bad_email_fails_validation() {
        let pairs = filled_pairs()
            .into_iter()
            .map(|(k, v)| if k == "email" { (k, "ravi.quickbite.in") } else { (k, v) });
        let err = CheckoutForm::from_pairs(pairs).validate().unwrap_err();
        assert_eq!(err.field(), Some(AddressField::Email));
    }

    #[test]
    fn test_unsupported_payment_method() {
        let pairs = filled_pairs()
            .into_iter()
            .map(|(k, v)| if k == "payment" { (k, "crypto") } else { (k, v) });
        let err = CheckoutForm::from_pairs(pairs).validate().unwrap_err();
        assert_eq!(err, ValidationError::PaymentMethod("crypto".to_string()));
    }

    #[test]
    fn test_missing_submission_id() {
        let pairs = filled_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "submissionId");
        let err = CheckoutForm::from_pairs(pairs).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingSubmissionId);
    }

    #[test]
    fn test_fields_in_form_order() {
        let form = CheckoutForm::from_pairs(filled_pairs());
        let fields = form.fields();

        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0].name, "firstName");
        assert_eq!(fields[2].input_type, "email");
        assert_eq!(fields[8].value, "9876543210");
    }
}
