//! Input shape checks for the commands the presentation layer sends.

use crate::error::ValidationError;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

/// Buyer details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CustomerDetails {
    #[validate(custom = "validate_name")]
    pub name: String,
    #[validate(custom = "validate_email_address")]
    pub email: String,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
}

impl CustomerDetails {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: Option<String>) -> Self {
        Self { name: name.into(), email: email.into(), phone }
    }

    /// Trims every field; a blank phone counts as not given.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_optional(self.phone),
        }
    }
}

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(custom = "validate_name")]
    pub name: String,
    #[validate(custom = "validate_email_address")]
    pub email: String,
    #[validate(custom = "validate_message")]
    pub message: String,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
}

impl ContactForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>, phone: Option<String>) -> Self {
        Self { name: name.into(), email: email.into(), message: message.into(), phone }
    }

    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
            phone: normalize_optional(self.phone),
        }
    }
}

/// Runs the derive checks and reports the first failing field, in declaration order.
pub trait CheckInput: Validate {
    const FIELDS: &'static [&'static str];

    fn check(&self) -> Result<(), ValidationError> {
        self.validate().map_err(|errors| first_error(&errors, Self::FIELDS))
    }
}

impl CheckInput for CustomerDetails {
    const FIELDS: &'static [&'static str] = &["name", "email", "phone"];
}

impl CheckInput for ContactForm {
    const FIELDS: &'static [&'static str] = &["name", "email", "message", "phone"];
}

pub fn check_quantity(quantity: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&quantity) {
        Ok(())
    } else {
        Err(ValidationError::new("quantity", format!("Quantity must be between {min} and {max}")))
    }
}

/// 7 to 15 digits with an optional leading `+`; spaces and dashes are ignored.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| *c != ' ' && *c != '-').collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn validate_name(value: &str) -> Result<(), validator::ValidationError> {
    let len = value.trim().chars().count();
    if (2..=100).contains(&len) {
        Ok(())
    } else {
        Err(invalid("name_length", "Name must be between 2 and 100 characters"))
    }
}

/// RFC syntax, plus a dotted domain ending in a label of at least two letters.
pub fn is_valid_email(value: &str) -> bool {
    if !validator::validate_email(value) {
        return false;
    }
    let Some((_, domain)) = value.rsplit_once('@') else { return false };
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

fn validate_email_address(value: &str) -> Result<(), validator::ValidationError> {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(invalid("email", "Please enter a valid email address"))
    }
}

fn validate_phone(value: &str) -> Result<(), validator::ValidationError> {
    if is_valid_phone(value) {
        Ok(())
    } else {
        Err(invalid("phone_format", "Phone must have between 7 and 15 digits"))
    }
}

fn validate_message(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().chars().count() >= 10 {
        Ok(())
    } else {
        Err(invalid("message_length", "Message must be at least 10 characters"))
    }
}

fn invalid(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut err = validator::ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn first_error(errors: &ValidationErrors, order: &[&'static str]) -> ValidationError {
    let fields = errors.field_errors();
    order
        .iter()
        .find_map(|name| {
            let err = fields.get(name)?.first()?;
            let message = err.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("Invalid {name}"));
            Some(ValidationError::new(*name, message))
        })
        .unwrap_or_else(|| ValidationError::new("input", errors.to_string()))
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_customer() {
        let c = CustomerDetails::new("Ana Maria", "ana@example.com", Some("+57 300-123-4567".into()));
        assert_eq!(c.check(), Ok(()));
    }

    #[test]
    fn test_reports_first_failing_field() {
        let c = CustomerDetails::new("A", "not-an-email", None);
        let err = c.check().unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.message, "Name must be between 2 and 100 characters");

        let c = CustomerDetails::new("Ana", "not-an-email", Some("12".into()));
        assert_eq!(c.check().unwrap_err().field, "email");
    }

    #[test]
    fn test_email_needs_dotted_domain() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("ana.maria@mail.example.co"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("ana@example.c"));
        assert!(!is_valid_email("ana@example.123"));
        assert!(!is_valid_email("not-an-email"));

        let err = CustomerDetails::new("Ana", "a@localhost", None).check().unwrap_err();
        assert_eq!(err, ValidationError::new("email", "Please enter a valid email address"));
        let form = ContactForm::new("Ana", "a@localhost", "Do you ship to Cali?", None);
        assert_eq!(form.check().unwrap_err().field, "email");
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("3001234567"));
        assert!(is_valid_phone("+573001234567"));
        assert!(!is_valid_phone("123456"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("300abc4567"));
        let c = CustomerDetails::new("Ana", "ana@example.com", Some("12".into()));
        assert_eq!(c.check().unwrap_err().field, "phone");
    }

    #[test]
    fn test_normalized_drops_blank_phone() {
        let c = CustomerDetails::new("  Ana ", " ana@example.com ", Some("   ".into())).normalized();
        assert_eq!(c.name, "Ana");
        assert_eq!(c.email, "ana@example.com");
        assert_eq!(c.phone, None);
        assert_eq!(c.check(), Ok(()));
    }

    #[test]
    fn test_contact_message_length() {
        let form = ContactForm::new("Ana", "ana@example.com", "   hi   ", None);
        assert_eq!(form.check().unwrap_err().field, "message");
        let form = ContactForm::new("Ana", "ana@example.com", "Do you ship to Cali?", None);
        assert_eq!(form.check(), Ok(()));
    }

    #[test]
    fn test_quantity_range() {
        assert!(check_quantity(1, 1, 999).is_ok());
        assert!(check_quantity(999, 1, 999).is_ok());
        assert_eq!(check_quantity(0, 1, 999).unwrap_err().message, "Quantity must be between 1 and 999");
        assert!(check_quantity(1000, 1, 999).is_err());
    }
}
