//! Visitor registration.
//!
//! [`RegistrationForm`] holds raw user input. Submitting it validates every
//! field, builds a [`Visitor`] with a fresh id and the current time, and adds
//! it to the register. Invalid input never reaches the register.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::KeyValueBackend;
use crate::store::VisitorStore;
use crate::visitor::{Purpose, Visitor};

/// Minimum name length, in characters.
pub const MIN_NAME_LENGTH: usize = 2;

/// Required mobile number length, in digits.
pub const MOBILE_LENGTH: usize = 10;

fn mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only; `\d` would also accept other scripts' digits.
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("mobile pattern is valid"))
}

/// A form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Visitor's name.
    Name,
    /// Destination flat.
    FlatNumber,
    /// Reason for visiting.
    Purpose,
    /// Contact number.
    Mobile,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::FlatNumber => write!(f, "flat number"),
            Self::Purpose => write!(f, "purpose"),
            Self::Mobile => write!(f, "mobile"),
        }
    }
}

/// One field's validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The offending field.
    pub field: Field,
    /// Message to show next to it.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field failure from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Iterate over the failures in field order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Field values that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidVisit {
    /// Visitor's name.
    pub name: String,
    /// Destination flat.
    pub flat_number: String,
    /// Reason for visiting.
    pub purpose: Purpose,
    /// Ten-digit mobile number.
    pub mobile: String,
}

impl ValidVisit {
    /// Stamp these details with an id and registration time.
    #[must_use]
    pub fn into_visitor(self, id: impl Into<String>, timestamp: DateTime<Utc>) -> Visitor {
        Visitor::new(
            id,
            self.name,
            self.flat_number,
            self.purpose,
            self.mobile,
            timestamp,
        )
    }
}

/// Raw registration input.
///
/// A default purpose may be pre-selected for convenience; it is validated
/// like any other input and restored when the form is reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    /// Visitor's full name.
    pub name: String,
    /// Destination flat, e.g. `A-101`.
    pub flat_number: String,
    /// Selected purpose, as typed or chosen.
    pub purpose: Option<String>,
    /// Mobile number.
    pub mobile: String,
    default_purpose: Option<Purpose>,
}

impl RegistrationForm {
    /// An empty form with no purpose selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty form with `purpose` pre-selected.
    #[must_use]
    pub fn with_default_purpose(purpose: Purpose) -> Self {
        Self {
            purpose: Some(purpose.to_string()),
            default_purpose: Some(purpose),
            ..Self::default()
        }
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns all field failures at once.
    pub fn validate(&self) -> std::result::Result<ValidVisit, ValidationErrors> {
        let purpose = self.purpose.as_deref().and_then(|p| p.parse::<Purpose>().ok());

        let errors: Vec<FieldError> = [
            name_error(&self.name),
            flat_number_error(&self.flat_number),
            purpose
                .is_none()
                .then(|| FieldError::new(Field::Purpose, "Please select a purpose of visit.")),
            mobile_error(&self.mobile),
        ]
        .into_iter()
        .flatten()
        .collect();

        match purpose {
            Some(purpose) if errors.is_empty() => Ok(ValidVisit {
                name: self.name.clone(),
                flat_number: self.flat_number.clone(),
                purpose,
                mobile: self.mobile.clone(),
            }),
            _ => Err(errors.into()),
        }
    }

    /// Register the visitor with a new id and the current time.
    ///
    /// On success the form is reset and the new record returned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for bad input, leaving the form
    /// and the register untouched.
    pub fn submit<B: KeyValueBackend>(&mut self, store: &mut VisitorStore<B>) -> Result<Visitor> {
        self.submit_with(store, Uuid::new_v4().to_string(), Utc::now())
    }

    /// Register the visitor with a caller-supplied id and time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for bad input or
    /// [`crate::Error::DuplicateId`] if `id` is taken. In both cases the form
    /// and the register are untouched.
    pub fn submit_with<B: KeyValueBackend>(
        &mut self,
        store: &mut VisitorStore<B>,
        id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Visitor> {
        let visit = self.validate().map_err(|errors| {
            debug!(failed = errors.len(), "Registration rejected");
            errors
        })?;

        let visitor = visit.into_visitor(id, now);
        store.add(visitor.clone())?;
        self.reset();
        Ok(visitor)
    }

    /// Clear every input, restoring the pre-selected purpose if any.
    pub fn reset(&mut self) {
        self.name.clear();
        self.flat_number.clear();
        self.mobile.clear();
        self.purpose = self.default_purpose.map(|p| p.to_string());
    }
}

fn name_error(name: &str) -> Option<FieldError> {
    (name.chars().count() < MIN_NAME_LENGTH)
        .then(|| FieldError::new(Field::Name, "Name must be at least 2 characters."))
}

fn flat_number_error(flat_number: &str) -> Option<FieldError> {
    flat_number
        .is_empty()
        .then(|| FieldError::new(Field::FlatNumber, "Flat number is required."))
}

fn mobile_error(mobile: &str) -> Option<FieldError> {
    (!mobile_pattern().is_match(mobile))
        .then(|| FieldError::new(Field::Mobile, "Mobile number must be exactly 10 digits."))
}

/// Check an existing record, such as one read back from storage, against
/// the rules the form enforces on input.
///
/// # Errors
///
/// Returns every field that breaks a rule.
pub fn check_visitor(visitor: &Visitor) -> std::result::Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = [
        name_error(visitor.name()),
        flat_number_error(visitor.flat_number()),
        mobile_error(visitor.mobile()),
    ]
    .into_iter()
    .flatten()
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

/// Confirmation text shown after a successful registration.
#[must_use]
pub fn registration_notice(visitor: &Visitor) -> String {
    format!(
        "{} has been registered to visit flat {}.",
        visitor.name(),
        visitor.flat_number()
    )
}
