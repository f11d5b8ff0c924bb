//! Core visitor types for visitlog.
//!
//! This module defines the record written for every registered visit and the
//! closed set of visit purposes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a visitor came to the building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    /// Parcel or food delivery.
    Delivery,
    /// Personal guest of a resident.
    Guest,
    /// Repairs, cleaning and other building work.
    Maintenance,
    /// Anything else.
    Other,
}

impl Purpose {
    /// Every purpose, in display order.
    pub const ALL: [Purpose; 4] = [
        Purpose::Delivery,
        Purpose::Guest,
        Purpose::Maintenance,
        Purpose::Other,
    ];

    /// The canonical name, as stored and exported.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "Delivery",
            Self::Guest => "Guest",
            Self::Maintenance => "Maintenance",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name one of the four purposes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown visit purpose: {0}")]
pub struct ParsePurposeError(pub String);

impl FromStr for Purpose {
    type Err = ParsePurposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParsePurposeError(s.to_string()))
    }
}

/// A single registered visit.
///
/// Records are created once, by the registration form, and never edited.
/// The `id` and `timestamp` are fixed at creation and only exposed through
/// read accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    id: String,
    name: String,
    flat_number: String,
    purpose: Purpose,
    mobile: String,
    timestamp: DateTime<Utc>,
}

impl Visitor {
    /// Build a record from already-validated fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        flat_number: impl Into<String>,
        purpose: Purpose,
        mobile: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            flat_number: flat_number.into(),
            purpose,
            mobile: mobile.into(),
            timestamp,
        }
    }

    /// Unique identifier assigned at registration.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Visitor's full name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destination unit.
    #[must_use]
    pub fn flat_number(&self) -> &str {
        &self.flat_number
    }

    /// Reason for the visit.
    #[must_use]
    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    /// Ten-digit mobile number.
    #[must_use]
    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    /// When the visitor was registered.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
