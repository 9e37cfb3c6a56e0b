//! Report intake: validation and identity assignment.
//!
//! Required fields are enforced here, at creation time, so the match engine
//! can assume well-formed reports.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ItemReport, NewReport, User};

/// Validation errors raised while creating a report or user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// A required text field is empty or whitespace only.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    /// Latitude or longitude is non-finite or out of range.
    #[error("invalid coordinates: latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinates,
}

/// Validate `new` and turn it into a stored [`ItemReport`].
///
/// Assigns a fresh UUID and the current UTC time. Text fields are trimmed;
/// optional fields that are blank after trimming become `None`.
pub fn create_report(new: NewReport) -> Result<ItemReport, IntakeError> {
    let name = required("name", &new.name)?;
    let description = required("description", &new.description)?;
    let location = required("location", &new.location)?;
    let reporter_id = required("reporter_id", &new.reporter_id)?;

    if let Some(coords) = &new.coordinates {
        if !coords.is_valid() {
            return Err(IntakeError::InvalidCoordinates);
        }
    }

    Ok(ItemReport {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        location,
        coordinates: new.coordinates,
        timestamp: Utc::now(),
        reporter_id,
        image_reference: optional(new.image_reference),
        contact_name: optional(new.contact_name),
        contact_email: optional(new.contact_email),
        contact_phone: optional(new.contact_phone),
    })
}

/// Validate a name/email pair and build a [`User`] with a fresh id.
pub fn create_user(name: &str, email: &str) -> Result<User, IntakeError> {
    Ok(User {
        id: Uuid::new_v4().to_string(),
        name: required("name", name)?,
        email: normalize_email(&required("email", email)?),
    })
}

/// Canonical form of an email address: trimmed, Unicode lowercase.
///
/// Stores compare emails only in this form, both when registering and on lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: &'static str, value: &str) -> Result<String, IntakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
