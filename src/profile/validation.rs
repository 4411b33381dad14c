//! Pure validation of profile input

use crate::error::{MeshwellError, Result};
use crate::types::PrefServer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MAX_NAME_LENGTH: usize = 30;
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Fields supplied at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub pref_server: PrefServer,
    /// Terms of service acceptance
    #[serde(default)]
    pub tos: bool,
}

/// Editable profile details; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub pref_server: Option<PrefServer>,
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(MeshwellError::validation("Username is required").into());
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(MeshwellError::validation(format!(
            "Username cannot be longer than {} characters",
            MAX_USERNAME_LENGTH
        ))
        .into());
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(MeshwellError::validation(
            "Username may only contain letters, digits and @/./+/-/_",
        )
        .into());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(MeshwellError::validation(format!(
            "Email cannot be longer than {} characters",
            MAX_EMAIL_LENGTH
        ))
        .into());
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(MeshwellError::validation("Enter a valid email address").into()),
    }
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(MeshwellError::validation(format!(
            "{} cannot be longer than {} characters",
            field, MAX_NAME_LENGTH
        ))
        .into());
    }
    Ok(())
}

/// Check registration input, excluding uniqueness
pub fn validate_new_profile(input: &NewProfile) -> Result<()> {
    validate_username(&input.username)?;
    validate_email(&input.email)?;
    validate_name("First name", &input.first_name)?;
    validate_name("Last name", &input.last_name)?;
    if !input.tos {
        return Err(MeshwellError::validation("You must accept the Terms of Service").into());
    }
    Ok(())
}

pub fn validate_changes(changes: &ProfileChanges) -> Result<()> {
    if let Some(email) = &changes.email {
        validate_email(email)?;
    }
    if let Some(first_name) = &changes.first_name {
        validate_name("First name", first_name)?;
    }
    if let Some(last_name) = &changes.last_name {
        validate_name("Last name", last_name)?;
    }
    Ok(())
}
