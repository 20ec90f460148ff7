//! Naming scheme for derived identifiers.
//!
//! Partition and admin identifiers are plain prefixes of the organization
//! name. The name is embedded verbatim into a table identifier, so it is
//! restricted to `[A-Za-z0-9_-]` and short enough that `org_<name>` fits the
//! 63-byte identifier limit of Postgres.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub const PARTITION_PREFIX: &str = "org_";
pub const ADMIN_ID_PREFIX: &str = "admin_";

/// Longest organization name whose partition identifier stays within 63 bytes.
pub const MAX_ORGANIZATION_NAME_LEN: usize = 63 - PARTITION_PREFIX.len();

static ORGANIZATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("organization name pattern"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern"));

/// Reasons an organization name cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("organization name cannot be empty")]
    Empty,
    #[error("organization name cannot exceed {max} characters, got {len}")]
    TooLong { len: usize, max: usize },
    #[error("organization name can only contain letters, digits, '_' and '-'")]
    InvalidCharacters,
}

/// Name of the tenant partition owned by `organization_name`.
pub fn partition_name(organization_name: &str) -> String {
    format!("{PARTITION_PREFIX}{organization_name}")
}

/// Denormalized admin identifier for `organization_name`.
pub fn admin_id(organization_name: &str) -> String {
    format!("{ADMIN_ID_PREFIX}{organization_name}")
}

/// Case-folded key used for catalog uniqueness.
///
/// Identifier lookups are case-insensitive in SQLite and for unquoted
/// Postgres identifiers, so `TechCorp` and `techcorp` must not both exist.
pub fn name_key(organization_name: &str) -> String {
    organization_name.to_ascii_lowercase()
}

pub fn validate_organization_name(organization_name: &str) -> Result<(), NamingError> {
    if organization_name.is_empty() {
        return Err(NamingError::Empty);
    }

    if organization_name.len() > MAX_ORGANIZATION_NAME_LEN {
        return Err(NamingError::TooLong {
            len: organization_name.len(),
            max: MAX_ORGANIZATION_NAME_LEN,
        });
    }

    if !ORGANIZATION_NAME.is_match(organization_name) {
        return Err(NamingError::InvalidCharacters);
    }

    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}
