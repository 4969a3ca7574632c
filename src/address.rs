//! Mailbox addresses and backend classification
//!
//! Provides a validated address type instead of raw strings. A
//! [`MailboxAddress`] can only be constructed by parsing a candidate
//! string against a [`BackendConfig`], so every address held by the
//! client is known to belong to an allowed domain.

use crate::config::BackendConfig;
use std::fmt;
use thiserror::Error;

/// Why a candidate address string was rejected.
///
/// Checks run in declaration order and stop at the first failure, so
/// a blank input reports [`ValidationError::EmptyInput`] rather than a
/// missing `@`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter an email address")]
    EmptyInput,

    #[error("email must contain @ symbol")]
    MissingAtSymbol,

    #[error("invalid email format")]
    MalformedAddress,

    #[error("username cannot be empty")]
    EmptyLocalPart,

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("domain is not allowed")]
    DomainNotAllowed,
}

/// Which backend serves a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// A mail service the aggregation backend fully controls,
    /// addressed directly by email address on every call.
    Managed,
    /// A third-party disposable-mailbox service accessed indirectly
    /// via a session token created on the user's behalf.
    Relay,
}

/// A validated mailbox address: `local_part@domain` with the domain
/// on the configured allow-list.
///
/// # Examples
///
/// ```
/// use tempmail_client::{BackendConfig, MailboxAddress};
///
/// let config = BackendConfig::default();
/// let address = MailboxAddress::parse("alice@grr.la", &config).unwrap();
/// assert_eq!(address.local_part(), "alice");
/// assert_eq!(address.domain(), "grr.la");
/// assert_eq!(address.to_string(), "alice@grr.la");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailboxAddress {
    local_part: String,
    domain: String,
}

impl MailboxAddress {
    /// Validate a candidate address string.
    ///
    /// Pure and side-effect free: suitable both for gating submission
    /// and for live input-error display, and calling it twice on the
    /// same input yields the same result.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ValidationError`] check: blank
    /// input, missing `@`, more than one `@`, blank local part or
    /// domain after trimming, or a domain outside the allow-list.
    pub fn parse(raw: &str, config: &BackendConfig) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        if !raw.contains('@') {
            return Err(ValidationError::MissingAtSymbol);
        }

        let parts: Vec<&str> = raw.split('@').collect();
        if parts.len() != 2 {
            return Err(ValidationError::MalformedAddress);
        }

        let local_part = parts[0].trim();
        let domain = parts[1].trim();
        if local_part.is_empty() {
            return Err(ValidationError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(ValidationError::EmptyDomain);
        }
        if !config.is_allowed(domain) {
            return Err(ValidationError::DomainNotAllowed);
        }

        Ok(Self {
            local_part: local_part.to_string(),
            domain: domain.to_string(),
        })
    }

    /// The part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Which backend serves this address under `config`.
    #[must_use]
    pub fn kind(&self, config: &BackendConfig) -> BackendKind {
        config.classify(&self.domain)
    }
}

impl fmt::Display for MailboxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}
