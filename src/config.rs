//! Backend configuration
//!
//! One `BackendConfig` value selects everything that varies between
//! deployments of the mailbox aggregation service: the API base
//! address, the domain allow-list, the sub-list of domains served by
//! the managed backend, and the JSON field carrying the message array
//! in a managed list response.

use crate::address::BackendKind;
use crate::error::{Error, Result};
use std::env;

/// Production API base address.
pub const DEFAULT_API_URL: &str = "https://temp-mail.brosupdigital.com";

/// Fixed page size for relay list requests.
const DEFAULT_PAGE_LIMIT: u32 = 8;

/// Configuration for one mailbox backend deployment.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the aggregation service, without a trailing slash.
    pub api_base_url: String,
    /// Domains accepted as mailbox addresses. Addresses outside this
    /// set are rejected before any network call.
    pub allowed_domains: Vec<String>,
    /// Domains served by the managed backend. Must be a subset of
    /// `allowed_domains`; everything else routes to the relay.
    pub managed_domains: Vec<String>,
    /// Name of the field holding the message array in a managed list
    /// response (`"data"` or `"emails"` depending on the deployment).
    pub list_field: String,
    /// Relay list page size.
    pub page_limit: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            allowed_domains: [
                "nguyenmail.pro",
                "lurvon.com",
                "juboro.com",
                "brosup.dev",
                "sharklasers.com",
                "guerrillamail.info",
                "grr.la",
                "guerrillamail.biz",
                "guerrillamail.com",
                "guerrillamail.de",
                "guerrillamail.net",
                "guerrillamail.org",
                "guerrillamailblock.com",
                "pokemail.net",
                "spam4.me",
            ]
            .map(String::from)
            .to_vec(),
            managed_domains: ["nguyenmail.pro", "lurvon.com", "juboro.com", "brosup.dev"]
                .map(String::from)
                .to_vec(),
            list_field: "emails".to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl BackendConfig {
    /// Load backend configuration from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional
    /// and fall back to the production defaults:
    /// - `TEMPMAIL_API_URL`
    /// - `TEMPMAIL_ALLOWED_DOMAINS` (comma-separated)
    /// - `TEMPMAIL_MANAGED_DOMAINS` (comma-separated)
    /// - `TEMPMAIL_LIST_FIELD`
    /// - `TEMPMAIL_PAGE_LIMIT`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TEMPMAIL_PAGE_LIMIT` is not a
    /// number.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            api_base_url: env::var("TEMPMAIL_API_URL").unwrap_or(defaults.api_base_url),
            allowed_domains: env::var("TEMPMAIL_ALLOWED_DOMAINS")
                .map_or(defaults.allowed_domains, |raw| split_domains(&raw)),
            managed_domains: env::var("TEMPMAIL_MANAGED_DOMAINS")
                .map_or(defaults.managed_domains, |raw| split_domains(&raw)),
            list_field: env::var("TEMPMAIL_LIST_FIELD").unwrap_or(defaults.list_field),
            page_limit: env::var("TEMPMAIL_PAGE_LIMIT")
                .unwrap_or_else(|_| DEFAULT_PAGE_LIMIT.to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid TEMPMAIL_PAGE_LIMIT: {e}")))?,
        })
    }

    /// Whether `domain` belongs to the allow-list.
    #[must_use]
    pub fn is_allowed(&self, domain: &str) -> bool {
        self.allowed_domains.iter().any(|d| d == domain)
    }

    /// Which backend serves mailboxes on `domain`.
    ///
    /// Managed iff the domain is in the managed sub-list; every other
    /// allowed domain routes to the relay.
    #[must_use]
    pub fn classify(&self, domain: &str) -> BackendKind {
        if self.managed_domains.iter().any(|d| d == domain) {
            BackendKind::Managed
        } else {
            BackendKind::Relay
        }
    }
}

fn split_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
