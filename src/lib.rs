//! Disposable-mailbox client library
//!
//! An async client for a temp-mail aggregation service that fronts
//! two kinds of backends: a managed mail service addressed directly
//! by email address, and a third-party relay reached through a
//! session token created on the user's behalf.
//!
//! The crate validates addresses against a configurable domain
//! allow-list, routes each mailbox to the right backend, normalizes
//! the differing response shapes into one [`Message`] list, and
//! extracts 6/8-digit verification codes from subjects and bodies.

mod address;
mod client;
mod code;
mod config;
mod error;
mod message;
mod session;

pub use address::{BackendKind, MailboxAddress, ValidationError};
pub use client::TempMailClient;
pub use code::{extract_code, looks_like_html, strip_tags};
pub use config::BackendConfig;
pub use error::{Error, Result};
pub use message::{Inbox, Message};
pub use session::{IDLE_TIMEOUT, SWEEP_INTERVAL, SessionStore, SessionToken};
