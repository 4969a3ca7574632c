//! Error types for tempmail-client

use crate::address::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] ValidationError),

    #[error("session creation failed: {0}")]
    SessionCreation(String),

    #[error("email address not found or invalid")]
    AddressNotFound,

    #[error("failed to fetch emails: {0}")]
    Fetch(String),

    #[error("failed to fetch message body: {0}")]
    BodyFetch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
