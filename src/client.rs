//! Mailbox client
//!
//! `TempMailClient` speaks to the aggregation service over HTTP. A
//! managed mailbox is read directly by address; a relay mailbox needs
//! a session token which the client creates on demand and keeps in
//! its [`SessionStore`] (see the session module for the idle policy).

use crate::address::{BackendKind, MailboxAddress};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::message::{Inbox, Message};
use crate::session::{SWEEP_INTERVAL, SessionStore, SessionToken, SweeperGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Body of the create-session request. The locale and agent fields
/// are fixed metadata the relay expects on every create call.
#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    f: &'a str,
    email_user: &'a str,
    lang: &'a str,
    ip: &'a str,
    agent: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    body: String,
}

/// Client for a disposable-mailbox aggregation backend.
pub struct TempMailClient {
    config: BackendConfig,
    http: reqwest::Client,
    sessions: Arc<SessionStore>,
    /// Keeps the idle-sweep task alive for the client's lifetime.
    _sweeper: SweeperGuard,
}

impl TempMailClient {
    /// Create a client for the given backend.
    ///
    /// Spawns the session idle-sweep task, so this must be called
    /// from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a managed domain is missing from
    /// the allow-list, or [`Error::Http`] if the HTTP client cannot
    /// be built.
    pub fn new(config: BackendConfig) -> Result<Self> {
        if let Some(domain) = config
            .managed_domains
            .iter()
            .find(|d| !config.is_allowed(d))
        {
            return Err(Error::Config(format!(
                "managed domain {domain} is not in the allow-list"
            )));
        }

        let http = reqwest::Client::builder().build()?;
        let sessions = Arc::new(SessionStore::new());
        let sweeper = sessions.spawn_sweeper(SWEEP_INTERVAL);

        Ok(Self {
            config,
            http,
            sessions,
            _sweeper: sweeper,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Validate a raw address string against this client's allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] with the specific check that
    /// failed.
    pub fn parse_address(&self, raw: &str) -> Result<MailboxAddress> {
        Ok(MailboxAddress::parse(raw, &self.config)?)
    }

    /// Fetch the current message list for a mailbox.
    ///
    /// Routes to the managed or relay backend based on the address's
    /// domain and normalizes either response shape into one [`Inbox`].
    /// An absent or malformed list field yields an empty inbox, not an
    /// error.
    ///
    /// # Errors
    ///
    /// A 500-class response maps to [`Error::AddressNotFound`]; any
    /// other transport or service failure maps to [`Error::Fetch`].
    /// Relay session creation failures surface as
    /// [`Error::SessionCreation`]. No retry is attempted.
    pub async fn fetch_inbox(&self, address: &MailboxAddress) -> Result<Inbox> {
        let messages = match address.kind(&self.config) {
            BackendKind::Managed => self.fetch_managed(address).await?,
            BackendKind::Relay => self.fetch_relay(address).await?,
        };

        let inbox = Inbox::from_messages(messages);
        if inbox.is_empty() {
            info!("No emails found for {}", address);
        } else {
            info!(
                "Loaded {} emails ({} unread) for {}",
                inbox.len(),
                inbox.unread,
                address
            );
        }
        Ok(inbox)
    }

    /// Fill in a message's body if the list response omitted it.
    ///
    /// Relay list responses carry no bodies; opening such a message
    /// triggers a follow-up fetch by UID. The fetch is skipped when
    /// the body is already present, the address is managed (its list
    /// responses include full bodies), or the message has no UID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BodyFetch`] if the follow-up request fails,
    /// or [`Error::SessionCreation`] if no session could be made.
    pub async fn open_message(
        &self,
        address: &MailboxAddress,
        mut message: Message,
    ) -> Result<Message> {
        if message.body.is_some() || address.kind(&self.config) == BackendKind::Managed {
            return Ok(message);
        }
        let Some(uid) = message.uid.clone() else {
            warn!("Relay message without UID; body cannot be fetched");
            return Ok(message);
        };

        let token = self.ensure_session(address).await?;
        let url = format!("{}/read-guerrilla-email/{uid}", self.config.api_base_url);
        debug!("Fetching body for UID {} via {}", uid, url);

        let response = self
            .http
            .get(&url)
            .query(&[("session_id", token.as_str())])
            .send()
            .await
            .map_err(|e| Error::BodyFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::BodyFetch(format!("unexpected status {status}")));
        }

        let content: MessageContent = response
            .json()
            .await
            .map_err(|e| Error::BodyFetch(e.to_string()))?;
        message.body = Some(content.body);
        Ok(message)
    }

    // -- private helpers --

    async fn fetch_managed(&self, address: &MailboxAddress) -> Result<Vec<Message>> {
        let url = format!("{}/read-email", self.config.api_base_url);
        debug!("Fetching managed mailbox for {}", address);

        let response = self
            .http
            .get(&url)
            .query(&[("user", address.to_string())])
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let body = Self::check_list_status(response)?
            .json::<Value>()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        Ok(messages_from(&body, &self.config.list_field))
    }

    async fn fetch_relay(&self, address: &MailboxAddress) -> Result<Vec<Message>> {
        let token = self.ensure_session(address).await?;
        let url = format!("{}/get-guerrilla-emails", self.config.api_base_url);
        debug!("Fetching relay mailbox for {}", address);

        let limit = self.config.page_limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("session_id", token.as_str()),
                ("page", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let body = Self::check_list_status(response)?
            .json::<Value>()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        Ok(messages_from(&body, "emails"))
    }

    /// Resolve the relay session for `address`, reusing the stored
    /// token when it is still paired with this address.
    async fn ensure_session(&self, address: &MailboxAddress) -> Result<SessionToken> {
        self.sessions
            .resolve_with(&address.to_string(), || self.create_session(address))
            .await
    }

    async fn create_session(&self, address: &MailboxAddress) -> Result<SessionToken> {
        let url = format!("{}/create-guerrilla", self.config.api_base_url);
        let email_user = address.to_string();
        let request = CreateSessionRequest {
            f: "set_email_user",
            email_user: &email_user,
            lang: "en",
            ip: "127.0.0.1",
            agent: "Mozilla",
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::SessionCreation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SessionCreation(format!("unexpected status {status}")));
        }

        let created: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| Error::SessionCreation(e.to_string()))?;
        Ok(SessionToken::new(created.session_id))
    }

    fn check_list_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_server_error() {
            return Err(Error::AddressNotFound);
        }
        if !status.is_success() {
            return Err(Error::Fetch(format!("unexpected status {status}")));
        }
        Ok(response)
    }
}

/// Pull the message array out of a list response.
///
/// Entries that fail to parse are skipped; an absent or non-array
/// field yields an empty list.
fn messages_from(body: &Value, field: &str) -> Vec<Message> {
    body.get(field)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
