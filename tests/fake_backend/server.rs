//! In-process fake backend server for integration testing
//!
//! Listens on an OS-assigned localhost port and speaks just enough
//! HTTP/1.1 for `reqwest`: one request per connection, read the
//! request line and headers, read a `Content-Length` body if one is
//! declared, dispatch on method and path, respond, close.
//!
//! Request counters let tests assert on interaction patterns (e.g.
//! that a second fetch reused the relay session instead of creating
//! a new one).

use super::handlers::{
    handle_create_session, handle_read_email, handle_relay_body, handle_relay_list,
};
use super::io::write_response;
use super::state::BackendState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpListener;

/// Counts of requests seen per endpoint, shared with the tests.
#[derive(Debug, Default)]
pub struct Counters {
    pub create_sessions: AtomicUsize,
    pub list_requests: AtomicUsize,
    pub body_requests: AtomicUsize,
    /// `email_user` values seen by session creation, in order.
    pub created_for: Mutex<Vec<String>>,
}

/// A fake backend server on localhost with an OS-assigned port.
///
/// The server runs until the `FakeBackend` is dropped.
pub struct FakeBackend {
    port: u16,
    counters: Arc<Counters>,
    /// Handle to the background task so it lives as long as the server.
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Start a new fake backend with the given state.
    pub async fn start(state: BackendState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let state = Arc::new(Mutex::new(state));
        let counters = Arc::new(Counters::default());
        let task_counters = Arc::clone(&counters);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&state);
                let counters = Arc::clone(&task_counters);
                tokio::spawn(async move {
                    handle_connection(stream, &state, &counters).await;
                });
            }
        });

        Self {
            port,
            counters,
            _handle: handle,
        }
    }

    /// The port the server is listening on.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Base URL clients should be configured with.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn create_session_calls(&self) -> usize {
        self.counters.create_sessions.load(Ordering::SeqCst)
    }

    pub fn body_request_calls(&self) -> usize {
        self.counters.body_requests.load(Ordering::SeqCst)
    }

    /// Addresses session creation was requested for, in order.
    pub fn created_for(&self) -> Vec<String> {
        self.counters.created_for.lock().unwrap().clone()
    }
}

/// Handle a single HTTP connection: parse the request, dispatch to
/// the endpoint handler, respond, and close.
async fn handle_connection(
    stream: tokio::net::TcpStream,
    state: &Mutex<BackendState>,
    counters: &Counters,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    match reader.read_line(&mut request_line).await {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return;
    };
    let method = method.to_string();
    let target = target.to_string();

    // Headers: we only care about Content-Length.
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).await.is_err() {
        return;
    }
    let body = String::from_utf8_lossy(&body).into_owned();

    let (path, query) = target
        .split_once('?')
        .unwrap_or((target.as_str(), ""));

    // Take a snapshot for the handlers.
    let snap = state.lock().unwrap().clone();
    let session_id = query_param(query, "session_id");

    match (method.as_str(), path) {
        ("GET", "/read-email") => {
            counters.list_requests.fetch_add(1, Ordering::SeqCst);
            handle_read_email(&snap, &mut reader).await;
        }
        ("POST", "/create-guerrilla") => {
            counters.create_sessions.fetch_add(1, Ordering::SeqCst);
            if let Some(email_user) = handle_create_session(&snap, &body, &mut reader).await {
                counters.created_for.lock().unwrap().push(email_user);
            }
        }
        ("GET", "/get-guerrilla-emails") => {
            counters.list_requests.fetch_add(1, Ordering::SeqCst);
            handle_relay_list(&snap, session_id.as_deref(), &mut reader).await;
        }
        ("GET", path) if path.starts_with("/read-guerrilla-email/") => {
            counters.body_requests.fetch_add(1, Ordering::SeqCst);
            let uid = path.trim_start_matches("/read-guerrilla-email/");
            handle_relay_body(&snap, uid, session_id.as_deref(), &mut reader).await;
        }
        _ => {
            let _ = write_response(&mut reader, 404, "{}").await;
        }
    }
}

/// Pull one value out of a query string. Values are returned as sent;
/// the tokens and numbers the tests use need no percent-decoding.
fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == key).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_finds_value() {
        assert_eq!(
            query_param("session_id=abc&page=1", "session_id").as_deref(),
            Some("abc")
        );
        assert_eq!(query_param("session_id=abc&page=1", "page").as_deref(), Some("1"));
    }

    #[test]
    fn query_param_missing_key_is_none() {
        assert_eq!(query_param("page=1", "session_id"), None);
        assert_eq!(query_param("", "session_id"), None);
    }
}
