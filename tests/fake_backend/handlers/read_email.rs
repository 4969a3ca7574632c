//! Managed list endpoint: `GET /read-email?user=<address>`.
//!
//! Responds with the message array under the state's configured
//! field name, so tests can exercise both the `data` and `emails`
//! deployment variants.

use crate::fake_backend::io::write_response;
use crate::fake_backend::state::BackendState;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

pub async fn handle_read_email<S: AsyncRead + AsyncWrite + Unpin>(
    state: &BackendState,
    stream: &mut BufReader<S>,
) {
    if state.list_status != 200 {
        let _ = write_response(stream, state.list_status, "{}").await;
        return;
    }

    let mut object = serde_json::Map::new();
    object.insert(
        state.list_field.clone(),
        Value::Array(state.messages.clone()),
    );
    let body = Value::Object(object).to_string();
    let _ = write_response(stream, 200, &body).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_backend::state::BackendStateBuilder;
    use serde_json::json;
    use tokio::io::BufReader;

    async fn run(state: &BackendState) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_read_email(state, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn serves_messages_under_configured_field() {
        let state = BackendStateBuilder::new()
            .list_field("data")
            .message(json!({ "subject": "Hello" }))
            .build();

        let output = run(&state).await;
        assert!(output.starts_with("HTTP/1.1 200 OK"));
        assert!(output.contains(r#""data":[{"subject":"Hello"}]"#));
    }

    #[tokio::test]
    async fn forced_status_overrides_list() {
        let state = BackendStateBuilder::new().list_status(500).build();

        let output = run(&state).await;
        assert!(output.starts_with("HTTP/1.1 500"));
    }
}
