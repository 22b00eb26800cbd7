//! Telegram Bot API client.
//!
//! One chat is configured as the recipient; replies to other chats only
//! happen for the rejection notice. Long polls share the agent, so the
//! global timeout stays above the poll window.

use crate::error::NotifyError;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Outbound message delivery.
pub trait Notifier {
    fn send(&self, text: &str) -> Result<(), NotifyError>;
}

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramClient {
    agent: ureq::Agent,
    token: String,
    chat_id: i64,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, NotifyError> {
        if !self.ok {
            return Err(NotifyError::Api(
                self.description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        self.result
            .ok_or_else(|| NotifyError::Api("response without result".to_string()))
    }
}

impl TelegramClient {
    pub fn new(token: String, chat_id: i64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(90)))
            .build()
            .into();
        Self {
            agent,
            token,
            chat_id,
        }
    }

    /// The single allow-listed chat.
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.token)
    }

    pub fn send_to(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), NotifyError> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            payload["parse_mode"] = json!(mode);
        }
        let mut response = self
            .agent
            .post(&self.method_url("sendMessage"))
            .send_json(payload)?;
        let body: ApiResponse<serde_json::Value> = response
            .body_mut()
            .read_json()
            .map_err(|err| NotifyError::Api(err.to_string()))?;
        body.into_result().map(|_| ())
    }

    pub fn send_markdown(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.send_to(chat_id, text, Some("Markdown"))
    }

    /// Long-poll for updates past `offset`. Blocks up to `timeout_secs`.
    pub fn get_updates(&self, offset: i64, timeout_secs: u32) -> Result<Vec<Update>, NotifyError> {
        let mut response = self
            .agent
            .get(&self.method_url("getUpdates"))
            .query("offset", &offset.to_string())
            .query("timeout", &timeout_secs.to_string())
            .call()?;
        let body: ApiResponse<Vec<Update>> = response
            .body_mut()
            .read_json()
            .map_err(|err| NotifyError::Api(err.to_string()))?;
        body.into_result()
    }
}

impl Notifier for TelegramClient {
    fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.send_to(self.chat_id, text, None)
    }
}

/// Incoming update, trimmed to what the command loop reads.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_surface_the_description() {
        let raw = r#"{"ok": false, "description": "Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        match response.into_result() {
            Err(NotifyError::Api(description)) => assert_eq!(description, "Unauthorized"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn updates_parse_without_optional_fields() {
        let raw = r#"{"ok": true, "result": [
            {"update_id": 7, "message": {"chat": {"id": 42, "type": "private"}}},
            {"update_id": 8}
        ]}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = response.into_result().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
        assert!(updates[1].message.is_none());
    }
}
