use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SlackConfig;
use crate::error::ApiError;
use crate::types::{RawChannel, User};

/// Page-size limit used by every list fetch.
pub const PAGE_LIMIT: u32 = 100;

/// One batch of a cursor-paginated list plus the continuation token.
/// `next_cursor` is `None` once the server signals the end (absent or empty
/// cursor in the response metadata).
#[derive(Debug, Clone, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Read-scope surface the fetch pipeline consumes.
pub trait SlackReadApi {
    fn list_channels(
        &mut self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<RawChannel>, ApiError>;

    fn list_users(&mut self, cursor: Option<&str>, limit: u32) -> Result<Page<User>, ApiError>;

    /// Emoji listing is a single unpaginated call. Alias entries carry an
    /// `alias:` prefixed value instead of a URL.
    fn emoji_list(&mut self) -> Result<BTreeMap<String, String>, ApiError>;

    fn channel_info(&mut self, channel_id: &str) -> Result<RawChannel, ApiError>;

    fn request_count(&self) -> usize;
}

/// Mutating surface used by the bulk engine. `archive_channel` and
/// `rename_channel` surface the platform's `ok` flag; a `false` return is
/// the caller's failure to record, not an `Err`.
pub trait SlackWriteApi: SlackReadApi {
    fn join_channel(&mut self, channel_id: &str) -> Result<(), ApiError>;

    fn archive_channel(&mut self, channel_id: &str) -> Result<bool, ApiError>;

    /// Requires the admin credential scope.
    fn rename_channel(&mut self, channel_id: &str, new_name: &str) -> Result<bool, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenScope {
    Bot,
    Admin,
}

/// Blocking HTTP client against the Slack Web API. Sequential calls only;
/// transient failures are not retried at this layer.
pub struct SlackHttpClient {
    client: Client,
    config: SlackConfig,
    request_count: usize,
}

impl SlackHttpClient {
    pub fn new(config: SlackConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build Slack HTTP client")?;
        Ok(Self {
            client,
            config,
            request_count: 0,
        })
    }

    fn token_for(&self, scope: TokenScope, method: &'static str) -> Result<&str, ApiError> {
        match scope {
            TokenScope::Bot => Ok(&self.config.bot_token),
            TokenScope::Admin => self
                .config
                .admin_token
                .as_deref()
                .ok_or(ApiError::MissingAdminToken { method }),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), method)
    }

    fn get_json(
        &mut self,
        method: &'static str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let token = self.token_for(TokenScope::Bot, method)?.to_string();
        self.request_count += 1;
        tracing::debug!(method, "Slack API GET");
        let response = self
            .client
            .get(self.endpoint(method))
            .bearer_auth(token)
            .header("User-Agent", self.config.user_agent.clone())
            .query(&params)
            .send()
            .map_err(|error| ApiError::Transport {
                method,
                detail: error.to_string(),
            })?;
        check_payload(method, response)
    }

    fn post_form(
        &mut self,
        method: &'static str,
        scope: TokenScope,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let token = self.token_for(scope, method)?.to_string();
        self.request_count += 1;
        tracing::debug!(method, admin = scope == TokenScope::Admin, "Slack API POST");
        let response = self
            .client
            .post(self.endpoint(method))
            .bearer_auth(token)
            .header("User-Agent", self.config.user_agent.clone())
            .form(&params)
            .send()
            .map_err(|error| ApiError::Transport {
                method,
                detail: error.to_string(),
            })?;
        check_payload(method, response)
    }
}

fn check_payload(
    method: &'static str,
    response: reqwest::blocking::Response,
) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Http {
            method,
            status: status.as_u16(),
        });
    }
    let payload: Value = response.json().map_err(|error| ApiError::Decode {
        method,
        detail: error.to_string(),
    })?;
    if !payload.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let code = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();
        return Err(ApiError::Slack { method, code });
    }
    Ok(payload)
}

fn decode<T: DeserializeOwned>(method: &'static str, payload: Value) -> Result<T, ApiError> {
    serde_json::from_value(payload).map_err(|error| ApiError::Decode {
        method,
        detail: error.to_string(),
    })
}

/// Empty cursors mean "no more pages"; normalize them away so callers only
/// deal with `Option`.
fn normalize_cursor(cursor: Option<String>) -> Option<String> {
    cursor.filter(|value| !value.is_empty())
}

impl SlackReadApi for SlackHttpClient {
    fn list_channels(
        &mut self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<RawChannel>, ApiError> {
        const METHOD: &str = "conversations.list";
        let mut params = vec![
            ("types", "public_channel".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let payload = self.get_json(METHOD, &params)?;
        let parsed: ChannelListResponse = decode(METHOD, payload)?;
        Ok(Page {
            items: parsed.channels,
            next_cursor: normalize_cursor(parsed.response_metadata.next_cursor),
        })
    }

    fn list_users(&mut self, cursor: Option<&str>, limit: u32) -> Result<Page<User>, ApiError> {
        const METHOD: &str = "users.list";
        let mut params = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let payload = self.get_json(METHOD, &params)?;
        let parsed: UserListResponse = decode(METHOD, payload)?;
        Ok(Page {
            items: parsed.members,
            next_cursor: normalize_cursor(parsed.response_metadata.next_cursor),
        })
    }

    fn emoji_list(&mut self) -> Result<BTreeMap<String, String>, ApiError> {
        const METHOD: &str = "emoji.list";
        let payload = self.get_json(METHOD, &[])?;
        let parsed: EmojiListResponse = decode(METHOD, payload)?;
        Ok(parsed.emoji)
    }

    fn channel_info(&mut self, channel_id: &str) -> Result<RawChannel, ApiError> {
        const METHOD: &str = "conversations.info";
        let params = vec![("channel", channel_id.to_string())];
        let payload = self.get_json(METHOD, &params)?;
        let parsed: ChannelInfoResponse = decode(METHOD, payload)?;
        Ok(parsed.channel)
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl SlackWriteApi for SlackHttpClient {
    fn join_channel(&mut self, channel_id: &str) -> Result<(), ApiError> {
        const METHOD: &str = "conversations.join";
        let params = vec![("channel", channel_id.to_string())];
        self.post_form(METHOD, TokenScope::Bot, &params)?;
        Ok(())
    }

    fn archive_channel(&mut self, channel_id: &str) -> Result<bool, ApiError> {
        const METHOD: &str = "conversations.archive";
        let params = vec![("channel", channel_id.to_string())];
        let payload = self.post_form(METHOD, TokenScope::Bot, &params)?;
        Ok(payload.get("ok").and_then(Value::as_bool).unwrap_or(false))
    }

    fn rename_channel(&mut self, channel_id: &str, new_name: &str) -> Result<bool, ApiError> {
        const METHOD: &str = "conversations.rename";
        let params = vec![
            ("channel", channel_id.to_string()),
            ("name", new_name.to_string()),
        ];
        let payload = self.post_form(METHOD, TokenScope::Admin, &params)?;
        Ok(payload.get("ok").and_then(Value::as_bool).unwrap_or(false))
    }
}

#[derive(Debug, Deserialize, Default)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ChannelListResponse {
    #[serde(default)]
    channels: Vec<RawChannel>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize, Default)]
struct UserListResponse {
    #[serde(default)]
    members: Vec<User>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize, Default)]
struct EmojiListResponse {
    #[serde(default)]
    emoji: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ChannelInfoResponse {
    channel: RawChannel,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn channel_list_response_decodes_items_and_cursor() {
        let payload = json!({
            "ok": true,
            "channels": [
                {"id": "C1", "name": "general", "created": 1600000000},
                {"id": "C2", "name": "random", "is_archived": true}
            ],
            "response_metadata": {"next_cursor": "dGVhbTpD"}
        });
        let parsed: ChannelListResponse = decode("conversations.list", payload).expect("decode");
        assert_eq!(parsed.channels.len(), 2);
        assert_eq!(parsed.channels[0].id, "C1");
        assert!(parsed.channels[1].is_archived);
        assert_eq!(parsed.response_metadata.next_cursor.as_deref(), Some("dGVhbTpD"));
    }

    #[test]
    fn missing_response_metadata_means_no_cursor() {
        let payload = json!({"ok": true, "members": [{"id": "U1", "name": "ada"}]});
        let parsed: UserListResponse = decode("users.list", payload).expect("decode");
        assert_eq!(parsed.members.len(), 1);
        assert_eq!(parsed.response_metadata.next_cursor, None);
    }

    #[test]
    fn normalize_cursor_drops_empty_tokens() {
        assert_eq!(normalize_cursor(Some(String::new())), None);
        assert_eq!(normalize_cursor(None), None);
        assert_eq!(normalize_cursor(Some("abc".to_string())).as_deref(), Some("abc"));
    }

    #[test]
    fn emoji_list_response_keeps_alias_values() {
        let payload = json!({
            "ok": true,
            "emoji": {
                "party": "https://emoji.example.com/party.gif",
                "celebrate": "alias:party"
            }
        });
        let parsed: EmojiListResponse = decode("emoji.list", payload).expect("decode");
        assert_eq!(parsed.emoji.get("celebrate").map(String::as_str), Some("alias:party"));
    }

    #[test]
    fn decode_failure_reports_the_method() {
        let payload = json!({"ok": true, "channel": "not-an-object"});
        let error = decode::<ChannelInfoResponse>("conversations.info", payload)
            .expect_err("must fail");
        assert!(error.to_string().contains("conversations.info"));
    }
}
