//! Discord REST API client.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::auth::authorization_value;
use crate::api::query::{build_query, MessagesQuery, SearchQuery};
use crate::api::queue::RequestQueue;
use crate::api::shape;
use crate::api::types::*;
use crate::error::{Error, Result};

/// Discord API base URL.
pub const API_BASE: &str = "https://discord.com/api/v9";

/// Maximum messages per history request.
pub const MESSAGES_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("discord-archiver/", env!("CARGO_PKG_VERSION"));

/// Response body decoded according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl ResponseBody {
    fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        let content_type = content_type.unwrap_or("").to_ascii_lowercase();

        if content_type.contains("json") {
            match serde_json::from_slice(bytes) {
                Ok(value) => ResponseBody::Json(value),
                Err(_) => ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
            }
        } else if content_type.starts_with("text/plain") {
            ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned())
        } else {
            ResponseBody::Bytes(bytes.to_vec())
        }
    }

    fn into_error(self, status: StatusCode) -> DiscordError {
        match self {
            ResponseBody::Json(value) => DiscordError::from_json(status.as_u16(), &value),
            ResponseBody::Text(text) => DiscordError::from_text(status.as_u16(), &text),
            ResponseBody::Bytes(bytes) => {
                DiscordError::from_text(status.as_u16(), &String::from_utf8_lossy(&bytes))
            }
        }
    }
}

/// Discord API client. Every request goes through the shared [`RequestQueue`].
#[derive(Clone)]
pub struct DiscordApi {
    client: Client,
    queue: RequestQueue,
    base_url: String,
    authorization: HeaderValue,
}

impl DiscordApi {
    /// Create a client for `token`, sending requests through `queue`.
    pub fn new(token: &str, bot: bool, queue: RequestQueue) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            queue,
            base_url: API_BASE.to_string(),
            authorization: authorization_value(token, bot)?,
        })
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The underlying HTTP client, shared with file downloads.
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// The request queue this client submits to.
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Issue a queued GET request and decode the body.
    ///
    /// The stored authorization header is added unless `headers` already
    /// carries one.
    pub async fn get_raw(
        &self,
        path: &str,
        query: &[(String, String)],
        mut headers: HeaderMap,
    ) -> Result<(StatusCode, ResponseBody)> {
        let url = format!("{}{}", self.base_url, path);

        if !headers.contains_key(header::AUTHORIZATION) {
            headers.insert(header::AUTHORIZATION, self.authorization.clone());
        }

        let request = self
            .client
            .get(&url)
            .query(query)
            .headers(headers)
            .build()?;

        tracing::debug!("GET {}", request.url());

        let client = self.client.clone();
        let (status, content_type, bytes) = self
            .queue
            .enqueue(move || async move {
                let response = client.execute(request).await?;
                let status = response.status();
                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = response.bytes().await?;
                Ok::<_, reqwest::Error>((status, content_type, bytes))
            })
            .await??;

        tracing::debug!("Response status: {} ({} bytes)", status, bytes.len());

        Ok((status, ResponseBody::decode(content_type.as_deref(), &bytes)))
    }

    /// GET a JSON resource, check its shape and deserialize it.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
        is_valid: fn(&Value) -> bool,
    ) -> Result<T> {
        let (status, body) = self.get_raw(path, query, HeaderMap::new()).await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(retry_after_secs(&body)));
        }

        if !status.is_success() {
            return Err(body.into_error(status).into());
        }

        match body {
            ResponseBody::Json(value) if is_valid(&value) => Ok(serde_json::from_value(value)?),
            other => {
                tracing::debug!("Unexpected payload shape for {}", path);
                Err(other.into_error(status).into())
            }
        }
    }

    /// Get the authenticated user (validates the token).
    pub async fn get_current_user(&self) -> Result<User> {
        self.get_json("/users/@me", &[], shape::is_user).await
    }

    /// Get the guilds the authenticated user is a member of.
    pub async fn get_current_user_guilds(&self) -> Result<Vec<PartialGuild>> {
        self.get_json("/users/@me/guilds", &[], shape::is_partial_guild_list)
            .await
    }

    /// Get a guild by ID.
    pub async fn get_guild(&self, guild_id: &str) -> Result<Guild> {
        let path = format!("/guilds/{}", guild_id);
        self.get_json(&path, &[], shape::is_guild).await
    }

    /// Get all channels of a guild.
    pub async fn get_guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>> {
        let path = format!("/guilds/{}/channels", guild_id);
        self.get_json(&path, &[], shape::is_channel_list).await
    }

    /// Get a channel by ID.
    pub async fn get_channel(&self, channel_id: &str) -> Result<Channel> {
        let path = format!("/channels/{}", channel_id);
        self.get_json(&path, &[], shape::is_channel).await
    }

    /// Get a page of messages, newest first.
    pub async fn get_channel_messages(
        &self,
        channel_id: &str,
        query: &MessagesQuery,
    ) -> Result<Vec<Message>> {
        let path = format!("/channels/{}/messages", channel_id);
        let query = build_query(query)?;
        self.get_json(&path, &query, shape::is_message_list).await
    }

    /// Search a channel's messages.
    pub async fn search_channel_messages(
        &self,
        channel_id: &str,
        query: &SearchQuery,
    ) -> Result<SearchResults> {
        let path = format!("/channels/{}/messages/search", channel_id);
        let query = build_query(query)?;
        self.get_json(&path, &query, shape::is_search_results).await
    }
}

/// Seconds to wait according to a 429 body, rounded up.
fn retry_after_secs(body: &ResponseBody) -> u64 {
    match body {
        ResponseBody::Json(value) => value
            .get("retry_after")
            .and_then(Value::as_f64)
            .map(|secs| secs.max(0.0).ceil() as u64)
            .unwrap_or(1),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_for(server: &MockServer) -> DiscordApi {
        DiscordApi::new("user-token", false, RequestQueue::new(Duration::from_millis(1)))
            .unwrap()
            .with_base_url(server.uri())
    }

    fn message(id: &str) -> Value {
        json!({
            "id": id,
            "channel_id": "42",
            "author": {"id": "7", "username": "alice"},
            "content": "hi",
            "attachments": []
        })
    }

    #[tokio::test]
    async fn test_get_channel_sends_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .and(header_eq("authorization", "user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42", "type": 0, "guild_id": "1", "name": "general"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = api_for(&server).await.get_channel("42").await.unwrap();
        assert_eq!(channel.id, "42");
        assert_eq!(channel.guild_id.as_deref(), Some("1"));
        assert!(channel.is_text_based());
    }

    #[tokio::test]
    async fn test_caller_authorization_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .and(header_eq("authorization", "Bot other"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "username": "bot"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bot other"));
        let (status, body) = api_for(&server)
            .await
            .get_raw("/users/@me", &[], headers)
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(matches!(body, ResponseBody::Json(_)));
    }

    #[tokio::test]
    async fn test_messages_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42/messages"))
            .and(query_param("limit", "100"))
            .and(query_param("before", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([message("499"), message("498")])))
            .expect(1)
            .mount(&server)
            .await;

        let query = MessagesQuery {
            limit: Some(100),
            before: Some("500".into()),
            after: None,
        };
        let messages = api_for(&server)
            .await
            .get_channel_messages("42", &query)
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "499");
    }

    #[tokio::test]
    async fn test_search_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42/messages/search"))
            .and(query_param("content", "cat"))
            .and(query_param("has", "image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 1,
                "messages": [[message("300")]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery {
            content: Some("cat".into()),
            has: vec!["image".into()],
            ..Default::default()
        };
        let results = api_for(&server)
            .await
            .search_channel_messages("42", &query)
            .await
            .unwrap();
        assert_eq!(results.total_results, 1);
        assert_eq!(results.messages[0][0].id, "300");
    }

    #[tokio::test]
    async fn test_error_status_maps_to_discord_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": 50001, "message": "Missing Access"
            })))
            .mount(&server)
            .await;

        match api_for(&server).await.get_guild("1").await {
            Err(Error::Discord(err)) => {
                assert_eq!(err.status, 403);
                assert_eq!(err.code, 50001);
                assert_eq!(err.message, "Missing Access");
            }
            other => panic!("unexpected result: {:?}", other.map(|g| g.id)),
        }
    }

    #[tokio::test]
    async fn test_shape_mismatch_on_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 10004,
                "message": "Unknown Guild",
                "errors": {"guild_id": {"_errors": [{"code": "X", "message": "Not snowflake"}]}}
            })))
            .mount(&server)
            .await;

        match api_for(&server).await.get_guild("1").await {
            Err(Error::Discord(err)) => {
                assert_eq!(err.status, 200);
                assert_eq!(err.code, 10004);
                assert_eq!(err.errors["guild_id"], vec!["Not snowflake"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|g| g.id)),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        match api_for(&server).await.get_channel("42").await {
            Err(Error::Discord(err)) => {
                assert_eq!(err.code, 0);
                assert_eq!(err.message, "upstream unavailable");
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.id)),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/42"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "message": "You are being rate limited.", "retry_after": 1.5, "global": false
            })))
            .mount(&server)
            .await;

        let result = api_for(&server).await.get_channel("42").await;
        assert!(matches!(result, Err(Error::RateLimited(2))));
    }

    #[test]
    fn test_body_decoding_by_content_type() {
        assert_eq!(
            ResponseBody::decode(Some("application/json; charset=utf-8"), b"{\"a\":1}"),
            ResponseBody::Json(json!({"a": 1}))
        );
        assert_eq!(
            ResponseBody::decode(Some("text/plain"), b"hello"),
            ResponseBody::Text("hello".into())
        );
        assert_eq!(
            ResponseBody::decode(Some("image/png"), &[1, 2, 3]),
            ResponseBody::Bytes(vec![1, 2, 3])
        );
        assert_eq!(
            ResponseBody::decode(None, b"raw"),
            ResponseBody::Bytes(b"raw".to_vec())
        );
    }
}
