//! API resource and error type definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel type ids that carry a message history.
pub const TEXT_CHANNEL_TYPES: [u8; 7] = [0, 1, 3, 5, 10, 11, 12];

/// A message as returned by `/channels/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub author: Author,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub edited_timestamp: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Message author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl Author {
    /// Name shown in the client: the global display name if set.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

/// Message attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Attachment {
    /// Images and videos carry both dimensions; everything else carries none.
    pub fn is_media(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

/// Channel information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_message_id: Option<String>,
}

impl Channel {
    /// Whether this channel type has a readable message history.
    pub fn is_text_based(&self) -> bool {
        TEXT_CHANNEL_TYPES.contains(&self.kind)
    }

    /// Human readable label for logs.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("#{} ({})", name, self.id),
            None => self.id.clone(),
        }
    }
}

/// Full guild object from `/guilds/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
}

/// Custom guild emoji.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

/// Custom guild sticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sticker {
    pub id: String,
    pub name: String,
}

/// Guild summary from `/users/@me/guilds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialGuild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: bool,
}

/// The authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// Search response; each hit is the matched message plus its context.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub total_results: u64,
    #[serde(default)]
    pub messages: Vec<Vec<Message>>,
}

/// Structured Discord error body: `{"code": 50001, "message": "...", "errors": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscordError {
    pub status: u16,
    pub code: i64,
    pub message: String,
    /// Field errors flattened to `path.to.field -> [messages]`.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl DiscordError {
    /// Build from an already-parsed JSON body.
    pub fn from_json(status: u16, body: &Value) -> Self {
        let code = body.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unexpected response: {}", truncate(&body.to_string())));

        let mut errors = BTreeMap::new();
        if let Some(tree) = body.get("errors") {
            flatten_errors(tree, String::new(), &mut errors);
        }

        Self {
            status,
            code,
            message,
            errors,
        }
    }

    /// Build from a text body, which may itself be JSON.
    pub fn from_text(status: u16, text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) if value.is_object() => Self::from_json(status, &value),
            _ => Self {
                status,
                code: 0,
                message: if text.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    truncate(text)
                },
                errors: BTreeMap::new(),
            },
        }
    }
}

impl fmt::Display for DiscordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {}, HTTP {})", self.message, self.code, self.status)?;
        for (field, messages) in &self.errors {
            write!(f, "; {}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for DiscordError {}

/// Walk Discord's nested error tree; leaves are `{"_errors": [{"code", "message"}]}`.
fn flatten_errors(node: &Value, path: String, out: &mut BTreeMap<String, Vec<String>>) {
    let Some(object) = node.as_object() else {
        return;
    };

    for (key, child) in object {
        if key == "_errors" {
            let messages = child
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let field = if path.is_empty() { "_root".to_string() } else { path.clone() };
            out.entry(field).or_default().extend(messages);
        } else {
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            flatten_errors(child, child_path, out);
        }
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(500).collect()
}

#[cfg(test)]
pub(crate) fn test_message(id: &str, content: &str, attachments: Vec<Attachment>) -> Message {
    Message {
        id: id.to_string(),
        channel_id: "42".to_string(),
        author: Author {
            id: "7".to_string(),
            username: "alice".to_string(),
            global_name: Some("Alice".to_string()),
        },
        content: content.to_string(),
        timestamp: Some("2024-01-01T00:00:00+00:00".to_string()),
        edited_timestamp: None,
        attachments,
    }
}

#[cfg(test)]
pub(crate) fn test_attachment(id: &str, filename: &str, url: &str, dims: Option<(u32, u32)>) -> Attachment {
    Attachment {
        id: id.to_string(),
        filename: filename.to_string(),
        size: 3,
        url: url.to_string(),
        proxy_url: None,
        content_type: None,
        width: dims.map(|d| d.0),
        height: dims.map(|d| d.1),
    }
}
