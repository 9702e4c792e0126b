//! Structural predicates for decoded API payloads.
//!
//! Discord answers errors with a 2xx body now and then, and a few endpoints
//! return different objects depending on permissions. Every accessor checks
//! the decoded JSON against one of these predicates before deserializing, so
//! a payload of the wrong shape surfaces as a [`DiscordError`](super::DiscordError)
//! built from the body instead of a confusing serde error.

use serde_json::Value;

fn is_str(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_string)
}

fn is_opt_str(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .map_or(true, |v| v.is_string() || v.is_null())
}

fn is_opt_u64(value: &Value, key: &str) -> bool {
    value.get(key).map_or(true, |v| v.is_u64() || v.is_null())
}

fn is_array_of(value: &Value, key: &str, pred: fn(&Value) -> bool) -> bool {
    value
        .get(key)
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(pred))
}

pub fn is_user(value: &Value) -> bool {
    is_str(value, "id") && is_str(value, "username")
}

pub fn is_attachment(value: &Value) -> bool {
    is_str(value, "id")
        && is_str(value, "filename")
        && is_str(value, "url")
        && value.get("size").is_some_and(Value::is_u64)
        && is_opt_u64(value, "width")
        && is_opt_u64(value, "height")
}

pub fn is_message(value: &Value) -> bool {
    is_str(value, "id")
        && is_str(value, "channel_id")
        && value.get("author").is_some_and(is_user)
        && is_opt_str(value, "content")
        && value
            .get("attachments")
            .map_or(true, |_| is_array_of(value, "attachments", is_attachment))
}

pub fn is_message_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(is_message))
}

pub fn is_channel(value: &Value) -> bool {
    is_str(value, "id") && value.get("type").is_some_and(Value::is_u64) && is_opt_str(value, "guild_id")
}

pub fn is_channel_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(is_channel))
}

fn is_emoji(value: &Value) -> bool {
    value.is_object() && is_opt_str(value, "id") && is_opt_str(value, "name")
}

fn is_sticker(value: &Value) -> bool {
    is_str(value, "id") && is_str(value, "name")
}

pub fn is_guild(value: &Value) -> bool {
    is_str(value, "id")
        && is_str(value, "name")
        && is_str(value, "owner_id")
        && is_array_of(value, "emojis", is_emoji)
        && is_array_of(value, "stickers", is_sticker)
}

fn is_partial_guild(value: &Value) -> bool {
    is_str(value, "id") && is_str(value, "name")
}

pub fn is_partial_guild_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(is_partial_guild))
}

pub fn is_search_results(value: &Value) -> bool {
    value.get("total_results").is_some_and(Value::is_u64)
        && value
            .get("messages")
            .and_then(Value::as_array)
            .is_some_and(|groups| groups.iter().all(is_message_list))
}
