//! Archive item representation.

use std::fmt;

use serde::Serialize;

use crate::api::types::Message;

/// Which file bucket an item is archived into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Media,
    NonMedia,
}

impl FileKind {
    /// Get the folder name for this kind.
    pub fn folder_name(&self) -> &'static str {
        match self {
            FileKind::Media => "media",
            FileKind::NonMedia => "nonmedia",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Where a downloadable file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrigin {
    /// An uploaded attachment.
    Attachment,
    /// A message whose whole content is a single URL.
    Link,
}

/// Anything archived on behalf of a single message.
pub trait ArchiveItem {
    /// Id of the message this item was taken from.
    fn message_id(&self) -> &str;
}

/// A downloadable file.
#[derive(Debug, Clone)]
pub struct FileItem {
    /// Originating message id.
    pub message_id: String,

    /// Remote URL.
    pub url: String,

    /// Original filename, as uploaded or as found at the end of the URL.
    pub filename: String,

    /// Name under `files/`, unique within the originating message.
    pub stored_name: String,

    pub origin: FileOrigin,

    pub kind: FileKind,

    /// Size reported by the API, attachments only.
    pub size: Option<u64>,

    /// The message the file belongs to, kept for source side-cars.
    pub source: Message,
}

impl FileItem {
    /// Name the file is stored under.
    pub fn stored_filename(&self) -> &str {
        &self.stored_name
    }
}

impl ArchiveItem for FileItem {
    fn message_id(&self) -> &str {
        &self.message_id
    }
}

/// A message's text, as written into text manifests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    #[serde(rename = "msgid")]
    pub message_id: String,
    pub author: String,
    pub author_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ArchiveItem for TextItem {
    fn message_id(&self) -> &str {
        &self.message_id
    }
}

impl From<&Message> for TextItem {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id.clone(),
            author: message.author.display_name().to_string(),
            author_id: message.author.id.clone(),
            content: message.content.clone(),
            timestamp: message.timestamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::test_message;

    #[test]
    fn test_file_kind_round_trip_names() {
        assert_eq!(FileKind::Media.folder_name(), "media");
        assert_eq!(FileKind::NonMedia.to_string(), "nonmedia");
    }

    #[test]
    fn test_text_item_serializes_msgid() {
        let item = TextItem::from(&test_message("100", "hello", Vec::new()));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["msgid"], "100");
        assert_eq!(value["author"], "Alice");
        assert_eq!(value["content"], "hello");
    }
}
