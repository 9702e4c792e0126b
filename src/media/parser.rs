//! Message classification into archive items.

use std::collections::HashSet;
use std::sync::OnceLock;

use mime_guess::mime;
use regex::Regex;

use crate::api::types::Message;
use crate::fs::naming::stored_filename;
use crate::media::item::{FileItem, FileKind, FileOrigin, TextItem};

/// Fallback name for links whose path has no final segment.
const DEFAULT_LINK_FILENAME: &str = "file";

/// Items produced by a single message.
#[derive(Debug, Clone)]
pub struct MessageItems {
    pub files: Vec<FileItem>,
    pub text: TextItem,
}

/// Split a message into its downloadable files and its text.
///
/// Every attachment becomes a file. A message whose entire content is one
/// URL additionally yields a link file. Every message yields a text item.
/// Stored names are `<message id>.<name>`; a name already taken within the
/// message gets the attachment id (or the link's position) inserted after
/// the message id.
pub fn extract_items(message: &Message) -> MessageItems {
    let mut taken = HashSet::new();
    let mut files = Vec::with_capacity(message.attachments.len() + 1);

    for attachment in &message.attachments {
        let stored_name = unique_stored_name(&mut taken, &message.id, &attachment.id, &attachment.filename);
        files.push(FileItem {
            message_id: message.id.clone(),
            url: attachment.url.clone(),
            filename: attachment.filename.clone(),
            stored_name,
            origin: FileOrigin::Attachment,
            kind: if attachment.is_media() {
                FileKind::Media
            } else {
                FileKind::NonMedia
            },
            size: Some(attachment.size),
            source: message.clone(),
        });
    }

    if let Some(url) = bare_url(&message.content) {
        let filename = filename_from_url(url).unwrap_or_else(|| DEFAULT_LINK_FILENAME.to_string());
        let kind = if is_media_filename(&filename) {
            FileKind::Media
        } else {
            FileKind::NonMedia
        };
        let stored_name = unique_stored_name(&mut taken, &message.id, &files.len().to_string(), &filename);

        files.push(FileItem {
            message_id: message.id.clone(),
            url: url.to_string(),
            filename,
            stored_name,
            origin: FileOrigin::Link,
            kind,
            size: None,
            source: message.clone(),
        });
    }

    MessageItems {
        files,
        text: TextItem::from(message),
    }
}

fn unique_stored_name(
    taken: &mut HashSet<String>,
    message_id: &str,
    discriminator: &str,
    filename: &str,
) -> String {
    let plain = stored_filename(message_id, filename);
    let name = if taken.contains(&plain) {
        stored_filename(&format!("{}.{}", message_id, discriminator), filename)
    } else {
        plain
    };
    taken.insert(name.clone());
    name
}

/// The content as a URL, if the content is nothing but one http(s) URL.
pub fn bare_url(content: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("bare URL pattern is valid")
    });

    let content = content.trim();
    pattern.is_match(content).then_some(content)
}

/// Last path segment of a URL, without query string or fragment.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(segment.to_string())
}

/// Extract the lowercase extension from a filename.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;

    // Validate it looks like an extension (1-10 chars, alphanumeric)
    if !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= 10
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

/// Whether a filename's extension is a known image, video or audio type.
pub fn is_media_filename(filename: &str) -> bool {
    let Some(ext) = extension(filename) else {
        return false;
    };

    mime_guess::from_ext(&ext).iter().any(|guess| {
        let top = guess.type_();
        top == mime::IMAGE || top == mime::VIDEO || top == mime::AUDIO
    })
}
