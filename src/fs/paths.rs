//! Archive directory layout and destination checks.
//!
//! ```text
//! <root>/<guild>/<channel>/{media,nonmedia}/files/<msgId>.<name>
//! <root>/<guild>/<channel>/{media,nonmedia}/entries/<timestamp>/<firstMsgId>.json
//! <root>/<guild>/<channel>/{media,nonmedia}/sources/<msgId>.<name>.json
//! <root>/<guild>/<channel>/text/<firstMsgId>.json
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::naming::sanitize_path_component;
use crate::media::FileKind;

/// Guild folder used for channels outside any guild (DMs, group DMs).
pub const DM_GUILD_FOLDER: &str = "@me";

/// Paths for one channel's archive subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    channel_dir: PathBuf,
}

impl ChannelLayout {
    /// Layout for `channel_id` under `base`; `guild_id` of `None` means a DM.
    pub fn new(base: &Path, guild_id: Option<&str>, channel_id: &str) -> Result<Self> {
        let guild = sanitize_path_component(guild_id.unwrap_or(DM_GUILD_FOLDER))?;
        let channel = sanitize_path_component(channel_id)?;

        Ok(Self {
            channel_dir: base.join(guild).join(channel),
        })
    }

    /// `<root>/<guild>/<channel>`
    pub fn channel_dir(&self) -> &Path {
        &self.channel_dir
    }

    pub fn files_dir(&self, kind: FileKind) -> PathBuf {
        self.channel_dir.join(kind.folder_name()).join("files")
    }

    pub fn entries_dir(&self, kind: FileKind, timestamp: i64) -> PathBuf {
        self.channel_dir
            .join(kind.folder_name())
            .join("entries")
            .join(timestamp.to_string())
    }

    pub fn sources_dir(&self, kind: FileKind) -> PathBuf {
        self.channel_dir.join(kind.folder_name()).join("sources")
    }

    pub fn text_dir(&self) -> PathBuf {
        self.channel_dir.join("text")
    }
}

/// Check that the archive root exists, is a directory and can be written to.
pub fn validate_destination(path: &Path) -> Result<()> {
    let invalid = |reason: &str| Error::Destination {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            invalid("directory does not exist")
        } else {
            invalid(&e.to_string())
        }
    })?;

    if !metadata.is_dir() {
        return Err(invalid("not a directory"));
    }

    let marker = path.join(format!(".write-test-{}", uuid::Uuid::new_v4()));
    std::fs::write(&marker, b"")
        .map_err(|e| invalid(&format!("directory is not writable ({})", e)))?;
    let _ = std::fs::remove_file(&marker);

    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout() {
        let layout = ChannelLayout::new(Path::new("/archive"), Some("1"), "2").unwrap();
        assert_eq!(layout.channel_dir(), Path::new("/archive/1/2"));
        assert_eq!(
            layout.files_dir(FileKind::Media),
            PathBuf::from("/archive/1/2/media/files")
        );
        assert_eq!(
            layout.entries_dir(FileKind::NonMedia, 1700000000000),
            PathBuf::from("/archive/1/2/nonmedia/entries/1700000000000")
        );
        assert_eq!(layout.text_dir(), PathBuf::from("/archive/1/2/text"));
    }

    #[test]
    fn test_dm_layout() {
        let layout = ChannelLayout::new(Path::new("/archive"), None, "9").unwrap();
        assert_eq!(layout.channel_dir(), Path::new("/archive/@me/9"));
    }

    #[test]
    fn test_layout_rejects_traversal() {
        assert!(ChannelLayout::new(Path::new("/archive"), Some(".."), "9").is_err());
    }

    #[test]
    fn test_validate_destination() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_destination(dir.path()).is_ok());
        // The marker file is cleaned up.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let missing = dir.path().join("missing");
        assert!(matches!(
            validate_destination(&missing),
            Err(Error::Destination { .. })
        ));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            validate_destination(&file),
            Err(Error::Destination { .. })
        ));
    }
}
