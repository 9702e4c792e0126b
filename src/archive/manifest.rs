//! Entry manifest records.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One downloaded file in a file manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Name under `files/`.
    pub filename: String,
    pub filename_original: String,
    pub url: String,
    pub msgid: String,
}

/// Persisted record of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryManifest<E> {
    pub entries: Vec<E>,
    /// Creation time, epoch milliseconds.
    pub date: i64,
    pub total: usize,
    /// First and last originating message id.
    pub spans: [String; 2],
}

impl<E> EntryManifest<E> {
    pub fn new(entries: Vec<E>, date: i64, span: (&str, &str)) -> Self {
        Self {
            total: entries.len(),
            entries,
            date,
            spans: [span.0.to_string(), span.1.to_string()],
        }
    }
}

impl<E: Serialize> EntryManifest<E> {
    /// Write the manifest as pretty JSON, replacing any file at `path`.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let manifest = EntryManifest::new(
            vec![FileEntry {
                filename: "100.cat.png".into(),
                filename_original: "cat.png".into(),
                url: "https://cdn/cat.png".into(),
                msgid: "100".into(),
            }],
            1700000000000,
            ("100", "90"),
        );

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["date"], 1700000000000i64);
        assert_eq!(value["spans"], serde_json::json!(["100", "90"]));
        assert_eq!(value["entries"][0]["filename_original"], "cat.png");
        assert_eq!(value["entries"][0]["msgid"], "100");
    }

    #[tokio::test]
    async fn test_write_to_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("100.json");

        let first: EntryManifest<FileEntry> = EntryManifest::new(Vec::new(), 1, ("1", "1"));
        first.write_to(&path).await.unwrap();
        let second: EntryManifest<FileEntry> = EntryManifest::new(Vec::new(), 2, ("1", "1"));
        second.write_to(&path).await.unwrap();

        let read: EntryManifest<FileEntry> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(read.date, 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("1.json");
        let manifest: EntryManifest<FileEntry> = EntryManifest::new(Vec::new(), 1, ("1", "1"));
        assert!(manifest.write_to(&path).await.is_err());
    }
}
