//! Directory of segment clips keyed by index, plus the finished record.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{MonologueError, Result};
use crate::speech::AudioFormat;
use crate::types::Conversation;

const TRANSCRIPT_FILE: &str = "transcript.txt";
const RECORD_FILE: &str = "conversation.json";

/// Create-once, read-many storage for one conversation's clips.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
    format: AudioFormat,
}

/// Files written by [`AssetStore::write_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaths {
    pub transcript: PathBuf,
    pub record: PathBuf,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Store rooted at `<root>/<conversation id>`.
    pub fn for_conversation(root: &Path, id: Uuid, format: AudioFormat) -> Self {
        Self::new(root.join(id.to_string()), format)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Deterministic path for segment `index`.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("segment-{index}.{}", self.format.extension()))
    }

    pub fn contains(&self, index: usize) -> bool {
        self.path_for(index).is_file()
    }

    /// Durably write the clip for `index`; an existing clip is never replaced.
    pub async fn write(&self, index: usize, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MonologueError::local_io(&self.dir, e))?;

        let path = self.path_for(index);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| MonologueError::local_io(&path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| MonologueError::local_io(&path, e))?;
        file.sync_all()
            .await
            .map_err(|e| MonologueError::local_io(&path, e))?;

        Ok(path)
    }

    /// Write the transcript and the JSON record of a conversation.
    pub async fn write_record(&self, conversation: &Conversation) -> Result<RecordPaths> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MonologueError::local_io(&self.dir, e))?;

        let transcript = self.dir.join(TRANSCRIPT_FILE);
        tokio::fs::write(&transcript, conversation.transcript())
            .await
            .map_err(|e| MonologueError::local_io(&transcript, e))?;

        let record = self.dir.join(RECORD_FILE);
        let json = serde_json::to_vec_pretty(conversation)?;
        tokio::fs::write(&record, json)
            .await
            .map_err(|e| MonologueError::local_io(&record, e))?;

        Ok(RecordPaths { transcript, record })
    }

    /// Load a previously written conversation record.
    pub async fn read_record(&self) -> Result<Conversation> {
        let record = self.dir.join(RECORD_FILE);
        let bytes = tokio::fs::read(&record)
            .await
            .map_err(|e| MonologueError::local_io(&record, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
