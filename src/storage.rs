use crate::models::ChatMessage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const TRANSCRIPT_FILE: &str = "transcript.yaml";
const PREFS_FILE: &str = "prefs.yaml";

/// User preferences that survive restarts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    /// Clear the chat without asking first
    #[serde(default)]
    pub skip_clear_confirm: bool,
}

/// Manages the chat transcript and preference files
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: PathBuf) -> Self {
        Storage { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure config directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("creating {}", self.dir.display()))?;
        }
        Ok(())
    }

    /// Load the saved transcript. A missing file is an empty transcript.
    pub fn load_transcript(&self) -> Result<Vec<ChatMessage>> {
        let path = self.dir.join(TRANSCRIPT_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        let messages = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(messages)
    }

    /// Save the transcript, leaving out in-flight placeholders
    pub fn save_transcript(&self, messages: &[ChatMessage]) -> Result<()> {
        self.ensure_dir()?;
        let settled: Vec<&ChatMessage> = messages.iter().filter(|m| !m.is_loading).collect();
        let content = serde_yaml::to_string(&settled)?;
        fs::write(self.dir.join(TRANSCRIPT_FILE), content)?;
        Ok(())
    }

    /// Delete the saved transcript, if any
    pub fn clear_transcript(&self) -> Result<()> {
        let path = self.dir.join(TRANSCRIPT_FILE);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Load preferences, falling back to defaults when absent
    pub fn load_prefs(&self) -> Result<Prefs> {
        let path = self.dir.join(PREFS_FILE);
        if !path.exists() {
            return Ok(Prefs::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save_prefs(&self, prefs: &Prefs) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_yaml::to_string(prefs)?;
        fs::write(self.dir.join(PREFS_FILE), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_transcript_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nested"));

        let mut reply = ChatMessage::assistant_placeholder();
        reply.is_loading = false;
        reply.content = "## Create\nPOST https://api.x.com".into();
        reply.is_error = true;
        let pending = ChatMessage::assistant_placeholder();
        let question = ChatMessage::user("how do I create a widget?");

        storage
            .save_transcript(&[question.clone(), reply.clone(), pending])
            .unwrap();
        let loaded = storage.load_transcript().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, question.id);
        assert_eq!(loaded[0].role, Role::User);
        assert_eq!(loaded[1].content, reply.content);
        assert!(loaded[1].is_error);
        assert!(!loaded[1].is_loading);
    }

    #[test]
    fn test_clear_removes_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.save_transcript(&[ChatMessage::user("hi")]).unwrap();
        storage.clear_transcript().unwrap();
        assert!(storage.load_transcript().unwrap().is_empty());
        storage.clear_transcript().unwrap();
    }

    #[test]
    fn test_prefs_default_and_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert_eq!(storage.load_prefs().unwrap(), Prefs::default());

        storage
            .save_prefs(&Prefs {
                skip_clear_confirm: true,
            })
            .unwrap();
        assert!(storage.load_prefs().unwrap().skip_clear_confirm);
    }

    #[test]
    fn test_corrupt_transcript_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TRANSCRIPT_FILE), "- not: [a message").unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert!(storage.load_transcript().is_err());
    }
}
