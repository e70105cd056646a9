use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Editor engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Window in which checkpoint requests collapse into one capture
    #[serde(default = "default_checkpoint_debounce_ms")]
    pub checkpoint_debounce_ms: u64,

    /// Undo levels kept (0 = unlimited)
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,

    /// Offset applied to each successive pasted root
    #[serde(default = "default_paste_offset_px")]
    pub paste_offset_px: i64,

    /// Prefix of generated element ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Ask the notifier before deleting elements
    #[serde(default = "default_confirm_delete")]
    pub confirm_delete: bool,
}

fn default_checkpoint_debounce_ms() -> u64 {
    500
}

fn default_max_undo_levels() -> usize {
    100
}

fn default_paste_offset_px() -> i64 {
    20
}

fn default_id_prefix() -> String {
    "pc".to_string()
}

fn default_confirm_delete() -> bool {
    true
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = Self::path_in(dir);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded editor config");
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn path_in(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(DEFAULT_CONFIG_NAME)
    }

    pub fn checkpoint_debounce(&self) -> Duration {
        Duration::from_millis(self.checkpoint_debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            checkpoint_debounce_ms: default_checkpoint_debounce_ms(),
            max_undo_levels: default_max_undo_levels(),
            paste_offset_px: default_paste_offset_px(),
            id_prefix: default_id_prefix(),
            confirm_delete: default_confirm_delete(),
        }
    }
}
