// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EasyshareError, Result};
use crate::types::{ANDROID_Q, DEFAULT_MIME_TYPE};

/// Settings for the downloads bridge. Every field has a default, so a
/// config file only needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Lowest SDK level that uses the managed Downloads index.
    pub managed_index_min_sdk: i32,
    /// MIME type recorded on managed index entries.
    pub mime_type: String,
    /// Read buffer used by the byte copy.
    pub copy_buffer_size: usize,
    /// Overrides the public Downloads directory (desktop only).
    pub downloads_dir: Option<PathBuf>,
    /// SQLite file standing in for the media index on desktop.
    pub media_index_path: Option<PathBuf>,
    /// Overrides the SDK level reported by the desktop stub.
    pub sdk_int: Option<i32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            managed_index_min_sdk: ANDROID_Q,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            copy_buffer_size: 8 * 1024,
            downloads_dir: None,
            media_index_path: None,
            sdk_int: None,
        }
    }
}

impl BridgeConfig {
    /// Load a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.copy_buffer_size == 0 {
            return Err(EasyshareError::InvalidArgument(
                "copy_buffer_size must be greater than zero".into(),
            ));
        }
        if self.mime_type.trim().is_empty() {
            return Err(EasyshareError::InvalidArgument(
                "mime_type must not be empty".into(),
            ));
        }
        Ok(())
    }
}
