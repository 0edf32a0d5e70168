// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where Android APIs are unavailable.
//
// The SDK level is configurable so both strategies can be driven from a
// desktop: the managed index is a SQLite file, the public directory is the
// user's Downloads folder.

use std::path::PathBuf;

use easyshare_core::BridgeConfig;
use easyshare_core::error::{EasyshareError, Result};
use easyshare_storage::{ManagedIndexBackend, SqliteMediaIndex, StorageBackend};

use crate::traits::*;

/// Environment variable consulted for the reported SDK level.
pub const SDK_INT_ENV: &str = "EASYSHARE_SDK_INT";

/// Desktop stand-in for the Android platform.
pub struct DesktopPlatform {
    sdk_int: i32,
    downloads_dir: Option<PathBuf>,
}

impl DesktopPlatform {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            sdk_int: resolve_sdk_int(config.sdk_int, std::env::var(SDK_INT_ENV).ok()),
            downloads_dir: resolve_downloads_dir(
                config.downloads_dir.clone(),
                std::env::var("XDG_DOWNLOAD_DIR").ok(),
                std::env::var("HOME").ok(),
            ),
        }
    }
}

impl NativePlatform for DesktopPlatform {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeVersion for DesktopPlatform {
    fn sdk_int(&self) -> Result<i32> {
        Ok(self.sdk_int)
    }
}

impl NativeDownloads for DesktopPlatform {
    fn managed_index_backend(&self, config: &BridgeConfig) -> Result<Box<dyn StorageBackend>> {
        let Some(path) = config.media_index_path.as_deref() else {
            tracing::warn!("managed index requested but no media_index_path is configured");
            return Err(EasyshareError::PlatformUnavailable);
        };
        let index = SqliteMediaIndex::open(path)?;
        Ok(Box::new(ManagedIndexBackend::new(
            index,
            config.mime_type.clone(),
            config.copy_buffer_size,
        )))
    }

    fn public_downloads_dir(&self) -> Result<PathBuf> {
        self.downloads_dir.clone().ok_or_else(|| {
            tracing::warn!("no Downloads directory could be determined");
            EasyshareError::PlatformUnavailable
        })
    }
}

/// Config override, then the environment, else 0 (legacy strategy).
fn resolve_sdk_int(config: Option<i32>, env: Option<String>) -> i32 {
    config
        .or_else(|| env.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(0)
}

/// Config override, then `XDG_DOWNLOAD_DIR`, then `$HOME/Downloads`.
fn resolve_downloads_dir(
    config: Option<PathBuf>,
    xdg: Option<String>,
    home: Option<String>,
) -> Option<PathBuf> {
    if config.is_some() {
        return config;
    }
    if let Some(xdg) = xdg.filter(|s| !s.is_empty()) {
        return Some(PathBuf::from(xdg));
    }
    home.filter(|s| !s.is_empty())
        .map(|home| PathBuf::from(home).join("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{DownloadsChannel, MethodCall, MethodResponse};

    #[test]
    fn sdk_int_precedence() {
        assert_eq!(resolve_sdk_int(Some(33), Some("21".into())), 33);
        assert_eq!(resolve_sdk_int(None, Some(" 29 ".into())), 29);
        assert_eq!(resolve_sdk_int(None, Some("tiramisu".into())), 0);
        assert_eq!(resolve_sdk_int(None, None), 0);
    }

    #[test]
    fn downloads_dir_precedence() {
        assert_eq!(
            resolve_downloads_dir(
                Some("/cfg".into()),
                Some("/xdg".into()),
                Some("/home/u".into())
            ),
            Some(PathBuf::from("/cfg"))
        );
        assert_eq!(
            resolve_downloads_dir(None, Some("/xdg".into()), Some("/home/u".into())),
            Some(PathBuf::from("/xdg"))
        );
        assert_eq!(
            resolve_downloads_dir(None, Some(String::new()), Some("/home/u".into())),
            Some(PathBuf::from("/home/u/Downloads"))
        );
        assert_eq!(resolve_downloads_dir(None, None, None), None);
    }

    fn platform(sdk_int: i32, downloads_dir: Option<PathBuf>) -> DesktopPlatform {
        DesktopPlatform {
            sdk_int,
            downloads_dir,
        }
    }

    #[test]
    fn legacy_sdk_uses_direct_backend() {
        let downloads = tempfile::tempdir().unwrap();
        let config = BridgeConfig::default();
        let channel =
            DownloadsChannel::for_platform(&platform(28, Some(downloads.path().into())), &config)
                .unwrap();

        assert_eq!(channel.backend_name(), Some("direct-filesystem"));
        assert_eq!(
            channel.handle(&MethodCall::new("getSdkInt")),
            MethodResponse::success(28)
        );
    }

    #[test]
    fn q_and_later_use_managed_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig {
            media_index_path: Some(dir.path().join("downloads.db")),
            ..BridgeConfig::default()
        };
        let channel = DownloadsChannel::for_platform(&platform(29, None), &config).unwrap();

        assert_eq!(channel.backend_name(), Some("managed-index"));
    }

    #[test]
    fn managed_without_index_path_still_answers_sdk_int() {
        let config = BridgeConfig::default();
        let channel = DownloadsChannel::for_platform(&platform(33, None), &config).unwrap();

        assert_eq!(channel.backend_name(), None);
        assert_eq!(
            channel.handle(&MethodCall::new("getSdkInt")),
            MethodResponse::success(33)
        );

        let save = MethodCall::new("saveToDownloads")
            .with_arg("path", "/tmp/source.bin")
            .with_arg("name", "x.bin");
        assert_eq!(
            channel.handle(&save),
            MethodResponse::from_error(&EasyshareError::PlatformUnavailable)
        );
    }

    #[test]
    fn managed_save_through_channel_publishes_row() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("downloads.db");
        let src = dir.path().join("cache.bin");
        std::fs::write(&src, b"shared bytes").unwrap();
        let config = BridgeConfig {
            media_index_path: Some(db.clone()),
            ..BridgeConfig::default()
        };
        let channel = DownloadsChannel::for_platform(&platform(33, None), &config).unwrap();

        let response = channel.handle(
            &MethodCall::new("saveToDownloads")
                .with_arg("path", src.to_string_lossy().into_owned())
                .with_arg("name", "shared.bin"),
        );
        let MethodResponse::Success { result } = response else {
            panic!("expected success, got {response:?}");
        };
        drop(channel);

        let index = SqliteMediaIndex::open(&db).unwrap();
        let id = SqliteMediaIndex::id_from_location(result.as_str().unwrap()).unwrap();
        assert_eq!(index.count().unwrap(), 1);
        assert_eq!(index.pending_count().unwrap(), 0);
        assert_eq!(index.read_data(id).unwrap().unwrap(), b"shared bytes");
        assert_eq!(index.entry(id).unwrap().unwrap().display_name, "shared.bin");
    }
}
