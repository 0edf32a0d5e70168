// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native capabilities the
// downloads channel needs.

use std::path::PathBuf;

use easyshare_core::BridgeConfig;
use easyshare_core::error::Result;
use easyshare_storage::StorageBackend;

/// Unified bridge that groups the native capabilities.
pub trait NativePlatform: NativeVersion + NativeDownloads {
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Report the platform's API level.
pub trait NativeVersion {
    /// Integer SDK level (`Build.VERSION.SDK_INT` on Android).
    fn sdk_int(&self) -> Result<i32>;
}

/// Reach the two shared-storage capabilities.
pub trait NativeDownloads {
    /// Backend that inserts into the platform's Downloads media index.
    fn managed_index_backend(&self, config: &BridgeConfig) -> Result<Box<dyn StorageBackend>>;

    /// The public Downloads directory used by the legacy strategy.
    fn public_downloads_dir(&self) -> Result<PathBuf>;
}
