// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EasyShare — native bridge for the `easyshare/downloads` method channel.
//
// The channel receives `getSdkInt` and `saveToDownloads` calls from the app
// layer. Platform specifics (SDK level, media index, public directory) sit
// behind the traits in `traits`, with a JNI implementation on Android and a
// configurable stub everywhere else.

pub mod channel;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use channel::{CHANNEL_NAME, DownloadsChannel, MethodCall, MethodResponse};

use easyshare_core::BridgeConfig;
use easyshare_core::error::Result;

/// Retrieves the bridge implementation for the target operating system.
pub fn platform(config: &BridgeConfig) -> Box<dyn traits::NativePlatform> {
    #[cfg(target_os = "android")]
    {
        // Android: SDK level and storage come from the ART runtime via JNI.
        let _ = config;
        Box::new(android::AndroidPlatform::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: SDK level and locations come from config/environment.
        Box::new(stub::DesktopPlatform::new(config))
    }
}

/// Build the downloads channel for the current platform.
pub fn downloads_channel(config: &BridgeConfig) -> Result<DownloadsChannel> {
    let platform = platform(config);
    DownloadsChannel::for_platform(platform.as_ref(), config)
}
