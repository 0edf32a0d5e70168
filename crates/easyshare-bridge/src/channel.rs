// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `easyshare/downloads` method channel.
//
// Calls arrive as a method name plus a map of named arguments and leave as
// one of three responses: success with a value, a structured error with a
// code, or "not implemented" for unknown methods. Nothing that happens while
// saving escapes as anything other than an error response.

use easyshare_core::error::{CODE_ARG, EasyshareError, Result};
use easyshare_core::types::{PersistRequest, StorageCapability};
use easyshare_core::BridgeConfig;
use easyshare_storage::{DirectFilesystemBackend, DownloadPersister, StorageBackend};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::traits::NativePlatform;

/// Name the host application registers the channel under.
pub const CHANNEL_NAME: &str = "easyshare/downloads";

pub const METHOD_GET_SDK_INT: &str = "getSdkInt";
pub const METHOD_SAVE_TO_DOWNLOADS: &str = "saveToDownloads";

/// An incoming call: method name and named arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    /// A string argument, or `None` if absent, null or not a string.
    pub fn string_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn from_error(err: &EasyshareError) -> Self {
        Self::error(err.channel_code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// JSON envelope handed back across the FFI boundary.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","code":"SAVE","message":"response encoding failed: {e}","details":null}}"#)
        })
    }
}

/// Handler behind the `easyshare/downloads` channel.
pub struct DownloadsChannel {
    sdk_int: i32,
    /// The backend chosen for this SDK level, or why none could be built.
    /// Only `saveToDownloads` depends on it.
    persister: Result<DownloadPersister>,
}

impl DownloadsChannel {
    pub fn new(sdk_int: i32, persister: DownloadPersister) -> Self {
        Self {
            sdk_int,
            persister: Ok(persister),
        }
    }

    /// Build the channel for a platform: read its SDK level once, resolve
    /// the storage capability from it and fix the backend for the lifetime
    /// of the channel.
    ///
    /// A backend that cannot be built does not fail the channel; the error is
    /// kept and returned from every `saveToDownloads` call instead.
    pub fn for_platform(platform: &dyn NativePlatform, config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        let sdk_int = platform.sdk_int()?;
        let capability = StorageCapability::for_sdk(sdk_int, config.managed_index_min_sdk);
        let persister = select_backend(platform, capability, config).map(DownloadPersister::new);

        match &persister {
            Ok(p) => info!(
                platform = platform.platform_name(),
                sdk_int,
                %capability,
                backend = p.backend_name(),
                "downloads channel ready"
            ),
            Err(e) => warn!(
                platform = platform.platform_name(),
                sdk_int,
                %capability,
                error = %e,
                "downloads channel ready without a storage backend"
            ),
        }
        Ok(Self { sdk_int, persister })
    }

    pub fn sdk_int(&self) -> i32 {
        self.sdk_int
    }

    /// Name of the storage backend, if one could be built.
    pub fn backend_name(&self) -> Option<&'static str> {
        self.persister.as_ref().ok().map(DownloadPersister::backend_name)
    }

    /// Dispatch one call.
    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        debug!(method = %call.method, "method call");
        match call.method.as_str() {
            METHOD_GET_SDK_INT => MethodResponse::success(self.sdk_int),
            METHOD_SAVE_TO_DOWNLOADS => self.save_to_downloads(call),
            other => {
                debug!(method = other, "method not implemented");
                MethodResponse::NotImplemented
            }
        }
    }

    /// Decode a JSON-encoded argument map, dispatch, and encode the reply.
    pub fn handle_json(&self, method: &str, arguments_json: Option<&str>) -> String {
        let arguments = match arguments_json.map(str::trim).filter(|s| !s.is_empty()) {
            None => Map::new(),
            Some(raw) => match serde_json::from_str::<Option<Map<String, Value>>>(raw) {
                Ok(map) => map.unwrap_or_default(),
                Err(e) => {
                    return MethodResponse::error(CODE_ARG, format!("malformed arguments: {e}"))
                        .to_json();
                }
            },
        };
        let call = MethodCall {
            method: method.to_string(),
            arguments,
        };
        self.handle(&call).to_json()
    }

    fn save_to_downloads(&self, call: &MethodCall) -> MethodResponse {
        let (Some(path), Some(name)) = (call.string_arg("path"), call.string_arg("name")) else {
            return MethodResponse::error(CODE_ARG, "Missing path/name");
        };

        let persister = match &self.persister {
            Ok(persister) => persister,
            Err(e) => {
                warn!(error = %e, "saveToDownloads without a storage backend");
                return MethodResponse::from_error(e);
            }
        };

        match persister.persist(&PersistRequest::new(path, name)) {
            Ok(receipt) => MethodResponse::success(receipt.location_id),
            Err(e) => {
                warn!(error = %e, code = e.channel_code(), "saveToDownloads failed");
                MethodResponse::from_error(&e)
            }
        }
    }
}

/// Pick the backend for a resolved capability.
pub fn select_backend(
    platform: &dyn NativePlatform,
    capability: StorageCapability,
    config: &BridgeConfig,
) -> Result<Box<dyn StorageBackend>> {
    match capability {
        StorageCapability::ManagedIndex => platform.managed_index_backend(config),
        StorageCapability::DirectFilesystem => Ok(Box::new(DirectFilesystemBackend::new(
            platform.public_downloads_dir()?,
            config.copy_buffer_size,
        ))),
    }
}
