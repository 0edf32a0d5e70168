// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EasyShare storage — copies files into the shared Downloads area through
// either the managed media index or the public Downloads directory.

pub mod backend;
pub mod copy;
pub mod direct;
pub mod managed;
pub mod persister;
pub mod sqlite_index;

pub use backend::StorageBackend;
pub use copy::{CopyStats, copy_stream};
pub use direct::DirectFilesystemBackend;
pub use managed::{ManagedIndexBackend, MediaIndex};
pub use persister::DownloadPersister;
pub use sqlite_index::{DownloadRow, SqliteMediaIndex};
