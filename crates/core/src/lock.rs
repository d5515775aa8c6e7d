// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock: named-resource mutual exclusion across sessions.
//!
//! One row per resource, keyed by the resource name itself (not a
//! generated ID — the resource string `"port:<id>"` or
//! `"file:<absolute-path>"` is the primary key, per spec.md §3). Not
//! reentrant, no timeout: released explicitly on `session-end`, `port-end`,
//! or the admin `clear`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lock {
    pub resource: String,
    pub session_id: String,
    pub acquired_at_ms: u64,
}

impl Lock {
    pub fn new(resource: impl Into<String>, session_id: impl Into<String>, acquired_at_ms: u64) -> Self {
        Self {
            resource: resource.into(),
            session_id: session_id.into(),
            acquired_at_ms,
        }
    }

    /// Resource name for a port lock, per spec.md §5 shared-resource policy.
    pub fn port_resource(port_id: &str) -> String {
        format!("port:{port_id}")
    }

    /// Resource name for a file-region lock declared by a port spec.
    pub fn file_resource(absolute_path: &str) -> String {
        format!("file:{absolute_path}")
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
