//! One-shot handoff storage for values that must survive a full page
//! navigation.
//!
//! In-memory state dies with the page, so the loading view writes the
//! fetched report here immediately before navigating and the results view
//! reads it back exactly once. A second read observes nothing; stale data
//! never leaks into a later, unrelated visit.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use dashmap::DashMap;
use serde_json::Value;
use tracing::warn;

use crate::domain::models::AuditReport;

/// Storage key for the one-shot report handoff.
pub const REPORT_HANDOFF_KEY: &str = "seo-audit-report";

/// A keyed store with read-and-clear semantics.
pub trait HandoffStore: Send + Sync {
    fn put(&self, key: &str, value: Value);

    /// Remove and return the stored value. At most one caller observes it.
    fn take(&self, key: &str) -> Option<Value>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Process-local store; suitable for tests and single-view hosts.
#[derive(Default)]
pub struct MemoryHandoff {
    entries: DashMap<String, Value>,
}

impl MemoryHandoff {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HandoffStore for MemoryHandoff {
    fn put(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn take(&self, key: &str) -> Option<Value> {
        // remove is atomic, so rapid repeated reads race for one winner
        self.entries.remove(key).map(|(_, value)| value)
    }
}

// ============================================================================
// FILE-BACKED STORE
// ============================================================================

/// Durable store backed by one JSON file per key.
pub struct FileHandoff {
    dir: PathBuf,
    io: Mutex<()>,
}

impl FileHandoff {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), io: Mutex::new(()) }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl HandoffStore for FileHandoff {
    fn put(&self, key: &str, value: Value) {
        let _io = self.io.lock().expect("handoff lock");
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("handoff: cannot create {}: {e}", self.dir.display());
            return;
        }
        let path = self.path_for(key);
        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&path, bytes) {
                    warn!("handoff: cannot write {}: {e}", path.display());
                }
            }
            Err(e) => warn!("handoff: cannot encode value for `{key}`: {e}"),
        }
    }

    fn take(&self, key: &str) -> Option<Value> {
        let _io = self.io.lock().expect("handoff lock");
        let path = self.path_for(key);
        let bytes = fs::read(&path).ok()?;
        if let Err(e) = fs::remove_file(&path) {
            warn!("handoff: cannot clear {}: {e}", path.display());
        }
        serde_json::from_slice(&bytes).ok()
    }
}

// ============================================================================
// TYPED HELPERS
// ============================================================================

/// Stash a fetched report under the fixed handoff key.
pub fn stash_report(store: &dyn HandoffStore, report: &AuditReport) {
    match serde_json::to_value(report) {
        Ok(value) => store.put(REPORT_HANDOFF_KEY, value),
        Err(e) => warn!("handoff: report does not serialize: {e}"),
    }
}

/// Read-and-clear the stashed report. Corrupt payloads read as absent.
pub fn take_report(store: &dyn HandoffStore) -> Option<AuditReport> {
    let value = store.take(REPORT_HANDOFF_KEY)?;
    AuditReport::from_json(&value).ok()
}
