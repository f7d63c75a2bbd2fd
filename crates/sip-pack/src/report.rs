//! Error sink, failure burst suppression, and the batch inventory report.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sip_types::AssemblyId;

use crate::error::{PackError, PackResult};

/// Receives per-item failure events and the final inventory.
///
/// Implementations must be cheap; they are called from the export worker
/// thread.
pub trait ErrorSink: Send + Sync {
    fn item_failed(&self, assembly: AssemblyId, error: &PackError);

    fn batch_finished(&self, report: &InventoryReport);
}

/// A sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn item_failed(&self, _assembly: AssemblyId, _error: &PackError) {}

    fn batch_finished(&self, _report: &InventoryReport) {}
}

/// Suppresses failure floods: only the first `threshold` events within each
/// window are admitted, the rest are dropped until the window rolls over.
#[derive(Debug)]
pub struct BurstGuard {
    threshold: u32,
    window: Duration,
    state: Mutex<GuardState>,
}

#[derive(Debug)]
struct GuardState {
    window_start: Instant,
    admitted: u32,
}

impl BurstGuard {
    pub fn new(threshold: u32, window: Duration) -> Self {
        Self {
            threshold,
            window,
            state: Mutex::new(GuardState {
                window_start: Instant::now(),
                admitted: 0,
            }),
        }
    }

    /// Returns `true` if the event should be reported, `false` if it falls
    /// inside a suppressed burst.
    pub fn admit(&self) -> bool {
        let mut state = self.state.lock().expect("burst guard lock poisoned");
        if state.window_start.elapsed() >= self.window {
            state.window_start = Instant::now();
            state.admitted = 0;
        }
        if state.admitted < self.threshold {
            state.admitted += 1;
            true
        } else {
            false
        }
    }
}

impl Default for BurstGuard {
    /// Five reports per ten-second window.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(10))
    }
}

/// One produced package in the inventory.
#[derive(Clone, Debug, Serialize)]
pub struct InventoryEntry {
    pub output_path: PathBuf,
    pub assembly_id: AssemblyId,
    pub title: String,
}

/// Final report correlating each output path to its source assembly.
#[derive(Clone, Debug, Serialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub cancelled: bool,
    pub entries: Vec<InventoryEntry>,
    pub failed: Vec<AssemblyId>,
}

impl InventoryReport {
    pub fn new(entries: Vec<InventoryEntry>, failed: Vec<AssemblyId>, cancelled: bool) -> Self {
        Self {
            generated_at: Utc::now(),
            cancelled,
            entries,
            failed,
        }
    }

    /// Write the report as pretty JSON to `path`.
    pub fn write(&self, path: &Path) -> PackResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
