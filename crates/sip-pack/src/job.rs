//! The background export job.
//!
//! One dedicated worker thread per job; items are processed strictly one at
//! a time so progress and ETA accounting stay exact. The caller never
//! blocks: it polls the thread-safe accessors or joins for the final
//! summary. Cancellation is cooperative, checked at the top of each
//! iteration; in-flight partial output for the interrupted item is
//! best-effort only.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use sip_model::PackageAssembly;
use sip_types::{AssemblyId, ConfigProvider, MapConfig};
use tracing::{debug, info, warn};

use crate::builder::BuildStep;
use crate::error::{PackError, PackResult};
use crate::format::PackageFormat;
use crate::report::{BurstGuard, ErrorSink, InventoryEntry, InventoryReport, NullSink};
use crate::validate::{PermissiveValidator, SchemaValidator};

/// File name of the inventory report written into the output directory.
pub const REPORT_FILE: &str = "report.json";

/// One batch entry: an assembly plus its optional repository placement path
/// (slash-separated ancestor chain).
#[derive(Clone, Debug)]
pub struct ExportItem {
    pub assembly: PackageAssembly,
    pub ancestor_path: Option<String>,
}

impl ExportItem {
    pub fn new(assembly: PackageAssembly) -> Self {
        Self {
            assembly,
            ancestor_path: None,
        }
    }

    pub fn with_ancestor_path(mut self, path: impl Into<String>) -> Self {
        self.ancestor_path = Some(path.into());
        self
    }
}

/// Job-level options.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExportOptions {
    pub format: PackageFormat,
    /// Write one `report.json` correlating outputs to source assemblies,
    /// even when the job was cancelled partway.
    pub create_report: bool,
}

/// External collaborators consumed by the job.
pub struct Collaborators {
    pub config: Arc<dyn ConfigProvider>,
    pub validator: Arc<dyn SchemaValidator>,
    pub sink: Arc<dyn ErrorSink>,
    pub burst: BurstGuard,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            config: Arc::new(MapConfig::new()),
            validator: Arc::new(PermissiveValidator),
            sink: Arc::new(NullSink),
            burst: BurstGuard::default(),
        }
    }
}

/// Final outcome of one export job.
#[derive(Debug)]
pub struct ExportSummary {
    pub created: u64,
    pub errors: u64,
    pub cancelled: bool,
    /// Produced package paths, in batch order.
    pub produced: Vec<PathBuf>,
    /// Assemblies that failed to package.
    pub failed: Vec<AssemblyId>,
    pub report_path: Option<PathBuf>,
}

#[derive(Default)]
struct CurrentStatus {
    action: String,
    item: String,
}

struct JobShared {
    total: u64,
    created: AtomicU64,
    errors: AtomicU64,
    cancel: AtomicBool,
    finished: AtomicBool,
    current: Mutex<CurrentStatus>,
    started: Instant,
}

impl JobShared {
    fn completed(&self) -> u64 {
        self.created.load(Ordering::Relaxed) + self.errors.load(Ordering::Relaxed)
    }

    fn set_current(&self, action: &str, item: &str) {
        let mut current = self.current.lock().expect("job status lock poisoned");
        current.action = action.to_string();
        current.item = item.to_string();
    }
}

/// Handle to a running export job.
///
/// All accessors are safe to call from any thread while the worker runs.
pub struct ExportJob {
    shared: Arc<JobShared>,
    worker: Option<JoinHandle<ExportSummary>>,
}

impl ExportJob {
    /// Validate the output directory and start the worker thread.
    ///
    /// An unusable output directory is the only fatal construction error;
    /// everything later is per-item.
    pub fn start(
        output_dir: impl Into<PathBuf>,
        batch: Vec<ExportItem>,
        options: ExportOptions,
        collaborators: Collaborators,
    ) -> PackResult<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| PackError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let shared = Arc::new(JobShared {
            total: batch.len() as u64,
            created: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            cancel: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            current: Mutex::new(CurrentStatus::default()),
            started: Instant::now(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::spawn(move || {
            run_batch(&output_dir, batch, options, collaborators, &worker_shared)
        });

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Number of packages written so far.
    pub fn created_count(&self) -> u64 {
        self.shared.created.load(Ordering::Relaxed)
    }

    /// Number of items that failed so far.
    pub fn error_count(&self) -> u64 {
        self.shared.errors.load(Ordering::Relaxed)
    }

    /// Short label of the step currently running.
    pub fn current_action(&self) -> String {
        self.shared
            .current
            .lock()
            .expect("job status lock poisoned")
            .action
            .clone()
    }

    /// Title of the assembly currently being packaged.
    pub fn current_item(&self) -> String {
        self.shared
            .current
            .lock()
            .expect("job status lock poisoned")
            .item
            .clone()
    }

    /// Completed fraction in `[0, 1]`. An empty batch reports `1.0`.
    pub fn progress(&self) -> f64 {
        if self.shared.total == 0 {
            return 1.0;
        }
        (self.shared.completed() as f64 / self.shared.total as f64).min(1.0)
    }

    /// Estimated remaining time in milliseconds, extrapolated from elapsed
    /// time over completed items. Returns `-1.0` before the first
    /// completion (nothing to extrapolate from).
    pub fn eta_millis(&self) -> f64 {
        let completed = self.shared.completed();
        if completed == 0 {
            return -1.0;
        }
        let elapsed = self.shared.started.elapsed().as_millis() as f64;
        let remaining = self.shared.total.saturating_sub(completed) as f64;
        elapsed / completed as f64 * remaining
    }

    /// Request a cooperative stop before the next item.
    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once the worker has finished (completed or cancelled).
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Relaxed)
    }

    /// Wait for the job to finish and return its summary.
    pub fn join(mut self) -> PackResult<ExportSummary> {
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| PackError::WorkerPanicked),
            None => Err(PackError::WorkerPanicked),
        }
    }
}

fn run_batch(
    output_dir: &Path,
    batch: Vec<ExportItem>,
    options: ExportOptions,
    collaborators: Collaborators,
    shared: &Arc<JobShared>,
) -> ExportSummary {
    let builder = options.format.builder();
    info!(
        format = %options.format,
        items = batch.len(),
        output = %output_dir.display(),
        "export started"
    );

    let mut produced = Vec::new();
    let mut entries = Vec::new();
    let mut failed = Vec::new();
    let mut cancelled = false;

    for item in batch {
        if shared.cancel.load(Ordering::Relaxed) {
            cancelled = true;
            break;
        }
        let mut assembly = item.assembly;
        if assembly.ancestors.is_empty() {
            if let Some(ancestor_path) = &item.ancestor_path {
                assembly.ancestors = ancestor_path
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
        }

        shared.set_current("packaging", &assembly.title);
        let title = assembly.title.clone();
        let progress_shared = Arc::clone(shared);
        let result = builder.build(
            &assembly,
            output_dir,
            collaborators.config.as_ref(),
            collaborators.validator.as_ref(),
            &mut |step: BuildStep| progress_shared.set_current(step.action(), &title),
        );

        match result {
            Ok(path) => {
                shared.created.fetch_add(1, Ordering::Relaxed);
                debug!(assembly = %assembly.id, path = %path.display(), "package written");
                entries.push(InventoryEntry {
                    output_path: path.clone(),
                    assembly_id: assembly.id,
                    title: assembly.title.clone(),
                });
                produced.push(path);
            }
            Err(error) => {
                shared.errors.fetch_add(1, Ordering::Relaxed);
                failed.push(assembly.id);
                if collaborators.burst.admit() {
                    warn!(assembly = %assembly.id, error = %error, "item failed, batch continues");
                    collaborators.sink.item_failed(assembly.id, &error);
                } else {
                    debug!(assembly = %assembly.id, "item failure suppressed (burst)");
                }
            }
        }
    }

    shared.set_current("done", "");
    let report = InventoryReport::new(entries, failed.clone(), cancelled);
    let report_path = if options.create_report {
        let path = output_dir.join(REPORT_FILE);
        match report.write(&path) {
            Ok(()) => Some(path),
            Err(error) => {
                warn!(error = %error, "could not write inventory report");
                None
            }
        }
    } else {
        None
    };
    collaborators.sink.batch_finished(&report);

    let summary = ExportSummary {
        created: shared.created.load(Ordering::Relaxed),
        errors: shared.errors.load(Ordering::Relaxed),
        cancelled,
        produced,
        failed,
        report_path,
    };
    info!(
        created = summary.created,
        errors = summary.errors,
        cancelled = summary.cancelled,
        "export finished"
    );
    shared.finished.store(true, Ordering::Relaxed);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{channel, Receiver, Sender};

    use sip_model::{MetadataEntry, Representation, SchemaRef};

    use crate::validate::Validation;

    fn assembly_with_file(dir: &Path, name: &str, body: &[u8]) -> PackageAssembly {
        let src = dir.join(format!("{name}.src"));
        fs::write(&src, body).unwrap();
        let mut rep = Representation::new("rep1");
        rep.add_file(src);
        let mut assembly = PackageAssembly::new(name);
        assembly.add_representation(rep);
        assembly
    }

    fn broken_assembly(dir: &Path, name: &str) -> PackageAssembly {
        let mut rep = Representation::new("rep1");
        rep.add_file(dir.join("missing-source-file"));
        let mut assembly = PackageAssembly::new(name);
        assembly.add_representation(rep);
        assembly
    }

    // -----------------------------------------------------------------
    // Batch semantics
    // -----------------------------------------------------------------

    #[test]
    fn one_failing_item_never_aborts_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let batch = vec![
            ExportItem::new(assembly_with_file(dir.path(), "first", b"1")),
            ExportItem::new(broken_assembly(dir.path(), "broken")),
            ExportItem::new(assembly_with_file(dir.path(), "third", b"3")),
            ExportItem::new(assembly_with_file(dir.path(), "fourth", b"4")),
        ];
        let broken_id = batch[1].assembly.id;

        let job = ExportJob::start(
            dir.path().join("out"),
            batch,
            ExportOptions::default(),
            Collaborators::default(),
        )
        .unwrap();
        let summary = job.join().unwrap();

        assert_eq!(summary.created, 3);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.failed, vec![broken_id]);
        assert_eq!(summary.produced.len(), 3);
        assert!(!summary.cancelled);
    }

    #[test]
    fn batch_of_ten_with_report_produces_ten_packages_and_one_report() {
        let dir = tempfile::tempdir().unwrap();
        let batch: Vec<ExportItem> = (0..10)
            .map(|i| ExportItem::new(assembly_with_file(dir.path(), &format!("pkg{i}"), b"x")))
            .collect();
        let ids: Vec<AssemblyId> = batch.iter().map(|i| i.assembly.id).collect();

        let out = dir.path().join("out");
        let job = ExportJob::start(
            &out,
            batch,
            ExportOptions {
                format: PackageFormat::BagIt,
                create_report: true,
            },
            Collaborators::default(),
        )
        .unwrap();
        let summary = job.join().unwrap();

        assert_eq!(summary.created, 10);
        assert!(summary.produced.iter().all(|p| p.is_dir()));

        let report_path = summary.report_path.unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        let entries = value["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 10);
        for (entry, id) in entries.iter().zip(&ids) {
            assert_eq!(entry["assembly_id"], id.to_string());
        }
    }

    #[test]
    fn empty_batch_finishes_immediately_with_full_progress() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob::start(
            dir.path().join("out"),
            Vec::new(),
            ExportOptions::default(),
            Collaborators::default(),
        )
        .unwrap();
        assert_eq!(job.progress(), 1.0);
        let summary = job.join().unwrap();
        assert_eq!(summary.created, 0);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn unusable_output_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not dir").unwrap();

        let result = ExportJob::start(
            blocker.join("out"),
            Vec::new(),
            ExportOptions::default(),
            Collaborators::default(),
        );
        assert!(matches!(result, Err(PackError::OutputDir { .. })));
    }

    #[test]
    fn ancestor_path_fills_empty_ancestor_chain() {
        let dir = tempfile::tempdir().unwrap();
        let item = ExportItem::new(assembly_with_file(dir.path(), "child", b"c"))
            .with_ancestor_path("fonds-1/series-2");

        let job = ExportJob::start(
            dir.path().join("out"),
            vec![item],
            ExportOptions {
                format: PackageFormat::MetsHeader,
                create_report: false,
            },
            Collaborators::default(),
        )
        .unwrap();
        let summary = job.join().unwrap();

        let mets = fs::read_to_string(summary.produced[0].join("METS.xml")).unwrap();
        assert!(mets.contains("ancestor: fonds-1"));
        assert!(mets.contains("ancestor: series-2"));
    }

    // -----------------------------------------------------------------
    // Progress / ETA
    // -----------------------------------------------------------------

    #[test]
    fn eta_is_unknown_before_first_completion() {
        let dir = tempfile::tempdir().unwrap();
        // A gated validator parks the worker inside item 1, so the
        // pre-completion state is observable without racing.
        let (validator, gate) = GateValidator::new();
        let job = ExportJob::start(
            dir.path().join("out"),
            vec![
                ExportItem::new(gated_assembly(dir.path(), "one")),
                ExportItem::new(gated_assembly(dir.path(), "two")),
            ],
            ExportOptions::default(),
            Collaborators {
                validator: Arc::new(validator),
                ..Collaborators::default()
            },
        )
        .unwrap();

        gate.wait_until_entered();
        assert_eq!(job.eta_millis(), -1.0);
        assert_eq!(job.progress(), 0.0);
        assert_eq!(job.current_item(), "one");

        gate.release();
        gate.wait_until_entered();
        gate.release();
        let summary = job.join().unwrap();
        assert_eq!(summary.created, 2);
    }

    #[test]
    fn cancellation_stops_before_the_next_item() {
        let dir = tempfile::tempdir().unwrap();
        let (validator, gate) = GateValidator::new();
        let job = ExportJob::start(
            dir.path().join("out"),
            vec![
                ExportItem::new(gated_assembly(dir.path(), "one")),
                ExportItem::new(gated_assembly(dir.path(), "two")),
                ExportItem::new(gated_assembly(dir.path(), "three")),
            ],
            ExportOptions {
                format: PackageFormat::BagIt,
                create_report: true,
            },
            Collaborators {
                validator: Arc::new(validator),
                ..Collaborators::default()
            },
        )
        .unwrap();

        // Cancel while the worker is inside item 1: it finishes that item,
        // then stops at the next checkpoint.
        gate.wait_until_entered();
        job.cancel();
        gate.release();
        let summary = job.join().unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.errors, 0);
        // The report is still written after a cancelled run.
        let report = fs::read_to_string(summary.report_path.unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["cancelled"], true);
        assert_eq!(value["entries"].as_array().unwrap().len(), 1);
    }

    // -----------------------------------------------------------------
    // Error sink and burst suppression
    // -----------------------------------------------------------------

    struct CollectingSink {
        failures: Mutex<Vec<AssemblyId>>,
        finished: Mutex<u32>,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                failures: Mutex::new(Vec::new()),
                finished: Mutex::new(0),
            }
        }
    }

    impl ErrorSink for CollectingSink {
        fn item_failed(&self, assembly: AssemblyId, _error: &PackError) {
            self.failures.lock().unwrap().push(assembly);
        }

        fn batch_finished(&self, _report: &InventoryReport) {
            *self.finished.lock().unwrap() += 1;
        }
    }

    #[test]
    fn sink_sees_failures_capped_by_burst_guard() {
        let dir = tempfile::tempdir().unwrap();
        let batch: Vec<ExportItem> = (0..6)
            .map(|i| ExportItem::new(broken_assembly(dir.path(), &format!("b{i}"))))
            .collect();

        let sink = Arc::new(CollectingSink::new());
        let job = ExportJob::start(
            dir.path().join("out"),
            batch,
            ExportOptions::default(),
            Collaborators {
                sink: Arc::clone(&sink) as Arc<dyn ErrorSink>,
                burst: BurstGuard::new(2, std::time::Duration::from_secs(60)),
                ..Collaborators::default()
            },
        )
        .unwrap();
        let summary = job.join().unwrap();

        assert_eq!(summary.errors, 6);
        // Only the first two failures reached the sink; the burst was
        // suppressed, but every failure is still counted and reported.
        assert_eq!(sink.failures.lock().unwrap().len(), 2);
        assert_eq!(*sink.finished.lock().unwrap(), 1);
        assert_eq!(summary.failed.len(), 6);
    }

    // -----------------------------------------------------------------
    // Test fixtures
    // -----------------------------------------------------------------

    /// An assembly whose metadata routes through the validator, so a
    /// gating validator can park the worker mid-item.
    fn gated_assembly(dir: &Path, name: &str) -> PackageAssembly {
        let mut assembly = assembly_with_file(dir, name, b"x");
        assembly.add_metadata(
            MetadataEntry::new("dc", "dublin-core", "<dc/>")
                .with_schema(SchemaRef::new("dc.xsd")),
        );
        assembly
    }

    /// Validator that signals entry and blocks until released, making the
    /// worker's position deterministic in tests.
    struct GateValidator {
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    struct Gate {
        entered: Mutex<Receiver<()>>,
        release: Sender<()>,
    }

    impl GateValidator {
        fn new() -> (Self, Gate) {
            let (entered_tx, entered_rx) = channel();
            let (release_tx, release_rx) = channel();
            (
                Self {
                    entered: Mutex::new(entered_tx),
                    release: Mutex::new(release_rx),
                },
                Gate {
                    entered: Mutex::new(entered_rx),
                    release: release_tx,
                },
            )
        }
    }

    impl SchemaValidator for GateValidator {
        fn validate(&self, _content: &str, _schema: Option<&SchemaRef>) -> Validation {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Validation::ok()
        }
    }

    impl Gate {
        fn wait_until_entered(&self) {
            self.entered.lock().unwrap().recv().unwrap();
        }

        fn release(&self) {
            self.release.send(()).unwrap();
        }
    }
}
