//! Batch driver: expand user inputs into candidate binaries, check each one,
//! and aggregate the verdicts.
//!
//! The export table is loaded by the caller before anything here runs and is
//! only ever borrowed. Per-binary checks are independent, so they may run on a
//! worker pool; results are always reported in candidate order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::arch::Architecture;
use crate::check::{check, Verdict};
use crate::exports::ExportTable;
use crate::reader::{read_with_timeout, CandidateBinary};

/// Ordered, de-duplicated candidate list produced from user inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub candidates: Vec<PathBuf>,
    /// Directory inputs that contained no applet outputs.
    pub empty_inputs: usize,
}

/// Expand `inputs` into candidate paths.
///
/// A directory contributes its direct entries whose file name ends in
/// `suffix`, sorted. Anything else is taken as-is without an existence check;
/// a missing file becomes that binary's parse failure later on.
pub fn expand_inputs(inputs: &[PathBuf], suffix: &str) -> Expansion {
    let mut expansion = Expansion::default();
    let mut seen = HashSet::new();

    for input in inputs {
        let found =
            if input.is_dir() { applets_in_dir(input, suffix) } else { vec![input.clone()] };
        if found.is_empty() {
            expansion.empty_inputs += 1;
        }
        for path in found {
            if seen.insert(path.clone()) {
                expansion.candidates.push(path);
            }
        }
    }

    expansion
}

fn applets_in_dir(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("cannot list {}: {err}", dir.display());
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| !path.is_dir())
        .filter(|path| {
            let name = path.file_name().and_then(|name| name.to_str());
            name.is_some_and(|name| name.ends_with(suffix))
        })
        .collect();
    found.sort();
    found
}

/// Verdict for one candidate, with the facts read from it when parsing worked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOutcome {
    pub path: PathBuf,
    pub binary: Option<CandidateBinary>,
    pub verdict: Verdict,
}

impl BinaryOutcome {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

/// Read and check one candidate. Parse failures become failing verdicts.
pub fn check_path(path: &Path, exports: &ExportTable, timeout: Duration) -> BinaryOutcome {
    match read_with_timeout(path, timeout) {
        Ok(binary) => {
            let verdict = check(&binary, exports);
            BinaryOutcome { path: path.to_path_buf(), binary: Some(binary), verdict }
        }
        Err(err) => {
            log::debug!("{}: {err}", path.display());
            let verdict = Verdict::parse_failure(err);
            BinaryOutcome { path: path.to_path_buf(), binary: None, verdict }
        }
    }
}

/// How a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub jobs: usize,
    pub timeout: Duration,
}

/// Check every candidate; outcomes come back in `candidates` order.
pub fn run_batch(
    candidates: &[PathBuf],
    exports: &ExportTable,
    options: BatchOptions,
) -> Vec<BinaryOutcome> {
    let jobs = options.jobs.clamp(1, candidates.len().max(1));
    if jobs == 1 {
        return candidates.iter().map(|path| check_path(path, exports, options.timeout)).collect();
    }

    log::debug!("checking {} binaries on {jobs} workers", candidates.len());
    let next = AtomicUsize::new(0);
    let next = &next;
    thread::scope(|scope| {
        let workers: Vec<_> = (0..jobs)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = candidates.get(index) else { break };
                        done.push((index, check_path(path, exports, options.timeout)));
                    }
                    done
                })
            })
            .collect();

        let mut indexed = Vec::with_capacity(candidates.len());
        for worker in workers {
            match worker.join() {
                Ok(done) => indexed.extend(done),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    })
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every checked binary passed.
    Passed,
    /// At least one binary failed conformance.
    Failed,
    /// Expansion produced no candidates at all.
    NoCandidates,
}

impl BatchStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            BatchStatus::Passed => 0,
            BatchStatus::Failed => 1,
            BatchStatus::NoCandidates => 2,
        }
    }
}

/// Summary across all checked binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub checked: usize,
    pub passed: usize,
    pub failed: usize,
    /// Inputs that resolved to zero candidate files.
    pub empty_inputs: usize,
    pub success: bool,
    pub status: BatchStatus,
}

impl BatchResult {
    pub fn summarize(outcomes: &[BinaryOutcome], empty_inputs: usize) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed()).count();
        let failed = outcomes.len() - passed;
        let status = if outcomes.is_empty() {
            BatchStatus::NoCandidates
        } else if failed > 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Passed
        };
        Self {
            checked: outcomes.len(),
            passed,
            failed,
            empty_inputs,
            success: status == BatchStatus::Passed,
            status,
        }
    }
}

/// Serializable per-binary report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryReport {
    pub path: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<u64>,
    pub diagnostics: Vec<String>,
}

impl From<&BinaryOutcome> for BinaryReport {
    fn from(outcome: &BinaryOutcome) -> Self {
        let binary = outcome.binary.as_ref();
        Self {
            path: outcome.path.display().to_string(),
            passed: outcome.passed(),
            machine: binary.map(|b| b.machine.clone()),
            architecture: binary.map(|b| b.architecture),
            object_kind: binary.map(|b| b.object_kind.to_string()),
            entry: binary.map(|b| b.entry_address),
            diagnostics: outcome.verdict.diagnostics().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Full run report, suitable for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub binaries: Vec<BinaryReport>,
    pub summary: BatchResult,
}

impl BatchReport {
    pub fn new(outcomes: &[BinaryOutcome], empty_inputs: usize) -> Self {
        Self {
            binaries: outcomes.iter().map(BinaryReport::from).collect(),
            summary: BatchResult::summarize(outcomes, empty_inputs),
        }
    }
}
