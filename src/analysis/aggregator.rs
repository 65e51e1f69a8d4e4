//! Result aggregation.
//!
//! Turns a directory of per-run result files into an [`AggregatedDataset`]:
//! discover, parse, order by run index, drop degenerate runs, then copy the
//! surviving fields into aligned sequences.

use crate::error::{AggregateError, Result};
use crate::models::{
    AggregatedDataset, DropReason, LoadSummary, RunConfig, RunOutcome, RunRecord, RunResult,
};
use crate::scanner::{FileScanner, ScanConfig, ScannedFile};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Load a results directory with the default file naming rules.
pub fn load(directory: &Path) -> Result<AggregatedDataset> {
    ResultAggregator::default().load(directory)
}

/// Loads results directories into aligned datasets.
///
/// The aggregator holds no state between calls; each load returns a fresh
/// dataset owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    scan_config: ScanConfig,
}

impl ResultAggregator {
    /// Create an aggregator with custom file naming rules.
    pub fn new(scan_config: ScanConfig) -> Self {
        Self { scan_config }
    }

    /// Load every result file in `directory`.
    ///
    /// Any unreadable file, syntax error, malformed name or malformed record
    /// aborts the whole load.
    pub fn load(&self, directory: &Path) -> Result<AggregatedDataset> {
        self.load_with_summary(directory).map(|(dataset, _)| dataset)
    }

    /// Like [`load`](Self::load), also reporting how many records were
    /// accepted and why the others were dropped.
    pub fn load_with_summary(&self, directory: &Path) -> Result<(AggregatedDataset, LoadSummary)> {
        let scanner = FileScanner::new(directory.to_path_buf(), self.scan_config.clone());
        let files = scanner.scan()?;

        let mut summary = LoadSummary::new(directory.to_path_buf());
        summary.candidates = files.len();

        let mut records = files
            .iter()
            .map(|file| read_record(&scanner, file))
            .collect::<Result<Vec<_>>>()?;

        // Stable, so equal indices keep discovery order.
        records.sort_by_key(|r| r.index);

        let mut dataset = AggregatedDataset::default();
        for record in &records {
            match accept(&record.outcome) {
                Ok((config, result)) => {
                    dataset.push_run(config, result);
                    summary.accepted += 1;
                }
                Err(reason) => {
                    debug!("Dropping {} ({})", record.path.display(), reason);
                    summary.record_drop(reason);
                }
            }
        }

        info!(
            "Loaded {} of {} runs from {} ({} dropped)",
            summary.accepted,
            summary.candidates,
            directory.display(),
            summary.dropped()
        );
        debug!(
            "Dropped: {} without result, {} with zero lanes, {} with zero max flow",
            summary.no_result, summary.zero_lanes, summary.zero_max_flow
        );

        Ok((dataset.finish(), summary))
    }
}

/// Decide whether a record belongs in the dataset.
fn accept(outcome: &RunOutcome) -> std::result::Result<(&RunConfig, &RunResult), DropReason> {
    match outcome {
        RunOutcome::NoResult => Err(DropReason::NoResult),
        RunOutcome::Completed { config, .. } if config.num_lanes == 0.0 => {
            Err(DropReason::ZeroLanes)
        }
        RunOutcome::Completed { result, .. } if result.max_flow_rate == 0.0 => {
            Err(DropReason::ZeroMaxFlow)
        }
        RunOutcome::Completed { config, result } => Ok((config, result)),
    }
}

/// Read and validate one result file.
fn read_record(scanner: &FileScanner, file: &ScannedFile) -> Result<RunRecord> {
    let index = scanner.parse_index(&file.name)?;

    let text = std::fs::read_to_string(&file.path).map_err(|source| AggregateError::Io {
        path: file.path.clone(),
        source,
    })?;
    let root: Value = serde_json::from_str(&text).map_err(|source| AggregateError::ParseError {
        path: file.path.clone(),
        source,
    })?;

    let malformed = |reason: String| AggregateError::MalformedRecord {
        path: file.path.clone(),
        reason,
    };

    let object = root
        .as_object()
        .ok_or_else(|| malformed("top-level value is not an object".to_string()))?;
    let config = object
        .get("config")
        .ok_or_else(|| malformed("missing 'config'".to_string()))?;

    // The config fields are only inspected once the run has a result.
    let outcome = match object.get("result") {
        Some(result) if result.is_object() => RunOutcome::Completed {
            config: RunConfig::deserialize(config)
                .map_err(|e| malformed(format!("invalid 'config': {e}")))?,
            result: RunResult::deserialize(result)
                .map_err(|e| malformed(format!("invalid 'result': {e}")))?,
        },
        _ => RunOutcome::NoResult,
    };

    Ok(RunRecord {
        index,
        path: file.path.clone(),
        outcome,
    })
}
