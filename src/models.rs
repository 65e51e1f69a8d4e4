//! Data models for the result aggregator.
//!
//! This module contains the per-run record types read from disk, the
//! aligned dataset handed to charting and reporting, and the summary
//! structures that describe a load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use crate::analysis::derive;

/// Simulation inputs stored under the `config` key of a result file.
///
/// Unknown keys written by newer simulator versions are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub road_length: f64,
    pub car_density: f64,
    pub num_lanes: f64,
    pub current_lane_bias: f64,
    pub random_stop_rate: f64,
    pub steps_to_run: f64,
    pub max_movement: f64,
    pub acceleration_rate: f64,
    pub break_rate: f64,
}

/// Simulation outputs stored under the `result` key of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub flow_rate: f64,
    pub max_flow_rate: f64,
    pub collisions: f64,
}

/// One parsed result file.
///
/// `outcome` is [`RunOutcome::NoResult`] when the file carried a non-object
/// `result` (usually `null`), meaning the run never produced output.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Run index taken from the filename; only used for ordering.
    pub index: i64,
    /// File the record was read from.
    pub path: PathBuf,
    pub outcome: RunOutcome,
}

/// What a result file says about its run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run finished and reported results.
    Completed { config: RunConfig, result: RunResult },
    /// The `result` key held a non-object value.
    NoResult,
}

/// Why a well-formed record was left out of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// `result` was not an object.
    NoResult,
    /// `config.num_lanes` was zero.
    ZeroLanes,
    /// `result.max_flow_rate` was zero.
    ZeroMaxFlow,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NoResult => write!(f, "no result"),
            DropReason::ZeroLanes => write!(f, "zero lanes"),
            DropReason::ZeroMaxFlow => write!(f, "zero max flow rate"),
        }
    }
}

/// A named numeric sequence that charts and reports can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RoadLength,
    FlowRate,
    MaxFlowRate,
    CarDensity,
    NumLanes,
    CurrentLaneBias,
    RandomStopRate,
    Collisions,
    StepsToRun,
    MaxMovement,
    AccelerationRate,
    BreakRate,
    Utilization,
    FlowPerLane,
    FlowPerMovement,
}

impl Field {
    /// Fields copied straight out of result files, in dataset order.
    pub const RAW: [Field; 12] = [
        Field::RoadLength,
        Field::FlowRate,
        Field::MaxFlowRate,
        Field::CarDensity,
        Field::NumLanes,
        Field::CurrentLaneBias,
        Field::RandomStopRate,
        Field::Collisions,
        Field::StepsToRun,
        Field::MaxMovement,
        Field::AccelerationRate,
        Field::BreakRate,
    ];

    /// The snake_case key used in result files and config.
    pub fn key(&self) -> &'static str {
        match self {
            Field::RoadLength => "road_length",
            Field::FlowRate => "flow_rate",
            Field::MaxFlowRate => "max_flow_rate",
            Field::CarDensity => "car_density",
            Field::NumLanes => "num_lanes",
            Field::CurrentLaneBias => "current_lane_bias",
            Field::RandomStopRate => "random_stop_rate",
            Field::Collisions => "collisions",
            Field::StepsToRun => "steps_to_run",
            Field::MaxMovement => "max_movement",
            Field::AccelerationRate => "acceleration_rate",
            Field::BreakRate => "break_rate",
            Field::Utilization => "utilization",
            Field::FlowPerLane => "flow_per_lane",
            Field::FlowPerMovement => "flow_per_movement",
        }
    }

    /// Default axis label.
    pub fn label(&self) -> &'static str {
        match self {
            Field::RoadLength => "Road Length",
            Field::FlowRate => "Flow Rate",
            Field::MaxFlowRate => "Maximum Flow Rate",
            Field::CarDensity => "Vehicle Density",
            Field::NumLanes => "Number of Lanes",
            Field::CurrentLaneBias => "Current Lane Bias",
            Field::RandomStopRate => "Spontaneous Braking Rate",
            Field::Collisions => "Collisions per Step",
            Field::StepsToRun => "Simulation Duration (Steps)",
            Field::MaxMovement => "Maximum Per-Step Movement",
            Field::AccelerationRate => "Acceleration Rate",
            Field::BreakRate => "Deceleration Rate",
            Field::Utilization => "Utilization",
            Field::FlowPerLane => "Flow Rate per Lane",
            Field::FlowPerMovement => "Flow Rate per Velocity",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Aligned per-run sequences built by one load.
///
/// Every sequence has one entry per accepted run and entries at the same
/// position come from the same run. Runs appear in ascending index order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedDataset {
    road_lengths: Vec<f64>,
    flow_rates: Vec<f64>,
    max_flow_rates: Vec<f64>,
    densities: Vec<f64>,
    num_lanes: Vec<f64>,
    biases: Vec<f64>,
    stop_rates: Vec<f64>,
    collisions: Vec<f64>,
    steps: Vec<f64>,
    movement: Vec<f64>,
    acceleration: Vec<f64>,
    braking: Vec<f64>,
    utilizations: Vec<f64>,
}

impl AggregatedDataset {
    /// Append one accepted run.
    pub(crate) fn push_run(&mut self, config: &RunConfig, result: &RunResult) {
        self.road_lengths.push(config.road_length);
        self.flow_rates.push(result.flow_rate);
        self.max_flow_rates.push(result.max_flow_rate);
        self.densities.push(config.car_density);
        self.num_lanes.push(config.num_lanes);
        self.biases.push(config.current_lane_bias);
        self.stop_rates.push(config.random_stop_rate);
        self.collisions.push(result.collisions);
        self.steps.push(config.steps_to_run);
        self.movement.push(config.max_movement);
        self.acceleration.push(config.acceleration_rate);
        self.braking.push(config.break_rate);
    }

    /// Compute derived sequences once all runs are in.
    pub(crate) fn finish(mut self) -> Self {
        self.utilizations = derive::utilization(&self);
        self
    }

    /// Number of accepted runs.
    pub fn len(&self) -> usize {
        self.flow_rates.len()
    }

    /// Whether no run was accepted.
    pub fn is_empty(&self) -> bool {
        self.flow_rates.is_empty()
    }

    pub fn road_lengths(&self) -> &[f64] {
        &self.road_lengths
    }

    pub fn flow_rates(&self) -> &[f64] {
        &self.flow_rates
    }

    pub fn max_flow_rates(&self) -> &[f64] {
        &self.max_flow_rates
    }

    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    pub fn num_lanes(&self) -> &[f64] {
        &self.num_lanes
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn stop_rates(&self) -> &[f64] {
        &self.stop_rates
    }

    pub fn collisions(&self) -> &[f64] {
        &self.collisions
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    pub fn movement(&self) -> &[f64] {
        &self.movement
    }

    pub fn acceleration(&self) -> &[f64] {
        &self.acceleration
    }

    pub fn braking(&self) -> &[f64] {
        &self.braking
    }

    /// `flow_rates / max_flow_rates`, computed at load time.
    pub fn utilizations(&self) -> &[f64] {
        &self.utilizations
    }

    /// Resolve a field to its sequence. Raw fields and utilization are
    /// borrowed; the per-lane and per-movement ratios are computed.
    pub fn series(&self, field: Field) -> Cow<'_, [f64]> {
        match field {
            Field::RoadLength => Cow::Borrowed(&self.road_lengths),
            Field::FlowRate => Cow::Borrowed(&self.flow_rates),
            Field::MaxFlowRate => Cow::Borrowed(&self.max_flow_rates),
            Field::CarDensity => Cow::Borrowed(&self.densities),
            Field::NumLanes => Cow::Borrowed(&self.num_lanes),
            Field::CurrentLaneBias => Cow::Borrowed(&self.biases),
            Field::RandomStopRate => Cow::Borrowed(&self.stop_rates),
            Field::Collisions => Cow::Borrowed(&self.collisions),
            Field::StepsToRun => Cow::Borrowed(&self.steps),
            Field::MaxMovement => Cow::Borrowed(&self.movement),
            Field::AccelerationRate => Cow::Borrowed(&self.acceleration),
            Field::BreakRate => Cow::Borrowed(&self.braking),
            Field::Utilization => Cow::Borrowed(&self.utilizations),
            Field::FlowPerLane => Cow::Owned(derive::flow_per_lane(self)),
            Field::FlowPerMovement => Cow::Owned(derive::flow_per_movement(self)),
        }
    }
}

/// Bookkeeping for one directory load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Directory that was loaded.
    pub directory: PathBuf,
    /// Candidate result files found.
    pub candidates: usize,
    /// Records that made it into the dataset.
    pub accepted: usize,
    /// Records dropped because `result` was not an object.
    pub no_result: usize,
    /// Records dropped because `num_lanes` was zero.
    pub zero_lanes: usize,
    /// Records dropped because `max_flow_rate` was zero.
    pub zero_max_flow: usize,
}

impl LoadSummary {
    /// Creates an empty summary for a directory.
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            ..Default::default()
        }
    }

    /// Count a dropped record.
    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::NoResult => self.no_result += 1,
            DropReason::ZeroLanes => self.zero_lanes += 1,
            DropReason::ZeroMaxFlow => self.zero_max_flow += 1,
        }
    }

    /// Total records dropped for any reason.
    pub fn dropped(&self) -> usize {
        self.no_result + self.zero_lanes + self.zero_max_flow
    }
}

/// Descriptive statistics of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Field key.
    pub field: Field,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    /// Computes statistics over a sequence. Empty sequences yield NaN bounds.
    pub fn from_values(field: Field, values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                field,
                count,
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
            };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;

        Self {
            field,
            count,
            min,
            max,
            mean,
        }
    }
}

/// Summary of a single loaded directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySummary {
    /// Load counts.
    pub load: LoadSummary,
    /// Statistics for the raw fields followed by utilization.
    pub fields: Vec<FieldStats>,
}

impl DirectorySummary {
    /// Builds a summary from a load and its dataset.
    pub fn new(load: LoadSummary, dataset: &AggregatedDataset) -> Self {
        let fields = Field::RAW
            .iter()
            .chain(std::iter::once(&Field::Utilization))
            .map(|&field| FieldStats::from_values(field, &dataset.series(field)))
            .collect();

        Self { load, fields }
    }
}

/// Metadata about a summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of directories summarized.
    pub directories: usize,
    /// Total accepted runs across directories.
    pub total_runs: usize,
    /// Duration of loading in seconds.
    pub duration_seconds: f64,
}

/// The complete summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub directories: Vec<DirectorySummary>,
}
