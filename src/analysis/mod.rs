//! Analysis modules.
//!
//! Loading and validation live in `aggregator`; `derive` holds the pure
//! helpers computed from a loaded dataset.

pub mod aggregator;
pub mod derive;

pub use aggregator::{load, ResultAggregator};
pub use derive::{
    bucket_average, bucket_average_with_tolerance, flow_per_lane, flow_per_movement, utilization,
};
