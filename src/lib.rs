//! Aggregation and charting of traffic-simulation results.
//!
//! Each simulation run writes `<prefix>-<index>.json` into a results
//! directory. `analysis` turns one directory into an [`AggregatedDataset`],
//! `chart` renders configured charts from several directories and `report`
//! summarizes them.
//!
//! [`AggregatedDataset`]: models::AggregatedDataset

pub mod analysis;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod scanner;
