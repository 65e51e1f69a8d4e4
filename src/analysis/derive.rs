//! Derived quantities over an aggregated dataset.
//!
//! Everything here is a pure function of its inputs. Divisions are not
//! guarded beyond the zero checks applied at load time, so NaN and infinity
//! pass through unchanged.

use crate::error::{AggregateError, Result};
use crate::models::AggregatedDataset;

/// `flow_rate / max_flow_rate` per run.
pub fn utilization(ds: &AggregatedDataset) -> Vec<f64> {
    ratio(ds.flow_rates(), ds.max_flow_rates())
}

/// `flow_rate / num_lanes` per run.
pub fn flow_per_lane(ds: &AggregatedDataset) -> Vec<f64> {
    ratio(ds.flow_rates(), ds.num_lanes())
}

/// `flow_rate / max_movement` per run.
pub fn flow_per_movement(ds: &AggregatedDataset) -> Vec<f64> {
    ratio(ds.flow_rates(), ds.movement())
}

fn ratio(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| n / d)
        .collect()
}

/// Average `y` over runs sharing exactly the same `x`.
///
/// Returns the distinct `x` values in ascending order together with the
/// mean `y` of each. Values that differ only in their last bits land in
/// separate buckets; use [`bucket_average_with_tolerance`] to merge them.
pub fn bucket_average(x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    bucket_average_with_tolerance(x, y, 0.0)
}

/// Like [`bucket_average`], but an `x` within `tolerance` of a bucket's
/// smallest member joins that bucket. The bucket keeps that smallest `x`.
///
/// NaN `x` values, whatever their sign bit, sort last and share a single
/// bucket.
pub fn bucket_average_with_tolerance(
    x: &[f64],
    y: &[f64],
    tolerance: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(AggregateError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }

    // `total_cmp` puts sign-negative NaN (as produced by 0.0 / 0.0) first.
    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .map(|&xv| if xv.is_nan() { f64::NAN } else { xv })
        .zip(y.iter().copied())
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut unique_x: Vec<f64> = Vec::new();
    let mut averaged_y: Vec<f64> = Vec::new();
    let mut count = 0usize;

    for (xv, yv) in pairs {
        let joins = unique_x.last().is_some_and(|&anchor| same_bucket(anchor, xv, tolerance));

        if joins {
            if let Some(sum) = averaged_y.last_mut() {
                *sum += yv;
            }
            count += 1;
        } else {
            close_bucket(&mut averaged_y, count);
            unique_x.push(xv);
            averaged_y.push(yv);
            count = 1;
        }
    }
    close_bucket(&mut averaged_y, count);

    Ok((unique_x, averaged_y))
}

fn same_bucket(anchor: f64, value: f64, tolerance: f64) -> bool {
    if anchor.is_nan() || value.is_nan() {
        return anchor.is_nan() && value.is_nan();
    }
    anchor == value || (value - anchor).abs() <= tolerance
}

/// Turn the running sum of the last bucket into its mean.
fn close_bucket(sums: &mut [f64], count: usize) {
    if count > 0 {
        if let Some(last) = sums.last_mut() {
            *last /= count as f64;
        }
    }
}
