//! Scatter-to-grid interpolation for surface charts.

/// A measured `z` at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Regular grid of interpolated values.
///
/// `values` is row-major: row `j` holds the values at `ys[j]` for every
/// entry of `xs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub values: Vec<f64>,
}

impl Grid {
    /// Value at grid column `i`, row `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.xs.len() || j >= self.ys.len() {
            return None;
        }
        self.values.get(j * self.xs.len() + i).copied()
    }

    /// Value at a grid coordinate pair taken from `xs` and `ys`.
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let i = self.xs.iter().position(|&v| v == x)?;
        let j = self.ys.iter().position(|&v| v == y)?;
        self.get(i, j)
    }

    /// Finite `(min, max)` of the grid values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        finite_range(self.values.iter().copied())
    }
}

/// Turns scattered samples into a regular grid.
pub trait Interpolator {
    /// Interpolate `samples` onto a `resolution × resolution` grid spanning
    /// their bounding box. Returns `None` when there are no samples.
    fn interpolate(&self, samples: &[ScatterPoint], resolution: usize) -> Option<Grid>;
}

/// Inverse-distance weighting (Shepard's method).
///
/// Distances are measured after scaling each axis to its sample range, so
/// inputs of very different magnitude weigh equally. A grid point that
/// coincides with a sample takes that sample's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseDistance {
    pub power: f64,
}

impl Default for InverseDistance {
    fn default() -> Self {
        Self { power: 2.0 }
    }
}

impl InverseDistance {
    fn estimate(&self, samples: &[ScatterPoint], x: f64, y: f64, x_span: f64, y_span: f64) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;

        for s in samples {
            let dx = (s.x - x) / x_span;
            let dy = (s.y - y) / y_span;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < 1e-12 {
                return s.z;
            }
            let w = dist.powf(-self.power);
            weighted += w * s.z;
            total += w;
        }

        weighted / total
    }
}

impl Interpolator for InverseDistance {
    fn interpolate(&self, samples: &[ScatterPoint], resolution: usize) -> Option<Grid> {
        let (x_lo, x_hi) = finite_range(samples.iter().map(|s| s.x))?;
        let (y_lo, y_hi) = finite_range(samples.iter().map(|s| s.y))?;

        let xs = linspace(x_lo, x_hi, resolution);
        let ys = linspace(y_lo, y_hi, resolution);
        let x_span = span(x_lo, x_hi);
        let y_span = span(y_lo, y_hi);

        let mut values = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                values.push(self.estimate(samples, x, y, x_span, y_span));
            }
        }

        Some(Grid { xs, ys, values })
    }
}

fn span(lo: f64, hi: f64) -> f64 {
    if hi > lo {
        hi - lo
    } else {
        1.0
    }
}

/// `num_points` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, num_points: usize) -> Vec<f64> {
    match num_points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Smallest and largest finite value, if any.
pub fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
