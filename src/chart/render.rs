//! Chart rendering.
//!
//! Loads every series of a chart, turns the requested fields into points
//! and draws them to an SVG file with plotters.

use anyhow::{Context, Result};
use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::interpolate::{finite_range, Grid, InverseDistance, Interpolator, ScatterPoint};
use super::{ChartKind, ChartSpec, Scale};
use crate::analysis::{bucket_average_with_tolerance, ResultAggregator};
use crate::config::RenderConfig;
use crate::models::AggregatedDataset;

const FONT: &str = "sans-serif";

/// Points of one series ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
}

/// Renders charts from results directories.
pub struct ChartRenderer {
    aggregator: ResultAggregator,
    results_dir: PathBuf,
    output_dir: PathBuf,
    render: RenderConfig,
    interpolator: Box<dyn Interpolator>,
}

impl ChartRenderer {
    /// Create a renderer using inverse-distance weighting for surfaces.
    pub fn new(
        aggregator: ResultAggregator,
        results_dir: PathBuf,
        output_dir: PathBuf,
        render: RenderConfig,
    ) -> Self {
        Self {
            aggregator,
            results_dir,
            output_dir,
            render,
            interpolator: Box::new(InverseDistance::default()),
        }
    }

    /// Swap the surface interpolator.
    pub fn with_interpolator(mut self, interpolator: Box<dyn Interpolator>) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Load all series of a chart.
    ///
    /// Nothing is drawn unless every series loads.
    pub fn load_series(&self, spec: &ChartSpec) -> Result<Vec<(Option<String>, AggregatedDataset)>> {
        spec.series
            .iter()
            .map(|series| {
                let dir = series.resolve(&self.results_dir);
                let dataset = self.aggregator.load(&dir).with_context(|| {
                    format!(
                        "Failed to load series '{}' of chart '{}'",
                        dir.display(),
                        spec.name
                    )
                })?;
                Ok((series.label.clone(), dataset))
            })
            .collect()
    }

    /// Render one chart. Returns the written file, or `None` when no series
    /// had a plottable point.
    pub fn render(&self, spec: &ChartSpec) -> Result<Option<PathBuf>> {
        spec.validate()?;
        let datasets = self.load_series(spec)?;

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.output_dir.display()
            )
        })?;
        let path = self.output_dir.join(spec.file_name());

        let written = match spec.kind {
            ChartKind::Line => {
                let series = line_series(spec, &datasets, self.render.bucket_tolerance)?;
                self.draw_line_chart(spec, &series, &path)?
            }
            ChartKind::Surface => {
                let points = surface_points(spec, &datasets);
                self.draw_surface_chart(spec, &points, &path)?
            }
        };

        if written {
            info!("Wrote chart {}", path.display());
            Ok(Some(path))
        } else {
            warn!("Chart '{}' has no plottable points, skipping", spec.name);
            Ok(None)
        }
    }

    fn draw_line_chart(&self, spec: &ChartSpec, series: &[PlotSeries], path: &Path) -> Result<bool> {
        let all_points = || series.iter().flat_map(|s| s.points.iter());
        let Some(x_range) = finite_range(all_points().map(|p| p.0)) else {
            return Ok(false);
        };
        let Some(y_range) = finite_range(all_points().map(|p| p.1)) else {
            return Ok(false);
        };
        let (x_lo, x_hi) = pad(x_range, spec.x_scale);
        let (y_lo, y_hi) = pad(y_range, spec.y_scale);

        let root = SVGBackend::new(path, (self.render.width, self.render.height)).into_drawing_area();
        root.fill(&WHITE)?;

        match (spec.x_scale, spec.y_scale) {
            (Scale::Linear, Scale::Linear) => {
                draw_lines(&root, spec, x_lo..x_hi, y_lo..y_hi, series)?
            }
            (Scale::Log, Scale::Linear) => {
                draw_lines(&root, spec, (x_lo..x_hi).log_scale(), y_lo..y_hi, series)?
            }
            (Scale::Linear, Scale::Log) => {
                draw_lines(&root, spec, x_lo..x_hi, (y_lo..y_hi).log_scale(), series)?
            }
            (Scale::Log, Scale::Log) => draw_lines(
                &root,
                spec,
                (x_lo..x_hi).log_scale(),
                (y_lo..y_hi).log_scale(),
                series,
            )?,
        }

        root.present()
            .with_context(|| format!("Failed to write chart {}", path.display()))?;
        Ok(true)
    }

    fn draw_surface_chart(&self, spec: &ChartSpec, points: &[ScatterPoint], path: &Path) -> Result<bool> {
        let Some(grid) = self
            .interpolator
            .interpolate(points, self.render.surface_resolution)
        else {
            return Ok(false);
        };
        debug!(
            "Interpolated {} samples onto a {}x{} grid",
            points.len(),
            grid.xs.len(),
            grid.ys.len()
        );

        let Some(x_range) = finite_range(grid.xs.iter().copied()) else {
            return Ok(false);
        };
        let Some(y_range) = finite_range(grid.ys.iter().copied()) else {
            return Ok(false);
        };
        let Some(z_range) = finite_range(
            grid.values
                .iter()
                .copied()
                .chain(points.iter().map(|p| p.z)),
        ) else {
            return Ok(false);
        };
        let (x_lo, x_hi) = pad(x_range, Scale::Linear);
        let (y_lo, y_hi) = pad(y_range, Scale::Linear);
        let (z_lo, z_hi) = pad(z_range, Scale::Linear);

        let root = SVGBackend::new(path, (self.render.width, self.render.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let caption = if spec.title().is_empty() {
            format!("{} vs {} and {}", spec.z_label(), spec.x_label(), spec.y_label())
        } else {
            spec.title().to_string()
        };

        // Plotters' vertical axis is y, so the surface height goes there.
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, (FONT, 24))
            .margin(20)
            .build_cartesian_3d(x_lo..x_hi, z_lo..z_hi, y_lo..y_hi)?;

        chart.with_projection(|mut pb| {
            pb.yaw = 0.5;
            pb.scale = 0.9;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()?;

        chart.draw_series(
            SurfaceSeries::xoz(grid.xs.iter().copied(), grid.ys.iter().copied(), |x, y| {
                surface_height(&grid, x, y)
            })
            .style(BLUE.mix(0.4).filled()),
        )?;

        chart.draw_series(
            points
                .iter()
                .filter(|p| p.z.is_finite())
                .map(|p| Circle::new((p.x, p.z, p.y), 3, RED.filled())),
        )?;

        root.present()
            .with_context(|| format!("Failed to write chart {}", path.display()))?;
        Ok(true)
    }
}

fn surface_height(grid: &Grid, x: f64, y: f64) -> f64 {
    grid.value_at(x, y).unwrap_or(f64::NAN)
}

fn draw_lines<X, Y>(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    spec: &ChartSpec,
    x_range: X,
    y_range: Y,
    series: &[PlotSeries],
) -> Result<()>
where
    X: AsRangedCoord<Value = f64>,
    Y: AsRangedCoord<Value = f64>,
    X::CoordDescType: ValueFormatter<f64>,
    Y::CoordDescType: ValueFormatter<f64>,
{
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70);
    if !spec.title().is_empty() {
        builder.caption(spec.title(), (FONT, 24));
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label())
        .y_desc(spec.y_label())
        .axis_desc_style((FONT, 18))
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let drawn = chart.draw_series(LineSeries::new(
            s.points.iter().copied(),
            color.stroke_width(2),
        ))?;
        if let Some(label) = &s.label {
            drawn
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
    }

    if series.iter().any(|s| s.label.is_some()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 16))
            .draw()?;
    }

    Ok(())
}

/// Build the points of each line series.
///
/// Non-finite points are dropped, as are non-positive values on a log axis.
pub fn line_series(
    spec: &ChartSpec,
    datasets: &[(Option<String>, AggregatedDataset)],
    tolerance: f64,
) -> Result<Vec<PlotSeries>> {
    let mut out = Vec::with_capacity(datasets.len());

    for (label, ds) in datasets {
        let xs = ds.series(spec.x);
        let ys = ds.series(spec.y);

        let (xs, ys) = if spec.average_duplicates {
            bucket_average_with_tolerance(&xs, &ys, tolerance)
                .with_context(|| format!("Failed to average chart '{}'", spec.name))?
        } else {
            (xs.into_owned(), ys.into_owned())
        };

        let total = xs.len();
        let points: Vec<(f64, f64)> = xs
            .into_iter()
            .zip(ys)
            .filter(|&(x, y)| plottable(x, spec.x_scale) && plottable(y, spec.y_scale))
            .collect();

        if points.len() < total {
            warn!(
                "Chart '{}': dropped {} of {} points that cannot be plotted",
                spec.name,
                total - points.len(),
                total
            );
        }

        out.push(PlotSeries {
            label: label.clone(),
            points,
        });
    }

    Ok(out)
}

/// Scatter samples for a surface chart, taken from the first series.
pub fn surface_points(
    spec: &ChartSpec,
    datasets: &[(Option<String>, AggregatedDataset)],
) -> Vec<ScatterPoint> {
    let (Some(z_field), Some((_, ds))) = (spec.z, datasets.first()) else {
        return Vec::new();
    };
    if datasets.len() > 1 {
        warn!(
            "Surface chart '{}' only uses its first series; {} ignored",
            spec.name,
            datasets.len() - 1
        );
    }

    let xs = ds.series(spec.x);
    let ys = ds.series(spec.y);
    let zs = ds.series(z_field);

    xs.iter()
        .zip(ys.iter())
        .zip(zs.iter())
        .map(|((&x, &y), &z)| ScatterPoint { x, y, z })
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        .collect()
}

fn plottable(value: f64, scale: Scale) -> bool {
    match scale {
        Scale::Linear => value.is_finite(),
        Scale::Log => value.is_finite() && value > 0.0,
    }
}

/// Widen a degenerate range so the axis has some extent.
fn pad((lo, hi): (f64, f64), scale: Scale) -> (f64, f64) {
    if hi > lo {
        return (lo, hi);
    }
    match scale {
        Scale::Log => (lo / 2.0, hi * 2.0),
        Scale::Linear if lo == 0.0 => (-1.0, 1.0),
        Scale::Linear => {
            let delta = lo.abs() * 0.1;
            (lo - delta, hi + delta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{default_catalogue, SeriesSpec};
    use crate::models::Field;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_run(dir: &Path, index: usize, density: f64, bias: f64, flow: f64) {
        let value = json!({
            "config": {
                "road_length": 200.0,
                "car_density": density,
                "num_lanes": 2,
                "current_lane_bias": bias,
                "random_stop_rate": 0.0001,
                "steps_to_run": 100,
                "max_movement": 0.2,
                "acceleration_rate": 0.001,
                "break_rate": 0.01
            },
            "result": { "flow_rate": flow, "max_flow_rate": 1.0, "collisions": 0 }
        });
        std::fs::write(dir.join(format!("sim-{index}.json")), value.to_string()).unwrap();
    }

    fn renderer(results: &Path, output: &Path) -> ChartRenderer {
        let render = RenderConfig {
            width: 400,
            height: 300,
            surface_resolution: 5,
            ..RenderConfig::default()
        };
        ChartRenderer::new(
            ResultAggregator::default(),
            results.to_path_buf(),
            output.to_path_buf(),
            render,
        )
    }

    fn chart(name: &str, kind: ChartKind, dirs: &[&str]) -> ChartSpec {
        ChartSpec {
            name: name.to_string(),
            kind,
            x: Field::CarDensity,
            y: if kind == ChartKind::Surface {
                Field::CurrentLaneBias
            } else {
                Field::FlowRate
            },
            z: (kind == ChartKind::Surface).then_some(Field::Utilization),
            x_scale: Scale::Linear,
            y_scale: Scale::Linear,
            title: None,
            x_label: None,
            y_label: None,
            z_label: None,
            average_duplicates: false,
            series: dirs
                .iter()
                .map(|d| SeriesSpec {
                    label: Some(d.to_string()),
                    dir: PathBuf::from(d),
                })
                .collect(),
        }
    }

    #[test]
    fn test_render_line_chart() {
        let results = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let a = results.path().join("a");
        std::fs::create_dir(&a).unwrap();
        for i in 0..4 {
            write_run(&a, i, 0.05 * (i + 1) as f64, 0.1, 0.2 * i as f64);
        }

        let written = renderer(results.path(), output.path())
            .render(&chart("density", ChartKind::Line, &["a"]))
            .unwrap()
            .unwrap();

        assert_eq!(written, output.path().join("density.svg"));
        let svg = std::fs::read_to_string(&written).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Vehicle Density"));
    }

    #[test]
    fn test_render_surface_chart() {
        let results = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let dir = results.path().join("grid");
        std::fs::create_dir(&dir).unwrap();
        let mut index = 0;
        for d in [0.05, 0.1, 0.15] {
            for b in [0.0, 0.5, 1.0] {
                write_run(&dir, index, d, b, d + b / 10.0);
                index += 1;
            }
        }

        let written = renderer(results.path(), output.path())
            .render(&chart("surface", ChartKind::Surface, &["grid"]))
            .unwrap();

        assert!(written.is_some());
        assert!(output.path().join("surface.svg").exists());
    }

    #[test]
    fn test_render_missing_series_writes_nothing() {
        let results = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let a = results.path().join("a");
        std::fs::create_dir(&a).unwrap();
        write_run(&a, 0, 0.1, 0.1, 0.5);

        let err = renderer(results.path(), output.path())
            .render(&chart("partial", ChartKind::Line, &["a", "missing"]))
            .unwrap_err();

        assert!(format!("{err:#}").contains("missing"));
        assert!(!output.path().join("partial.svg").exists());
    }

    #[test]
    fn test_render_empty_series_is_skipped() {
        let results = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::create_dir(results.path().join("empty")).unwrap();

        let written = renderer(results.path(), output.path())
            .render(&chart("empty", ChartKind::Line, &["empty"]))
            .unwrap();

        assert!(written.is_none());
    }

    #[test]
    fn test_line_series_averages_duplicates() {
        let results = TempDir::new().unwrap();
        let a = results.path().join("a");
        std::fs::create_dir(&a).unwrap();
        write_run(&a, 0, 0.1, 0.0, 1.0);
        write_run(&a, 1, 0.1, 0.0, 3.0);
        write_run(&a, 2, 0.2, 0.0, 5.0);

        let mut spec = chart("avg", ChartKind::Line, &["a"]);
        spec.average_duplicates = true;

        let r = renderer(results.path(), results.path());
        let datasets = r.load_series(&spec).unwrap();
        let series = line_series(&spec, &datasets, 0.0).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![(0.1, 2.0), (0.2, 5.0)]);
        assert_eq!(series[0].label.as_deref(), Some("a"));
    }

    #[test]
    fn test_line_series_log_axis_drops_non_positive() {
        let results = TempDir::new().unwrap();
        let a = results.path().join("a");
        std::fs::create_dir(&a).unwrap();
        write_run(&a, 0, 0.1, 0.0, 0.0);
        write_run(&a, 1, 0.2, 0.0, 2.0);

        let mut spec = chart("log", ChartKind::Line, &["a"]);
        spec.y_scale = Scale::Log;

        let r = renderer(results.path(), results.path());
        let datasets = r.load_series(&spec).unwrap();
        let series = line_series(&spec, &datasets, 0.0).unwrap();

        assert_eq!(series[0].points, vec![(0.2, 2.0)]);
    }

    #[test]
    fn test_surface_points_use_first_series() {
        let results = TempDir::new().unwrap();
        for name in ["a", "b"] {
            let dir = results.path().join(name);
            std::fs::create_dir(&dir).unwrap();
            write_run(&dir, 0, 0.1, 0.3, 0.5);
        }
        let spec = chart("s", ChartKind::Surface, &["a", "b"]);
        let r = renderer(results.path(), results.path());
        let datasets = r.load_series(&spec).unwrap();

        let points = surface_points(&spec, &datasets);
        assert_eq!(
            points,
            vec![ScatterPoint {
                x: 0.1,
                y: 0.3,
                z: 0.5
            }]
        );
    }

    #[test]
    fn test_pad_degenerate_ranges() {
        assert_eq!(pad((1.0, 2.0), Scale::Linear), (1.0, 2.0));
        assert_eq!(pad((0.0, 0.0), Scale::Linear), (-1.0, 1.0));
        assert_eq!(pad((10.0, 10.0), Scale::Linear), (9.0, 11.0));
        assert_eq!(pad((4.0, 4.0), Scale::Log), (2.0, 8.0));
    }

    #[test]
    fn test_default_catalogue_renders_against_missing_root() {
        let results = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let r = renderer(results.path(), output.path());

        let road = default_catalogue()
            .into_iter()
            .find(|c| c.name == "road")
            .unwrap();
        assert!(r.render(&road).is_err());
    }
}
