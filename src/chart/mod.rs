//! Chart catalogue.
//!
//! A chart names the fields it plots and the result directories that feed
//! it. Rendering lives in `render`; the surface grid comes from
//! `interpolate`.

pub mod interpolate;
pub mod render;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Field;

pub use render::ChartRenderer;

/// How a chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// One line per series, `y` against `x`.
    #[default]
    Line,
    /// Interpolated 3D surface of `z` over `x` and `y`, first series only.
    Surface,
}

/// Axis scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

/// One results directory plotted on a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Legend label; unlabelled series get no legend entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Directory, relative to the results root unless absolute.
    pub dir: PathBuf,
}

impl SeriesSpec {
    /// Resolve the series directory against the results root.
    pub fn resolve(&self, results_dir: &Path) -> PathBuf {
        results_dir.join(&self.dir)
    }
}

/// A chart definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Output file stem.
    pub name: String,

    #[serde(default)]
    pub kind: ChartKind,

    pub x: Field,
    pub y: Field,

    /// Height of the surface; required for surface charts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Field>,

    #[serde(default)]
    pub x_scale: Scale,

    #[serde(default)]
    pub y_scale: Scale,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_label: Option<String>,

    /// Collapse runs sharing an `x` value into their mean `y`.
    #[serde(default)]
    pub average_duplicates: bool,

    pub series: Vec<SeriesSpec>,
}

impl ChartSpec {
    /// Reject definitions that could never render.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("chart name must not be empty");
        }
        if self.name.contains(['/', '\\']) {
            bail!("chart '{}': name must not contain path separators", self.name);
        }
        if self.series.is_empty() {
            bail!("chart '{}' has no series", self.name);
        }
        if self.kind == ChartKind::Surface && self.z.is_none() {
            bail!("surface chart '{}' needs a 'z' field", self.name);
        }
        Ok(())
    }

    pub fn x_label(&self) -> &str {
        self.x_label.as_deref().unwrap_or(self.x.label())
    }

    pub fn y_label(&self) -> &str {
        self.y_label.as_deref().unwrap_or(self.y.label())
    }

    pub fn z_label(&self) -> &str {
        match (&self.z_label, self.z) {
            (Some(label), _) => label.as_str(),
            (None, Some(z)) => z.label(),
            (None, None) => "",
        }
    }

    /// Title shown above the chart; empty means no caption.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Output file name.
    pub fn file_name(&self) -> String {
        format!("{}.svg", self.name)
    }
}

fn series(entries: &[(&str, &str)]) -> Vec<SeriesSpec> {
    entries
        .iter()
        .map(|(dir, label)| SeriesSpec {
            label: (!label.is_empty()).then(|| label.to_string()),
            dir: PathBuf::from(dir),
        })
        .collect()
}

fn line(name: &str, x: Field, y: Field, x_scale: Scale, entries: &[(&str, &str)]) -> ChartSpec {
    ChartSpec {
        name: name.to_string(),
        kind: ChartKind::Line,
        x,
        y,
        z: None,
        x_scale,
        y_scale: Scale::Linear,
        title: None,
        x_label: None,
        y_label: None,
        z_label: None,
        average_duplicates: false,
        series: series(entries),
    }
}

/// Compare the lane-changing strategies over one input, reading
/// `<prefix>-bd`, `<prefix>-fl`, `<prefix>-bl` and optionally `<prefix>-no`.
fn methods(name: &str, prefix: &str, x: Field, with_baseline: bool) -> ChartSpec {
    let dirs: Vec<(String, &str)> = [
        ("no", "No Lane Changing"),
        ("bd", "Bi-directional"),
        ("fl", "Forward-looking"),
        ("bl", "Backward-looking"),
    ]
    .into_iter()
    .filter(|(suffix, _)| with_baseline || *suffix != "no")
    .map(|(suffix, label)| (format!("{prefix}-{suffix}"), label))
    .collect();

    let entries: Vec<(&str, &str)> = dirs.iter().map(|(d, l)| (d.as_str(), *l)).collect();
    line(name, x, Field::FlowRate, Scale::Linear, &entries)
}

/// Charts produced for the lane-changing study when no catalogue is
/// configured.
pub fn default_catalogue() -> Vec<ChartSpec> {
    let mut charts = vec![
        line("road", Field::RoadLength, Field::FlowRate, Scale::Log, &[("road", "")]),
        line("lanes", Field::NumLanes, Field::FlowPerLane, Scale::Log, &[("lanes", "")]),
        line("steps", Field::StepsToRun, Field::FlowRate, Scale::Log, &[("steps", "")]),
        line(
            "step_movement",
            Field::MaxMovement,
            Field::FlowPerMovement,
            Scale::Log,
            &[("movement", "")],
        ),
        ChartSpec {
            kind: ChartKind::Surface,
            z: Some(Field::Utilization),
            ..line(
                "density_bias_3d",
                Field::CarDensity,
                Field::CurrentLaneBias,
                Scale::Linear,
                &[("density_bias_smaller", "")],
            )
        },
        line(
            "bias",
            Field::CurrentLaneBias,
            Field::Utilization,
            Scale::Linear,
            &[
                ("bias-d-0.025", "Density = 0.025"),
                ("bias-d-0.05", "Density = 0.05"),
                ("bias-d-0.1", "Density = 0.1"),
                ("bias-d-0.2", "Density = 0.2"),
            ],
        ),
        line(
            "stop_bias",
            Field::CurrentLaneBias,
            Field::FlowRate,
            Scale::Linear,
            &[
                ("bias-sr-0.00005", "Stop Rate = 0.00005"),
                ("bias-sr-0.0001", "Stop Rate = 0.0001"),
                ("bias-sr-0.0002", "Stop Rate = 0.0002"),
                ("bias-sr-0.0004", "Stop Rate = 0.0004"),
                ("bias-sr-0.0008", "Stop Rate = 0.0008"),
                ("bias-sr-0.0016", "Stop Rate = 0.0016"),
            ],
        ),
    ];

    charts.push(methods("methods-stop", "stop", Field::RandomStopRate, true));
    charts.push(methods("methods-bias", "bias", Field::CurrentLaneBias, false));
    charts.push(methods("methods-density", "density", Field::CarDensity, true));
    charts.push(methods(
        "methods-acceleration",
        "acceleration",
        Field::AccelerationRate,
        true,
    ));
    charts.push(methods("methods-braking", "braking", Field::BreakRate, true));

    charts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue_is_valid() {
        let charts = default_catalogue();
        assert_eq!(charts.len(), 12);
        for chart in &charts {
            assert!(chart.validate().is_ok(), "{}", chart.name);
        }
    }

    #[test]
    fn test_default_catalogue_surface() {
        let charts = default_catalogue();
        let surface = charts.iter().find(|c| c.name == "density_bias_3d").unwrap();

        assert_eq!(surface.kind, ChartKind::Surface);
        assert_eq!(surface.x, Field::CarDensity);
        assert_eq!(surface.y, Field::CurrentLaneBias);
        assert_eq!(surface.z, Some(Field::Utilization));
        assert_eq!(surface.z_label(), "Utilization");
    }

    #[test]
    fn test_methods_series() {
        let charts = default_catalogue();
        let bias = charts.iter().find(|c| c.name == "methods-bias").unwrap();
        let dirs: Vec<_> = bias.series.iter().map(|s| s.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("bias-bd"),
                PathBuf::from("bias-fl"),
                PathBuf::from("bias-bl")
            ]
        );

        let density = charts.iter().find(|c| c.name == "methods-density").unwrap();
        assert_eq!(density.series.len(), 4);
        assert_eq!(density.series[0].label.as_deref(), Some("No Lane Changing"));
    }

    #[test]
    fn test_labels_fall_back_to_field() {
        let mut chart = line("lanes", Field::NumLanes, Field::FlowPerLane, Scale::Log, &[("lanes", "")]);
        assert_eq!(chart.x_label(), "Number of Lanes");
        assert_eq!(chart.y_label(), "Flow Rate per Lane");
        assert_eq!(chart.series[0].label, None);

        chart.y_label = Some("Per-lane flow".to_string());
        assert_eq!(chart.y_label(), "Per-lane flow");
    }

    #[test]
    fn test_validate_surface_needs_z() {
        let mut chart = default_catalogue()
            .into_iter()
            .find(|c| c.kind == ChartKind::Surface)
            .unwrap();
        chart.z = None;
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_path_in_name() {
        let chart = line("../evil", Field::RoadLength, Field::FlowRate, Scale::Linear, &[("road", "")]);
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_series_resolve() {
        let spec = SeriesSpec {
            label: None,
            dir: PathBuf::from("road"),
        };
        assert_eq!(
            spec.resolve(Path::new("results")),
            PathBuf::from("results").join("road")
        );
    }
}
