//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.simreport.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chart::{self, ChartSpec};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".simreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Result file naming.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Chart catalogue.
    #[serde(default = "chart::default_catalogue")]
    pub charts: Vec<ChartSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            loader: LoaderConfig::default(),
            render: RenderConfig::default(),
            charts: chart::default_catalogue(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Root that chart series directories are resolved against.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Where chart images are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            output_dir: default_output_dir(),
            verbose: false,
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./results")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./report")
}

/// Result file naming rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Extension of result files, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Separator between filename prefix and run index.
    #[serde(default = "default_index_separator")]
    pub index_separator: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            index_separator: default_index_separator(),
        }
    }
}

fn default_extension() -> String {
    "json".to_string()
}

fn default_index_separator() -> String {
    "-".to_string()
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Grid points per axis for surface charts.
    #[serde(default = "default_surface_resolution")]
    pub surface_resolution: usize,

    /// Tolerance used when averaging duplicate x values. Zero means exact.
    #[serde(default)]
    pub bucket_tolerance: f64,

    /// Show a progress bar while rendering.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            surface_resolution: default_surface_resolution(),
            bucket_tolerance: 0.0,
            show_progress: true,
        }
    }
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

fn default_surface_resolution() -> usize {
    40
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.loader.extension.is_empty() {
            bail!("loader.extension must not be empty");
        }
        if self.loader.index_separator.is_empty() {
            bail!("loader.index_separator must not be empty");
        }
        if self.render.width == 0 || self.render.height == 0 {
            bail!("render.width and render.height must be positive");
        }
        if self.render.surface_resolution < 2 {
            bail!("render.surface_resolution must be at least 2");
        }
        if self.render.bucket_tolerance.is_nan() || self.render.bucket_tolerance < 0.0 {
            bail!("render.bucket_tolerance must be a non-negative number");
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.charts {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                bail!("duplicate chart name '{}'", spec.name);
            }
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref results) = args.results {
            self.general.results_dir = results.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output_dir = output.clone();
        }

        if args.quiet {
            self.render.show_progress = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Look up charts by name, keeping catalogue order.
    ///
    /// An empty selection means every chart.
    pub fn select_charts(&self, names: &[String]) -> Result<Vec<&ChartSpec>> {
        if names.is_empty() {
            return Ok(self.charts.iter().collect());
        }

        for name in names {
            if !self.charts.iter().any(|c| &c.name == name) {
                let known: Vec<_> = self.charts.iter().map(|c| c.name.as_str()).collect();
                bail!("Unknown chart '{}'. Known charts: {}", name, known.join(", "));
            }
        }

        Ok(self
            .charts
            .iter()
            .filter(|c| names.contains(&c.name))
            .collect())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        let config = Config::default();
        toml::to_string_pretty(&config).context("Failed to serialize default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, Scale};
    use crate::models::Field;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.results_dir, PathBuf::from("./results"));
        assert_eq!(config.loader.extension, "json");
        assert_eq!(config.loader.index_separator, "-");
        assert_eq!(config.render.surface_resolution, 40);
        assert_eq!(config.render.bucket_tolerance, 0.0);
        assert!(config.charts.iter().any(|c| c.name == "road"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
results_dir = "runs"
output_dir = "charts"
verbose = true

[loader]
index_separator = "_"

[render]
width = 800
bucket_tolerance = 0.001

[[charts]]
name = "lanes"
x = "num_lanes"
y = "flow_per_lane"
x_scale = "log"
series = [{ dir = "lanes" }]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.results_dir, PathBuf::from("runs"));
        assert!(config.general.verbose);
        assert_eq!(config.loader.extension, "json");
        assert_eq!(config.loader.index_separator, "_");
        assert_eq!(config.render.width, 800);
        assert_eq!(config.render.height, 768);
        assert_eq!(config.charts.len(), 1);

        let chart = &config.charts[0];
        assert_eq!(chart.kind, ChartKind::Line);
        assert_eq!(chart.x, Field::NumLanes);
        assert_eq!(chart.y, Field::FlowPerLane);
        assert_eq!(chart.x_scale, Scale::Log);
        assert_eq!(chart.y_scale, Scale::Linear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_charts_uses_catalogue() {
        let config: Config = toml::from_str("[general]\nverbose = false\n").unwrap();
        assert_eq!(config.charts.len(), chart::default_catalogue().len());
    }

    #[test]
    fn test_validate_rejects_empty_separator() {
        let mut config = Config::default();
        config.loader.index_separator = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_chart_names() {
        let mut config = Config::default();
        let first = config.charts[0].clone();
        config.charts.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_select_charts() {
        let config = Config::default();

        let all = config.select_charts(&[]).unwrap();
        assert_eq!(all.len(), config.charts.len());

        let picked = config
            .select_charts(&["lanes".to_string(), "road".to_string()])
            .unwrap();
        let names: Vec<_> = picked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["road", "lanes"]);

        assert!(config.select_charts(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml().unwrap();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[loader]"));
        assert!(toml_str.contains("[[charts]]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.charts.len(), Config::default().charts.len());
    }

    #[test]
    fn test_default_toml_round_trips_catalogue() {
        let toml_str = Config::default_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.charts, Config::default().charts);
        assert_eq!(parsed.render.surface_resolution, 40);
    }
}
