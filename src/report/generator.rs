//! Summary report generation.
//!
//! Renders the load counts and per-field statistics of one or more results
//! directories as Markdown or JSON.

use crate::models::{DirectorySummary, FieldStats, LoadSummary, Report, ReportMetadata};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Simulation Results Summary\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    output.push_str(&generate_overview_section(&report.directories));

    for dir in &report.directories {
        output.push_str(&generate_directory_section(dir));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Directories:** {}\n", metadata.directories));
    section.push_str(&format!("- **Accepted Runs:** {}\n", metadata.total_runs));
    section.push_str(&format!(
        "- **Load Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the per-directory load count table.
fn generate_overview_section(dirs: &[DirectorySummary]) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");

    if dirs.is_empty() {
        section.push_str("No directories were loaded.\n\n");
        return section;
    }

    section.push_str("| Directory | Files | Accepted | No Result | Zero Lanes | Zero Max Flow |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");
    for dir in dirs {
        section.push_str(&load_row(&dir.load));
    }
    section.push('\n');

    section
}

fn load_row(load: &LoadSummary) -> String {
    format!(
        "| `{}` | {} | {} | {} | {} | {} |\n",
        load.directory.display(),
        load.candidates,
        load.accepted,
        load.no_result,
        load.zero_lanes,
        load.zero_max_flow
    )
}

/// Generate the statistics section for one directory.
fn generate_directory_section(dir: &DirectorySummary) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", dir.load.directory.display()));

    if dir.load.accepted == 0 {
        section.push_str("No runs were accepted from this directory.\n\n");
        return section;
    }

    section.push_str("| Field | Count | Min | Max | Mean |\n");
    section.push_str("|:---|:---:|---:|---:|---:|\n");
    for stats in &dir.fields {
        section.push_str(&stats_row(stats));
    }
    section.push('\n');

    section
}

fn stats_row(stats: &FieldStats) -> String {
    format!(
        "| {} | {} | {} | {} | {} |\n",
        stats.field.label(),
        stats.count,
        format_value(stats.min),
        format_value(stats.max),
        format_value(stats.mean)
    )
}

/// Format a statistic compactly; tiny rates such as stop probabilities
/// switch to scientific notation.
fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value != 0.0 && value.abs() < 1e-3 {
        format!("{value:.3e}")
    } else {
        format!("{value:.4}")
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by simreport*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use chrono::Utc;
    use std::path::PathBuf;

    fn create_test_report() -> Report {
        let load = LoadSummary {
            directory: PathBuf::from("results/road"),
            candidates: 5,
            accepted: 3,
            no_result: 1,
            zero_lanes: 1,
            zero_max_flow: 0,
        };

        Report {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                directories: 1,
                total_runs: 3,
                duration_seconds: 0.5,
            },
            directories: vec![DirectorySummary {
                load,
                fields: vec![
                    FieldStats::from_values(Field::FlowRate, &[1.0, 2.0, 3.0]),
                    FieldStats::from_values(Field::RandomStopRate, &[0.0001, 0.0002, 0.0004]),
                ],
            }],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Simulation Results Summary"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("| `results/road` | 5 | 3 | 1 | 1 | 0 |"));
        assert!(markdown.contains("| Flow Rate | 3 | 1.0000 | 3.0000 | 2.0000 |"));
        assert!(markdown.contains("Spontaneous Braking Rate"));
        assert!(markdown.contains("1.000e-4"));
    }

    #[test]
    fn test_empty_directory_section() {
        let mut report = create_test_report();
        report.directories[0].load.accepted = 0;

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("No runs were accepted"));
    }

    #[test]
    fn test_no_directories() {
        let mut report = create_test_report();
        report.directories.clear();

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("No directories were loaded."));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0.0000");
        assert_eq!(format_value(12.5), "12.5000");
        assert_eq!(format_value(0.00005), "5.000e-5");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"zero_lanes\": 1"));
        assert!(json.contains("\"field\": \"flow_rate\""));
    }
}
