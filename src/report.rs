//! Reporting of a finished metric run
//!
//! Results leave the crate in three forms: a text table for the terminal, a JSON
//! document with every outcome and failure, and the Taylor-diagram samples a plotting
//! tool needs.

use crate::errors::Result;
use crate::orchestrator::{MetricTable, PairOutcome, StageFailure};
use crate::parameters::ClimateParameter;
use crate::statistics::operations::SkillMetric;
use chrono::Utc;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Formats one metric cell: `FAILED` when its stage failed, `undefined` when no
/// valid point took part.
#[must_use]
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        None => "FAILED".to_string(),
        Some(v) if v.is_nan() => "undefined".to_string(),
        Some(v) => format!("{v:.3}"),
    }
}

/// Renders the per-dataset result tables followed by the list of failures.
#[must_use]
pub fn render_table(table: &MetricTable) -> String {
    let mut out = String::new();

    for dataset in table.datasets() {
        let _ = writeln!(
            out,
            "\n===== {} vs {} ({} mode, KGE floor {}) =====",
            dataset, table.reference, table.mode, table.kge_floor
        );
        let _ = write!(out, "{:<10}", "PARAMETER");
        for metric in SkillMetric::ALL {
            let _ = write!(out, "{:>11}", metric.as_str());
        }
        out.push('\n');

        for outcome in table.for_dataset(dataset) {
            let _ = write!(out, "{:<10}", outcome.parameter.as_str());
            for metric in SkillMetric::ALL {
                let _ = write!(out, "{:>11}", format_metric(outcome.metric(metric)));
            }
            out.push('\n');
        }
    }

    let failures: Vec<&StageFailure> = table.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\n===== Failures =====");
        for failure in failures {
            let _ = writeln!(out, "- {failure}");
        }
    }

    out
}

/// Prints the result tables to stdout.
pub fn print_table(table: &MetricTable) {
    print!("{}", render_table(table));
}

/// JSON document written at the end of a run
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: String,
    #[serde(flatten)]
    pub table: &'a MetricTable,
}

impl<'a> RunReport<'a> {
    #[must_use]
    pub fn new(table: &'a MetricTable) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            table,
        }
    }
}

/// Writes the full run as pretty-printed JSON. Undefined values become `null`.
pub fn write_json(table: &MetricTable, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&RunReport::new(table))?;
    fs::write(path, json)?;
    Ok(())
}

/// One point of a Taylor diagram, with the reference normalized to 1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaylorSample {
    /// Mean model standard deviation over mean reference standard deviation
    pub stddev: f64,
    pub corrcoef: f64,
    pub name: String,
}

/// Taylor-diagram samples of one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaylorSet {
    pub parameter: ClimateParameter,
    pub reference: String,
    pub reference_stddev: f64,
    pub samples: Vec<TaylorSample>,
}

fn taylor_sample(outcome: &PairOutcome) -> Option<TaylorSample> {
    let summary = &outcome.grid.as_ref()?.summary;
    let stddev = summary.mean_std_model / summary.mean_std_obs;
    (stddev.is_finite() && summary.mean_corr.is_finite()).then(|| TaylorSample {
        stddev,
        corrcoef: summary.mean_corr,
        name: outcome.dataset.clone(),
    })
}

/// Collects the samples per parameter, in run order. Pairs without usable grid
/// statistics are left out.
#[must_use]
pub fn taylor_samples(table: &MetricTable) -> Vec<TaylorSet> {
    let mut sets: Vec<TaylorSet> = Vec::new();

    for outcome in &table.outcomes {
        let Some(sample) = taylor_sample(outcome) else {
            continue;
        };
        match sets.iter_mut().find(|s| s.parameter == outcome.parameter) {
            Some(set) => set.samples.push(sample),
            None => sets.push(TaylorSet {
                parameter: outcome.parameter,
                reference: table.reference.clone(),
                reference_stddev: 1.0,
                samples: vec![sample],
            }),
        }
    }

    sets
}

/// Writes the Taylor-diagram samples as pretty-printed JSON.
pub fn write_taylor_json(table: &MetricTable, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&taylor_samples(table))?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceMode;
    use crate::orchestrator::{GridOutcome, Stage};
    use crate::statistics::grid_point::GridSummary;

    fn summary(kge: f64, std_model: f64) -> GridSummary {
        GridSummary {
            mean_kge: kge,
            mean_rmsd: 0.5,
            mean_corr: 0.8,
            points: 10,
            kge_points: 10,
            rmsd_points: 10,
            dropped_rows: 0,
            repaired_points: 0,
            degenerate_points: 0,
            rmsd_excluded: 0,
            mean_std_obs: 2.0,
            mean_std_model: std_model,
        }
    }

    fn table() -> MetricTable {
        let grid = |kge, std| {
            Some(GridOutcome {
                summary: summary(kge, std),
                kge_series: None,
                rmsd_series: None,
            })
        };
        MetricTable {
            mode: ReferenceMode::Primary,
            reference: "hyras".to_string(),
            kge_floor: -1.0,
            outcomes: vec![
                PairOutcome {
                    dataset: "GC".to_string(),
                    parameter: ClimateParameter::T2m,
                    grid: grid(0.75, 3.0),
                    dav: None,
                    failures: vec![StageFailure {
                        dataset: "GC".to_string(),
                        parameter: ClimateParameter::T2m,
                        stage: Stage::Dav,
                        kind: "division_by_zero",
                        message: "Division by zero: DAV low-res overlap with observations is zero"
                            .to_string(),
                    }],
                },
                PairOutcome {
                    dataset: "E38".to_string(),
                    parameter: ClimateParameter::T2m,
                    grid: grid(f64::NAN, 1.0),
                    dav: None,
                    failures: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn cells_distinguish_failed_and_undefined() {
        assert_eq!(format_metric(None), "FAILED");
        assert_eq!(format_metric(Some(f64::NAN)), "undefined");
        assert_eq!(format_metric(Some(0.12345)), "0.123");
    }

    #[test]
    fn table_lists_failures() {
        let text = render_table(&table());
        assert!(text.contains("===== GC vs hyras"));
        assert!(text.contains("0.750"));
        assert!(text.contains("FAILED"));
        assert!(text.contains("undefined"));
        assert!(text.contains("GC/T_2M failed at DAV index"));
    }

    #[test]
    fn taylor_samples_are_normalized() {
        let sets = taylor_samples(&table());
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].samples.len(), 2);
        assert_eq!(sets[0].samples[0].stddev, 1.5);
        assert_eq!(sets[0].samples[1].name, "E38");
        assert_eq!(sets[0].samples[1].corrcoef, 0.8);
    }

    #[test]
    fn json_report_writes_nan_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&table(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["reference"], "hyras");
        assert_eq!(value["mode"], "primary");
        assert!(value["outcomes"][1]["grid"]["summary"]["mean_kge"].is_null());
        assert_eq!(value["outcomes"][0]["failures"][0]["stage"], "dav");
        assert!(value["generated_at"].is_string());
    }
}
