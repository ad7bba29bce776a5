//! Metric orchestration over datasets and parameters
//!
//! [`MetricOrchestrator::analyze_parameter`] is the single-pair entry point: it
//! loads the inputs of one (dataset, parameter) from a [`SeriesSource`], runs the
//! grid-point statistics and the DAV chain, and records the outcome of each stage.
//! [`MetricOrchestrator::run`] only iterates over the configured pairs.
//!
//! A failing stage never aborts the run. It is recorded as a [`StageFailure`] on
//! the pair and the metrics that stage would have produced stay absent.

use crate::config::{AnalysisConfig, ReferenceMode};
use crate::data_source::{DavSeries, SeriesSource};
use crate::errors::{Result, SkillError};
use crate::grid::{GridFields, GridTable};
use crate::parameters::ClimateParameter;
use crate::series::{DailyFrame, DatasetRole};
use crate::statistics::dav::dav_index;
use crate::statistics::grid_point::{compute_point_statistics, GridSummary, OutlierPolicy};
use crate::statistics::histogram::{BinEdges, Histogram};
use crate::statistics::operations::SkillMetric;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Processing stage of one (dataset, parameter) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LoadGrid,
    JoinGrid,
    GridStatistics,
    LoadSeries,
    AlignSeries,
    Dav,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadGrid => "load grid fields",
            Self::JoinGrid => "join grid fields",
            Self::GridStatistics => "grid-point statistics",
            Self::LoadSeries => "load DAV series",
            Self::AlignSeries => "align DAV series",
            Self::Dav => "DAV index",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage that failed for one pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub dataset: String,
    pub parameter: ClimateParameter,
    pub stage: Stage,
    pub kind: &'static str,
    pub message: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} failed at {}: {}",
            self.dataset, self.parameter, self.stage, self.message
        )
    }
}

/// Grid-point statistics of one pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridOutcome {
    pub summary: GridSummary,
    /// Per-point KGE after repair, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kge_series: Option<Vec<f64>>,
    /// Per-point RMSD, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmsd_series: Option<Vec<f64>>,
}

/// DAV result of one pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DavOutcome {
    pub value: f64,
    pub days: usize,
    pub high_res: Histogram,
    pub low_res: Histogram,
    pub observed: Histogram,
}

/// Everything computed for one (dataset, parameter) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairOutcome {
    pub dataset: String,
    pub parameter: ClimateParameter,
    pub grid: Option<GridOutcome>,
    pub dav: Option<DavOutcome>,
    pub failures: Vec<StageFailure>,
}

impl PairOutcome {
    /// Value of `metric`, or `None` when the stage producing it failed
    #[must_use]
    pub fn metric(&self, metric: SkillMetric) -> Option<f64> {
        match metric {
            SkillMetric::Kge => self.grid.as_ref().map(|g| g.summary.mean_kge),
            SkillMetric::Rmsd => self.grid.as_ref().map(|g| g.summary.mean_rmsd),
            SkillMetric::Corr => self.grid.as_ref().map(|g| g.summary.mean_corr),
            SkillMetric::Dav => self.dav.as_ref().map(|d| d.value),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Results of a full run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTable {
    pub mode: ReferenceMode,
    pub reference: String,
    pub kge_floor: f64,
    pub outcomes: Vec<PairOutcome>,
}

impl MetricTable {
    #[must_use]
    pub fn get(&self, dataset: &str, parameter: ClimateParameter) -> Option<&PairOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.dataset == dataset && o.parameter == parameter)
    }

    /// Outcomes of one dataset, keyed by parameter in run order
    pub fn for_dataset<'a>(&'a self, dataset: &'a str) -> impl Iterator<Item = &'a PairOutcome> {
        self.outcomes.iter().filter(move |o| o.dataset == dataset)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageFailure> {
        self.outcomes.iter().flat_map(|o| o.failures.iter())
    }

    /// Datasets in run order, without repetition
    #[must_use]
    pub fn datasets(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for outcome in &self.outcomes {
            if !seen.contains(&outcome.dataset.as_str()) {
                seen.push(&outcome.dataset);
            }
        }
        seen
    }
}

/// Computes grid-point statistics from loaded fields.
///
/// # Errors
///
/// Fails with the stage at which the error occurred.
pub fn grid_metrics(
    fields: &GridFields,
    policy: &OutlierPolicy,
    keep_point_series: bool,
) -> std::result::Result<GridOutcome, (Stage, SkillError)> {
    let table = GridTable::join(fields).map_err(|e| (Stage::JoinGrid, e))?;
    let stats = compute_point_statistics(&table, policy).map_err(|e| (Stage::GridStatistics, e))?;
    let summary = stats.summarize(&table);

    let (kge_series, rmsd_series) = if keep_point_series {
        (Some(stats.kge.to_vec()), Some(stats.rmsd.to_vec()))
    } else {
        (None, None)
    };

    Ok(GridOutcome {
        summary,
        kge_series,
        rmsd_series,
    })
}

/// Runs resample, alignment, precipitation floor, binning and DAV on loaded series.
///
/// # Errors
///
/// Fails with the stage at which the error occurred.
pub fn dav_metric(
    series: &DavSeries,
    parameter: ClimateParameter,
    precipitation_floor: f64,
    edges: &BinEdges,
) -> std::result::Result<DavOutcome, (Stage, SkillError)> {
    let mut frame = DailyFrame::align(
        parameter,
        series.high_res.resample_daily(),
        series.low_res.resample_daily(),
        series.observed.resample_daily(),
    )
    .map_err(|e| (Stage::AlignSeries, e))?;
    frame.apply_precipitation_floor(precipitation_floor);

    let high_res = frame.histogram(DatasetRole::HighRes, edges);
    let low_res = frame.histogram(DatasetRole::LowRes, edges);
    let observed = frame.histogram(DatasetRole::Observed, edges);

    let value = dav_index(high_res.counts(), low_res.counts(), observed.counts())
        .map_err(|e| (Stage::Dav, e))?;

    Ok(DavOutcome {
        value,
        days: frame.len(),
        high_res,
        low_res,
        observed,
    })
}

/// Drives the metric engine for every configured (dataset, parameter) pair
#[derive(Debug, Clone)]
pub struct MetricOrchestrator {
    config: AnalysisConfig,
    edges: BinEdges,
}

impl MetricOrchestrator {
    /// # Errors
    ///
    /// Returns [`SkillError::Config`] if the configuration does not validate.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            edges: BinEdges::standard(),
        })
    }

    fn failure(
        dataset: &str,
        parameter: ClimateParameter,
        stage: Stage,
        error: &SkillError,
    ) -> StageFailure {
        let failure = StageFailure {
            dataset: dataset.to_string(),
            parameter,
            stage,
            kind: error.kind(),
            message: error.to_string(),
        };
        warn!("{}", failure);
        failure
    }

    /// Computes every metric of one (dataset, parameter) pair.
    pub fn analyze_parameter(
        &self,
        dataset: &str,
        parameter: ClimateParameter,
        source: &dyn SeriesSource,
    ) -> PairOutcome {
        let config = &self.config;
        let mut failures = Vec::new();

        let grid = match source.grid_fields(dataset, config.reference(), parameter) {
            Ok(fields) => {
                match grid_metrics(&fields, &config.outlier_policy(), config.keep_point_series) {
                    Ok(outcome) => Some(outcome),
                    Err((stage, e)) => {
                        failures.push(Self::failure(dataset, parameter, stage, &e));
                        None
                    }
                }
            }
            Err(e) => {
                failures.push(Self::failure(dataset, parameter, Stage::LoadGrid, &e));
                None
            }
        };

        let dav = match source.dav_series(
            dataset,
            &config.dav.baseline,
            &config.dav.observation,
            parameter,
        ) {
            Ok(series) => {
                match dav_metric(&series, parameter, config.precipitation_floor, &self.edges) {
                    Ok(outcome) => Some(outcome),
                    Err((stage, e)) => {
                        failures.push(Self::failure(dataset, parameter, stage, &e));
                        None
                    }
                }
            }
            Err(e) => {
                failures.push(Self::failure(dataset, parameter, Stage::LoadSeries, &e));
                None
            }
        };

        if let Some(g) = &grid {
            let s = &g.summary;
            info!(
                "{}_{}: KGE {:.3}, RMSD {:.3}, CORR {:.3} over {} points ({} dropped, {} repaired, {} degenerate)",
                dataset,
                parameter,
                s.mean_kge,
                s.mean_rmsd,
                s.mean_corr,
                s.points,
                s.dropped_rows,
                s.repaired_points,
                s.degenerate_points
            );
        }
        if let Some(d) = &dav {
            info!("{}_{}: DAV {:.3} over {} days", dataset, parameter, d.value, d.days);
        }

        PairOutcome {
            dataset: dataset.to_string(),
            parameter,
            grid,
            dav,
            failures,
        }
    }

    /// Runs every configured dataset and parameter.
    pub fn run(&self, source: &dyn SeriesSource) -> MetricTable {
        let config = &self.config;
        info!(
            datasets = config.datasets.len(),
            parameters = config.parameters.len(),
            mode = %config.mode,
            reference = config.reference(),
            "starting metric run"
        );

        let mut outcomes = Vec::with_capacity(config.datasets.len() * config.parameters.len());
        for dataset in &config.datasets {
            for &parameter in &config.parameters {
                outcomes.push(self.analyze_parameter(dataset, parameter, source));
            }
        }

        let table = MetricTable {
            mode: config.mode,
            reference: config.reference().to_string(),
            kge_floor: config.kge_floor(),
            outcomes,
        };

        let failed = table.failures().count();
        if failed > 0 {
            warn!(failed, "metric run finished with failed stages");
        } else {
            info!("metric run finished");
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::MemorySource;
    use crate::grid::FieldTable;
    use crate::series::TimeSeries;
    use chrono::NaiveDate;

    fn field(name: &str, values: &[f64]) -> FieldTable {
        let mut t = FieldTable::new(name);
        for (i, &v) in values.iter().enumerate() {
            t.push(i as f64, 50.0, v);
        }
        t
    }

    fn fields(std_obs: &[f64]) -> GridFields {
        let n = std_obs.len();
        GridFields {
            mean_obs: field("M_obs", &vec![10.0; n]),
            std_obs: field("S_obs", std_obs),
            mean_model: field("M_mod", &vec![10.0; n]),
            std_model: field("S_mod", std_obs),
            correlation: field("P", &vec![1.0; n]),
        }
    }

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
        TimeSeries::new(
            "x",
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let day = start + chrono::Duration::days(i as i64);
                    (day.and_hms_opt(12, 0, 0).unwrap(), v)
                })
                .collect(),
        )
    }

    fn config(datasets: &[&str]) -> AnalysisConfig {
        AnalysisConfig {
            datasets: datasets.iter().map(|s| (*s).to_string()).collect(),
            parameters: vec![ClimateParameter::T2m],
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn perfect_dataset_scores_perfectly() {
        let same = series(&[1.0, 7.0, 12.0, 18.0]);
        let mut source = MemorySource::new();
        source
            .insert_grid("GC", ClimateParameter::T2m, fields(&[2.0, 3.0]))
            .insert_dav(
                "GC",
                ClimateParameter::T2m,
                DavSeries {
                    high_res: same.clone(),
                    low_res: same.clone(),
                    observed: same,
                },
            );

        let orchestrator = MetricOrchestrator::new(config(&["GC"])).unwrap();
        let outcome = orchestrator.analyze_parameter("GC", ClimateParameter::T2m, &source);

        assert!(outcome.is_complete());
        assert_eq!(outcome.metric(SkillMetric::Kge), Some(1.0));
        assert_eq!(outcome.metric(SkillMetric::Rmsd), Some(0.0));
        assert_eq!(outcome.metric(SkillMetric::Corr), Some(1.0));
        assert_eq!(outcome.metric(SkillMetric::Dav), Some(0.0));
        assert_eq!(outcome.dav.as_ref().unwrap().days, 4);
    }

    #[test]
    fn failures_are_recorded_per_pair_and_run_continues() {
        let mut source = MemorySource::new();
        source.insert_grid("BAD", ClimateParameter::T2m, fields(&[2.0, 0.0]));
        source.insert_grid("OK", ClimateParameter::T2m, fields(&[2.0]));

        let orchestrator = MetricOrchestrator::new(config(&["BAD", "OK"])).unwrap();
        let table = orchestrator.run(&source);

        assert_eq!(table.outcomes.len(), 2);
        let bad = table.get("BAD", ClimateParameter::T2m).unwrap();
        assert!(bad.grid.is_none());
        assert_eq!(bad.metric(SkillMetric::Kge), None);
        let stages: Vec<Stage> = bad.failures.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![Stage::GridStatistics, Stage::LoadSeries]);
        assert_eq!(bad.failures[0].kind, "division_by_zero");

        let ok = table.get("OK", ClimateParameter::T2m).unwrap();
        assert_eq!(ok.metric(SkillMetric::Kge), Some(1.0));
        assert_eq!(table.failures().count(), 3);
        assert_eq!(table.datasets(), vec!["BAD", "OK"]);
    }

    #[test]
    fn misaligned_series_fail_at_alignment() {
        let mut source = MemorySource::new();
        source.insert_dav(
            "E38",
            ClimateParameter::T2m,
            DavSeries {
                high_res: series(&[1.0, 2.0, 3.0]),
                low_res: series(&[1.0, 2.0]),
                observed: series(&[1.0, 2.0, 3.0]),
            },
        );

        let orchestrator = MetricOrchestrator::new(config(&["E38"])).unwrap();
        let outcome = orchestrator.analyze_parameter("E38", ClimateParameter::T2m, &source);
        assert!(outcome.dav.is_none());
        assert!(outcome
            .failures
            .iter()
            .any(|f| f.stage == Stage::AlignSeries && f.kind == "shape_mismatch"));
    }

    #[test]
    fn point_series_are_kept_on_request() {
        let mut source = MemorySource::new();
        source.insert_grid("GC", ClimateParameter::T2m, fields(&[2.0, 3.0, 4.0]));

        let mut cfg = config(&["GC"]);
        cfg.keep_point_series = true;
        let outcome = MetricOrchestrator::new(cfg)
            .unwrap()
            .analyze_parameter("GC", ClimateParameter::T2m, &source);
        let grid = outcome.grid.unwrap();
        assert_eq!(grid.kge_series.unwrap().len(), 3);
        assert_eq!(grid.rmsd_series.unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(MetricOrchestrator::new(config(&[])).is_err());
    }
}
