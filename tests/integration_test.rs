use lu_skill::prelude::*;
use lu_skill::report::{render_table, taylor_samples, write_json};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Writes a field file in the `lon lat value` layout with a header.
fn write_field(path: &Path, values: &[&str]) {
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create field directory");
    let mut text = String::from("#   lon      lat    value\n");
    for (i, v) in values.iter().enumerate() {
        text.push_str(&format!("  {:.2}  {:.2}  {}\n", 6.0 + i as f64 * 0.1, 50.0, v));
    }
    fs::write(path, text).expect("Failed to write field file");
}

/// Writes a daily series in the `index date time value` layout.
fn write_series(path: &Path, values: &[f64]) {
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create series directory");
    let mut text = String::new();
    for (i, v) in values.iter().enumerate() {
        let day = chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(i as i64);
        text.push_str(&format!("{} {} 12:00:00 {}\n", i, day.format("%Y-%m-%d"), v));
    }
    fs::write(path, text).expect("Failed to write series file");
}

fn populate(root: &Path, dataset: &str, parameter: ClimateParameter, std_model: [&str; 4]) {
    let source = CsvSource::new(root);
    let grid = source.layout().grid_paths(dataset, "hyras", parameter);
    write_field(&grid.mean_obs, &["10.0", "12.0", "-999", "14.0"]);
    write_field(&grid.std_obs, &["2.0", "2.0", "2.0", "2.0"]);
    write_field(&grid.mean_model, &["10.0", "12.0", "13.0", "14.0"]);
    write_field(&grid.std_model, &std_model);
    write_field(&grid.correlation, &["1.0", "1.0", "0.9", "1.0"]);

    let dav = source.layout().dav_paths(dataset, "GC", "hyras", parameter);
    let observed = [0.0, 0.05, 2.0, 7.0, 12.0, 0.5, 17.0, 1.0];
    let high_res = [0.08, 0.0, 2.5, 6.0, 13.0, 0.3, 16.0, 0.7];
    let low_res = [22.0, 22.0, 2.5, 26.0, 13.0, 27.0, 16.0, 28.0];
    write_series(&dav.observed, &observed);
    write_series(&dav.high_res, &high_res);
    write_series(&dav.low_res, &low_res);
}

#[test]
fn test_end_to_end_run_from_files() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();
    populate(root, "E38", ClimateParameter::TotPrec, ["2.0", "2.0", "2.0", "2.0"]);

    let config = AnalysisConfig {
        data_root: root.to_path_buf(),
        datasets: vec!["E38".to_string()],
        parameters: vec![ClimateParameter::TotPrec],
        ..AnalysisConfig::default()
    };
    let source = CsvSource::new(root);
    let table = MetricOrchestrator::new(config).unwrap().run(&source);

    let outcome = table.get("E38", ClimateParameter::TotPrec).unwrap();
    assert!(outcome.is_complete(), "{:?}", outcome.failures);

    let grid = outcome.grid.as_ref().unwrap();
    assert_eq!(grid.summary.points, 3);
    assert_eq!(grid.summary.dropped_rows, 1);
    assert_eq!(outcome.metric(SkillMetric::Kge), Some(1.0));
    assert_eq!(outcome.metric(SkillMetric::Rmsd), Some(0.0));
    assert_eq!(outcome.metric(SkillMetric::Corr), Some(1.0));

    // Observed after the 0.09 floor: [0, 0, 2, 7, 12, 0.5, 17, 1]
    //   -> bin 3 (0..5): 5, bin 4 (5..10): 1, bin 5 (10..15): 1, bin 6 (15..20): 1
    // High-res matches bin for bin; low-res only overlaps in 3 bins.
    let dav = outcome.dav.as_ref().unwrap();
    assert_eq!(dav.observed.counts(), &[0, 0, 0, 5, 1, 1, 1, 0, 0, 0]);
    assert_eq!(dav.high_res.counts(), dav.observed.counts());
    assert_eq!(dav.days, 8);
    // s_hr = 8, s_lr = 1 + 1 + 1 = 3
    assert!((dav.value - 5.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_missing_files_are_reported_per_stage() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();
    populate(root, "GC", ClimateParameter::T2m, ["2.0", "2.0", "2.0", "2.0"]);

    let config = AnalysisConfig {
        data_root: root.to_path_buf(),
        datasets: vec!["GC".to_string(), "E2015".to_string()],
        parameters: vec![ClimateParameter::T2m],
        ..AnalysisConfig::default()
    };
    let table = MetricOrchestrator::new(config)
        .unwrap()
        .run(&CsvSource::new(root));

    assert!(table.get("GC", ClimateParameter::T2m).unwrap().is_complete());

    let missing = table.get("E2015", ClimateParameter::T2m).unwrap();
    let stages: Vec<Stage> = missing.failures.iter().map(|f| f.stage).collect();
    assert_eq!(stages, vec![Stage::LoadGrid, Stage::LoadSeries]);
    assert!(missing.failures[0].message.contains("LU_E2015_T_2M_mean_mod.csv"));
    assert!(missing.failures.iter().all(|f| f.kind == "io"));

    let text = render_table(&table);
    assert!(text.contains("E2015/T_2M failed at load grid fields"));
    assert!(text.contains("FAILED"));
}

#[test]
fn test_mismatched_field_files_fail_the_join() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();
    populate(root, "G", ClimateParameter::Tmax2m, ["2.0", "2.0", "2.0", "2.0"]);

    let grid = CsvSource::new(root)
        .layout()
        .grid_paths("G", "hyras", ClimateParameter::Tmax2m);
    write_field(&grid.correlation, &["1.0", "1.0"]);

    let source = CsvSource::new(root);
    let orchestrator = MetricOrchestrator::new(AnalysisConfig {
        data_root: root.to_path_buf(),
        datasets: vec!["G".to_string()],
        parameters: vec![ClimateParameter::Tmax2m],
        ..AnalysisConfig::default()
    })
    .unwrap();
    let outcome = orchestrator.analyze_parameter("G", ClimateParameter::Tmax2m, &source);

    assert!(outcome.grid.is_none());
    assert_eq!(outcome.failures[0].stage, Stage::JoinGrid);
    assert_eq!(outcome.failures[0].kind, "shape_mismatch");
    assert!(outcome.dav.is_some());
}

#[test]
fn test_reports_are_written() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();
    populate(root, "E", ClimateParameter::T2m, ["3.0", "3.0", "3.0", "3.0"]);

    let mut config = AnalysisConfig {
        data_root: root.to_path_buf(),
        datasets: vec!["E".to_string()],
        parameters: vec![ClimateParameter::T2m],
        ..AnalysisConfig::default()
    };
    config.keep_point_series = true;
    let table = MetricOrchestrator::new(config)
        .unwrap()
        .run(&CsvSource::new(root));

    let taylor = taylor_samples(&table);
    assert_eq!(taylor.len(), 1);
    assert_eq!(taylor[0].samples[0].name, "E");
    assert!((taylor[0].samples[0].stddev - 1.5).abs() < 1e-12);

    let out = root.join("result.json");
    write_json(&table, &out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let grid = &json["outcomes"][0]["grid"];
    assert_eq!(grid["kge_series"].as_array().unwrap().len(), 3);
    assert_eq!(json["outcomes"][0]["parameter"], "T_2M");
}
