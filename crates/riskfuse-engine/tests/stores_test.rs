//! Loading calibration and correlation tables from disk.

use std::fs;

use riskfuse_core::errors::{LoadError, RiskfuseErrorCode};
use riskfuse_engine::calibration::{default_calibration_document, write_default_calibration, LikelihoodSource};
use riskfuse_engine::{CalibrationStore, CorrelationStore};

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

#[test]
fn calibration_json_wrapped_form() {
    let dir = tempdir();
    let path = dir.path().join("calibration.json");
    fs::write(
        &path,
        r#"{
  "detectors": [
    {"detector_id": "watchlist_match", "version": "2.1", "true_positive_rate": 0.85,
     "false_positive_rate": 0.02, "base_confidence": 85, "notes": "curated list"},
    {"detector_id": "keyword_screen", "version": 3, "true_positive_rate": 0.55,
     "false_positive_rate": 0.15, "base_confidence": 50}
  ]
}"#,
    )
    .unwrap();

    let store = CalibrationStore::load(&path).unwrap();
    assert_eq!(store.len(), 2);

    let watchlist = store.get("watchlist_match").unwrap();
    assert_eq!(watchlist.version, "2.1");
    assert_eq!(watchlist.notes.as_deref(), Some("curated list"));
    assert!((watchlist.likelihood_ratio_positive() - 42.5).abs() < 1e-9);

    assert_eq!(store.get("keyword_screen").unwrap().version, "3");
    assert!(store.get("unknown").is_none());
}

#[test]
fn calibration_json_bare_list() {
    let dir = tempdir();
    let path = dir.path().join("calibration.json");
    fs::write(
        &path,
        r#"[{"detector_id": "a", "true_positive_rate": 0.6, "false_positive_rate": 0.3}]"#,
    )
    .unwrap();

    let store = CalibrationStore::load(&path).unwrap();
    let a = store.get("a").unwrap();
    assert!((a.likelihood_ratio_positive() - 2.0).abs() < 1e-9);
    assert_eq!(store.resolve("a", 10.0).source, LikelihoodSource::Calibrated);
    assert_eq!(store.resolve("b", 10.0).source, LikelihoodSource::DefaultHeuristic);
}

#[test]
fn calibration_toml_by_extension() {
    let dir = tempdir();
    let path = dir.path().join("calibration.toml");
    fs::write(
        &path,
        r#"
[[detectors]]
detector_id = "registry_anomaly"
version = "1.0"
true_positive_rate = 0.70
false_positive_rate = 0.05
base_confidence = 70.0
"#,
    )
    .unwrap();

    let store = CalibrationStore::load(&path).unwrap();
    assert!((store.get("registry_anomaly").unwrap().likelihood_ratio_positive() - 14.0).abs() < 1e-9);
}

#[test]
fn calibration_rate_out_of_range_is_fatal() {
    let dir = tempdir();
    let path = dir.path().join("calibration.json");
    fs::write(
        &path,
        r#"[{"detector_id": "a", "true_positive_rate": 1.2, "false_positive_rate": 0.1}]"#,
    )
    .unwrap();

    let err = CalibrationStore::load(&path).unwrap_err();
    assert!(matches!(err, LoadError::InvalidRate { field: "true_positive_rate", .. }));
    assert_eq!(err.error_code(), "LOAD_ERROR");
}

#[test]
fn missing_and_malformed_documents() {
    let dir = tempdir();

    let missing = CalibrationStore::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, LoadError::FileNotFound { .. }));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        CorrelationStore::load(&broken).unwrap_err(),
        LoadError::ParseError { .. }
    ));
}

#[test]
fn unconfigured_tables_start_empty() {
    assert!(CalibrationStore::load_optional(None).unwrap().is_empty());
    assert!(CorrelationStore::load_optional(None).unwrap().is_empty());
}

#[test]
fn correlation_json_is_symmetric() {
    let dir = tempdir();
    let path = dir.path().join("correlations.json");
    fs::write(
        &path,
        r#"{"correlations": [
  {"detector_1": "watchlist_match", "detector_2": "manual_flag", "pearson_r": 0.6},
  {"detector_1": "keyword_screen", "detector_2": "network_link", "pearson_r": -0.25}
]}"#,
    )
    .unwrap();

    let store = CorrelationStore::load(&path).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("watchlist_match", "manual_flag"), 0.6);
    assert_eq!(store.get("manual_flag", "watchlist_match"), 0.6);
    assert_eq!(store.get("network_link", "keyword_screen"), -0.25);
    assert_eq!(store.get("watchlist_match", "network_link"), 0.0);
}

#[test]
fn correlation_toml_with_short_field_names() {
    let dir = tempdir();
    let path = dir.path().join("correlations.toml");
    fs::write(
        &path,
        r#"
[[correlations]]
detector_a = "x"
detector_b = "y"
r = 0.9
"#,
    )
    .unwrap();

    let store = CorrelationStore::load(&path).unwrap();
    assert_eq!(store.get("y", "x"), 0.9);
}

#[test]
fn correlation_out_of_range_is_fatal() {
    let dir = tempdir();
    let path = dir.path().join("correlations.json");
    fs::write(
        &path,
        r#"[{"detector_1": "x", "detector_2": "y", "pearson_r": 1.5}]"#,
    )
    .unwrap();

    assert!(matches!(
        CorrelationStore::load(&path).unwrap_err(),
        LoadError::InvalidCorrelation { .. }
    ));
}

#[test]
fn default_calibration_round_trips_through_disk() {
    let dir = tempdir();
    let path = dir.path().join("starter.json");

    let written = write_default_calibration(&path).unwrap();
    let store = CalibrationStore::load(&path).unwrap();

    assert_eq!(written, store.len());
    assert_eq!(written, default_calibration_document().into_entries().len());
    for entry in store.entries() {
        assert!(entry.likelihood_ratio_positive() > 1.0, "{}", entry.detector_id);
        assert!(entry.notes.is_some());
    }
}

#[test]
fn default_calibration_can_be_written_as_toml() {
    let dir = tempdir();
    let path = dir.path().join("starter.toml");
    write_default_calibration(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[[detectors]]"));
    assert!(CalibrationStore::load(&path).unwrap().get("manual_flag").is_some());
}
