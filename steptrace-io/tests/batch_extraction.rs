use std::fs;
use std::path::Path;

use steptrace_algorithms::{classify_captures, histogram};
use steptrace_core::{ExtractionConfig, TrackId};
use steptrace_io::{extract_all, extract_file, BatchConfig, JsonRecordSource};
use tempfile::TempDir;

fn neutron_event(product: &str) -> String {
    format!(
        r#"[
        {{"particle": "neutron", "track_id": 1, "parent_id": 0,
          "x_mm": [0.0, 1.0], "y_mm": [0.0, 0.0], "z_mm": [0.0, 0.0],
          "ProcName": ["initStep", "hadElastic"], "NextVolume": ["World", "GdLS"]}},
        {{"particle": "proton", "track_id": 2, "parent_id": 1,
          "x_mm": [1.0], "y_mm": [0.0], "z_mm": [0.0],
          "ProcName": ["initStep"], "NextVolume": ["GdLS"]}},
        {{"particle": "neutron", "track_id": 3, "parent_id": 0,
          "x_mm": [2.0, 7.5], "y_mm": [0.0, 1.5], "z_mm": [0.0, -3.0],
          "ProcName": ["hadElastic", "nCapture"], "NextVolume": ["GdLS", "GdLS"]}},
        {{"particle": "gamma", "track_id": 4, "parent_id": 3,
          "x_mm": [7.5], "y_mm": [1.5], "z_mm": [-3.0],
          "ProcName": ["initStep"], "NextVolume": ["GdLS"]}},
        {{"particle": "{product}", "track_id": 5, "parent_id": 3,
          "x_mm": [7.5], "y_mm": [1.5], "z_mm": [-3.0],
          "ProcName": ["initStep"], "NextVolume": ["GdLS"]}}
    ]"#
    )
}

fn write_run(dir: &Path, products: &[&str]) {
    for (i, product) in products.iter().enumerate() {
        fs::write(dir.join(format!("event_{i:04}.json")), neutron_event(product)).unwrap();
    }
}

#[test]
fn test_extract_file_merges_segments() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &["Gd158"]);
    let path = dir.path().join("event_0000.json");

    let records = extract_file(&path, &ExtractionConfig::default()).unwrap();
    assert_eq!(records.len(), 1);
    let neutron = &records[0];
    assert_eq!(neutron.track_id, TrackId::Segments(vec![1, 3]));
    assert_eq!(neutron.x_mm, vec![0.0, 1.0, 2.0, 7.5]);
    assert_eq!(neutron.filename.as_deref(), Some(path.as_path()));
}

#[test]
fn test_extract_all_isolates_bad_files() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &["Gd158", "Gd156", "Gd158"]);
    fs::write(dir.path().join("event_0003.json"), "[{\"particle\": ").unwrap();

    let batch = BatchConfig::default().with_worker_count(2);
    let result = extract_all(dir.path(), &ExtractionConfig::default(), &batch).unwrap();

    assert_eq!(result.files_processed, 3);
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].0.ends_with("event_0003.json"));
    assert!(!result.is_complete());

    // Results follow file order.
    let names: Vec<_> = result
        .records
        .iter()
        .filter_map(|r| r.filename.as_ref()?.file_name()?.to_str().map(str::to_string))
        .collect();
    assert_eq!(names, ["event_0000.json", "event_0001.json", "event_0002.json"]);

    let classes = classify_captures(&result.records, &JsonRecordSource::new());
    assert!(classes.is_complete());
    let products: Vec<String> = classes
        .into_values()
        .into_iter()
        .flatten()
        .filter_map(|c| c.capture_product)
        .collect();
    let h = histogram(&products, None);
    assert_eq!(h.bins, vec!["Gd156".to_string(), "Gd158".to_string()]);
    assert_eq!(h.weights, vec![1, 2]);
}

#[test]
fn test_extract_all_max_files_and_separate_mode() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &["Gd158", "Gd156", "Gd158", "Gd157"]);

    let extraction = ExtractionConfig::default().with_merge_segments(false);
    let batch = BatchConfig::default().with_max_files(2);
    let result = extract_all(dir.path(), &extraction, &batch).unwrap();

    assert_eq!(result.files_processed, 2);
    assert_eq!(result.records.len(), 4);
    assert!(result.records.iter().all(|r| r.track_id.as_single().is_some()));
}

#[test]
fn test_missing_directory_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(extract_all(&missing, &ExtractionConfig::default(), &BatchConfig::default()).is_err());
}

#[test]
fn test_classification_survives_removed_event_file() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &["Gd158", "Gd156", "Gd157", "Gd158"]);
    let result = extract_all(dir.path(), &ExtractionConfig::default(), &BatchConfig::default())
        .unwrap();
    assert_eq!(result.records.len(), 4);

    fs::remove_file(dir.path().join("event_0002.json")).unwrap();

    let classes = classify_captures(&result.records, &JsonRecordSource::new());
    assert_eq!(classes.failures.len(), 1);
    assert_eq!(classes.failures[0].0, 2);
    let products: Vec<String> = classes
        .into_values()
        .into_iter()
        .flatten()
        .filter_map(|c| c.capture_product)
        .collect();
    assert_eq!(products, ["Gd158", "Gd156", "Gd158"]);
}
