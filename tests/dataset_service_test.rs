//! Tests for dataset loading and snapshot export through the service container

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use shortlist::application::options::{EngineConfig, TreeSettings};
use shortlist::application::{run_pipeline, ApplicationError};
use shortlist::config::Settings;
use shortlist::domain::Value;
use shortlist::infrastructure::traits::{MemoryFileSystem, RealFileSystem};
use shortlist::infrastructure::ServiceContainer;

fn container() -> ServiceContainer {
    ServiceContainer::with_deps(Settings::default(), Arc::new(RealFileSystem))
}

#[test]
fn given_dataset_file_when_loading_then_reads_typed_values() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("phones.json");
    fs::write(
        &path,
        r#"[{"model": "A", "price": 499, "5g": true}, {"model": "B", "price": null}]"#,
    )
    .unwrap();

    // Act
    let dataset = container().datasets.load(&path).unwrap();

    // Assert
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.columns(), ["model", "price", "5g"]);
    assert_eq!(dataset.records()[0].get("price"), &Value::Number(499.0));
    assert!(dataset.records()[1].get("5g").is_absent());
    assert_eq!(dataset.label_column(), Some("model"));
}

#[test]
fn given_missing_file_when_loading_then_dataset_error() {
    let dir = TempDir::new().unwrap();

    let result = container().datasets.load(&dir.path().join("missing.json"));

    assert!(matches!(result, Err(ApplicationError::Dataset { .. })));
}

#[test]
fn given_scalar_document_when_loading_then_dataset_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scalar.json");
    fs::write(&path, "42").unwrap();

    let result = container().datasets.load(&path);

    match result {
        Err(e @ ApplicationError::Dataset { .. }) => {
            assert!(e.to_string().contains("scalar.json"));
        }
        other => panic!("expected dataset error, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn given_snapshot_when_exporting_to_nested_path_then_creates_parents_and_writes_json() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.json");
    fs::write(&data, r#"[{"name": "x", "ram": 8}, {"name": "y", "ram": 16}]"#).unwrap();
    let container = container();
    let dataset = container.datasets.load(&data).unwrap();
    let mut config = EngineConfig::default();
    config.tradeoffs.selected = vec!["ram".into()];
    let snapshot = run_pipeline(&dataset, &config, &TreeSettings::default()).unwrap();
    let target = dir.path().join("out").join("nested").join("snapshot.json");

    // Act
    container.export.write_json(&snapshot, &target).unwrap();

    // Assert
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.ends_with('\n'));
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["totalRecords"], 2);
    assert_eq!(json["scored"][1]["score"], 1.0);
}

#[test]
fn given_in_memory_dataset_when_exporting_then_snapshot_lands_in_memory() {
    // Arrange
    let fs = Arc::new(MemoryFileSystem::new().with_file(
        "data/laptops.json",
        r#"{"records": [{"name": "a", "weight_kg": 1.2}, {"name": "b", "weight_kg": 1.6}]}"#,
    ));
    let container = ServiceContainer::with_deps(Settings::default(), fs.clone());
    let dataset = container.datasets.load(Path::new("data/laptops.json")).unwrap();
    let snapshot =
        run_pipeline(&dataset, &EngineConfig::default(), &TreeSettings::default()).unwrap();

    // Act
    container
        .export
        .write_json(&snapshot, Path::new("exports/run.json"))
        .unwrap();

    // Assert
    let written = fs.contents(Path::new("exports/run.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["filteredRecords"], 2);
    assert_eq!(json["schema"][1]["kind"], "numeric");
}
