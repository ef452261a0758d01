//! End-to-end consolidation over on-disk partitions.

use std::path::Path;
use std::sync::Arc;

use mp_config::ExportConfig;
use mp_core::enums::TabularStrategy;
use mp_core::{EntityType, RunContext};
use mp_export::Exporter;
use mp_lake::ObjectStoreDownloader;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

fn chunk(root: &Path, rel: &str, records: &[Value]) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    serde_jsonlines::write_json_lines(path, records).unwrap();
}

fn exporter(root: &Path) -> Exporter {
    let run = RunContext::new(root.join("partitions"), "exports/run-1", "run-1").unwrap();
    let config = ExportConfig {
        artifacts_dir: root.join("artifacts"),
        workbook: false,
        ..Default::default()
    };
    Exporter::new(run, &config)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn two_table_chunks_merge_in_order() {
    let dir = TempDir::new().unwrap();
    let parts = dir.path().join("partitions");
    chunk(&parts, "transformed/table/chunk-0.jsonl", &[json!({"id": 1, "name": "a"})]);
    chunk(&parts, "transformed/table/chunk-1.jsonl", &[json!({"id": 2, "name": "b"})]);
    let exporter = exporter(dir.path());

    let text = exporter.write_text_output().unwrap();
    assert!(text.written);
    assert_eq!(text.record_count, 2);
    assert_eq!(
        std::fs::read_to_string(&text.path).unwrap(),
        "=== TABLE ===\nid\tname\n1\ta\n2\tb\n"
    );

    let json = exporter.write_json_output().unwrap();
    let doc = read_json(&json.path);
    assert_eq!(doc["table"], json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]));
    assert_eq!(json.record_counts[&EntityType::Table], 2);
    assert!(!json.repaired);
}

#[test]
fn structured_arrays_follow_raw_fallback() {
    let dir = TempDir::new().unwrap();
    let parts = dir.path().join("partitions");
    chunk(&parts, "transformed/column/chunk-0.jsonl", &[json!({"c": 1}), json!({"c": 2})]);
    chunk(&parts, "raw/column/chunk-0.jsonl", &[json!({"c": 99})]);
    chunk(&parts, "raw/index/chunk-0.jsonl", &[json!({"i": 1}), json!({"i": 2}), json!({"i": 3})]);
    std::fs::write(parts.join("transformed/column/chunk-1.jsonl"), "{oops").unwrap();

    let exporter = exporter(dir.path());
    let doc = read_json(&exporter.write_json_output().unwrap().path);

    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), EntityType::ALL.len() + 1);
    assert_eq!(doc["column"].as_array().unwrap().len(), 2);
    assert_eq!(doc["index"].as_array().unwrap().len(), 3);
    assert_eq!(doc["database"], json!([]));
    assert_eq!(doc["metadata"]["record_counts"]["index"], 3);
}

#[test]
fn rerun_is_byte_identical_apart_from_timestamp() {
    let dir = TempDir::new().unwrap();
    let parts = dir.path().join("partitions");
    chunk(&parts, "transformed/schema/chunk-0.jsonl", &[json!({"name": "public", "owner": null})]);
    chunk(&parts, "raw/relationship/chunk-0.jsonl", &[json!({"from": "a", "to": "b"})]);
    let exporter = exporter(dir.path());

    let first_text = std::fs::read(exporter.write_text_output().unwrap().path).unwrap();
    let mut first_doc = read_json(&exporter.write_json_output().unwrap().path);
    let second_text = std::fs::read(exporter.write_text_output().unwrap().path).unwrap();
    let mut second_doc = read_json(&exporter.write_json_output().unwrap().path);

    assert_eq!(first_text, second_text);
    first_doc["metadata"]["generated_at"] = Value::Null;
    second_doc["metadata"]["generated_at"] = Value::Null;
    assert_eq!(first_doc, second_doc);
}

#[test]
fn empty_input_yields_placeholders_not_errors() {
    let dir = TempDir::new().unwrap();
    let exporter = exporter(dir.path());

    let response = exporter.run_exit_steps();

    let text = response.text.result().unwrap();
    assert!(!text.written);
    assert_eq!(std::fs::read_to_string(&text.path).unwrap(), "");

    let json = response.json.result().unwrap();
    let doc = read_json(&json.path);
    for ty in EntityType::ALL {
        assert_eq!(doc[ty.as_str()], json!([]), "{ty}");
    }

    let tabular = response.tabular.result().unwrap();
    assert_eq!(tabular.strategy, TabularStrategy::Bundle);
    assert!(tabular.path.ends_with("run-1/output.tar.gz"));

    let summary = &response.summary.result().unwrap().summary;
    assert!(summary.types.is_empty());
    assert_eq!(summary.tabular_output.as_deref(), Some(tabular.path.as_path()));
    assert!(exporter.summary_path().is_file());
}

#[tokio::test]
async fn downloads_prefix_before_exporting() {
    let dir = TempDir::new().unwrap();
    let store = InMemory::new();
    store
        .put(
            &ObjectPath::from("exports/run-1/transformed/database/chunk-0.jsonl"),
            PutPayload::from_static(b"{\"name\":\"warehouse\"}\n"),
        )
        .await
        .unwrap();
    store
        .put(
            &ObjectPath::from("exports/run-1/transformed/database/statistics.json"),
            PutPayload::from_static(b"{\"total_record_count\":1,\"chunk_count\":1}"),
        )
        .await
        .unwrap();
    let downloader = ObjectStoreDownloader::new(Arc::new(store));

    let response = exporter(dir.path()).download_and_run(&downloader).await;

    assert_eq!(response.downloaded, 2);
    assert_eq!(
        response.json.result().unwrap().record_counts[&EntityType::Database],
        1
    );
    let summary = &response.summary.result().unwrap().summary;
    assert_eq!(summary.types[&EntityType::Database].total_record_count, 1);
}
