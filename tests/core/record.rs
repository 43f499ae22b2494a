//! Copyright © 2025-2026 The Synx Authors. All Rights Reserved.
//!
//! This file is part of Synx.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use serde_json::json;
use synx::{SynDataset, SynRecord};

fn record(pairs: &[(&str, serde_json::Value)]) -> SynRecord {
    let mut record = SynRecord::new();
    for (key, value) in pairs {
        record.insert(key.to_string(), value.clone());
    }
    record
}

#[test]
fn dataset_starts_empty_and_grows_by_push() {
    let mut dataset = SynDataset::new();
    assert!(dataset.is_empty());

    dataset.push(record(&[("text", json!("hello"))]));
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.items()[0].get("text"), Some(&json!("hello")));
}

#[test]
fn dataset_round_trips_through_json() {
    let mut dataset = SynDataset::new();
    dataset.push(record(&[("question", json!("why?")), ("difficulty", json!(8))]));
    dataset.push(record(&[("question", json!("how?"))]));

    let encoded = dataset.to_json().unwrap();
    let decoded = SynDataset::from_json(&encoded).unwrap();

    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.items()[0].get("difficulty"), Some(&json!(8)));
}

#[test]
fn load_accepts_a_json_array_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, r#"[{"a": 1}, {"a": 2}]"#).unwrap();

    let dataset = SynDataset::load_from_file(&path).unwrap();
    assert_eq!(dataset.len(), 2);
}

#[test]
fn load_accepts_a_single_json_object_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.json");
    std::fs::write(&path, r#"{"a": 1}"#).unwrap();

    let dataset = SynDataset::load_from_file(&path).unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.items()[0].get("a"), Some(&json!(1)));
}

#[test]
fn load_accepts_jsonl_files_and_skips_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.jsonl");
    std::fs::write(&path, "{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();

    let dataset = SynDataset::load_from_file(&path).unwrap();
    assert_eq!(dataset.len(), 2);
}

#[test]
fn load_rejects_unsupported_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    let err = SynDataset::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported file format"));
}

#[test]
fn save_writes_a_readable_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");

    let mut dataset = SynDataset::new();
    dataset.push(record(&[("text", json!("hello"))]));
    dataset.save_to_file(&path).unwrap();

    let reloaded = SynDataset::load_from_file(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.items()[0].get("text"), Some(&json!("hello")));
}
