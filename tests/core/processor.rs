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

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::json;
use synx::errors::SynError;
use synx::{
    SynConfig, SynDataset, SynDatasetGenerator, SynFieldMapping, SynFilterProcessor,
    SynIdentityProcessor, SynLLMClient, SynProcessor, SynProcessorManager, SynRecord,
};

fn record(pairs: &[(&str, serde_json::Value)]) -> SynRecord {
    let mut record = SynRecord::new();
    for (key, value) in pairs {
        record.insert(key.to_string(), value.clone());
    }
    record
}

#[tokio::test]
async fn identity_processor_returns_values_unchanged() {
    let processor = SynIdentityProcessor::new();

    assert_eq!(processor.id(), "identity");
    let value = json!({"nested": [1, 2, 3]});
    assert_eq!(processor.process(&value).await.unwrap(), value);
}

#[test]
fn manager_resolves_registered_processors() {
    let mut manager = SynProcessorManager::new();
    manager.register(Arc::new(SynIdentityProcessor::new()));

    assert_eq!(manager.get("identity").unwrap().id(), "identity");

    let err = manager.get("missing").unwrap_err();
    match err {
        SynError::Processor { processor, message } => {
            assert_eq!(processor, "missing");
            assert!(message.contains("not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn filter_applies_numeric_bounds() {
    let filter = SynFilterProcessor::new("difficulty", 5.0, 0.0, "", "");

    assert!(filter
        .should_include(&record(&[("difficulty", json!(8))]))
        .unwrap());
    assert!(!filter
        .should_include(&record(&[("difficulty", json!(3))]))
        .unwrap());

    let bounded = SynFilterProcessor::new("difficulty", 5.0, 10.0, "", "");
    assert!(!bounded
        .should_include(&record(&[("difficulty", json!(12))]))
        .unwrap());
}

#[test]
fn filter_reports_missing_and_mistyped_fields() {
    let filter = SynFilterProcessor::new("difficulty", 5.0, 0.0, "", "");

    assert!(filter.should_include(&record(&[("other", json!(1))])).is_err());
    assert!(filter
        .should_include(&record(&[("difficulty", json!("hard"))]))
        .is_err());
}

#[test]
fn filter_compares_strings_with_the_configured_comparator() {
    let equals = SynFilterProcessor::new("language", 0.0, 0.0, "en", "eq");
    assert!(equals
        .should_include(&record(&[("language", json!("en"))]))
        .unwrap());
    assert!(!equals
        .should_include(&record(&[("language", json!("de"))]))
        .unwrap());

    let not_equals = SynFilterProcessor::new("language", 0.0, 0.0, "en", "ne");
    assert!(not_equals
        .should_include(&record(&[("language", json!("de"))]))
        .unwrap());

    let contains = SynFilterProcessor::new("text", 0.0, 0.0, "needle", "contains");
    assert!(contains
        .should_include(&record(&[("text", json!("hay needle stack"))]))
        .unwrap());

    let unknown = SynFilterProcessor::new("text", 0.0, 0.0, "x", "matches");
    assert!(unknown
        .should_include(&record(&[("text", json!("x"))]))
        .is_err());
}

#[test]
fn filter_without_constraints_includes_everything() {
    let filter = SynFilterProcessor::new("anything", 0.0, 0.0, "", "");
    assert!(filter
        .should_include(&record(&[("anything", json!(null))]))
        .unwrap());
}

fn generator_config(dir: &std::path::Path, input_name: &str) -> SynConfig {
    let mut config = SynConfig::default();
    config.io.input_file = dir.join(input_name).to_string_lossy().into_owned();
    config.io.output_dir = dir.join("out").to_string_lossy().into_owned();
    config.io.output_file = "result.json".to_string();
    config
}

#[tokio::test]
async fn generator_processes_mappings_and_carries_other_fields() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("input.json"),
        r#"[{"text": "hello", "extra": 42}, {"text": "world", "extra": 7}]"#,
    )
    .unwrap();

    let mut config = generator_config(dir.path(), "input.json");
    config.fields.input = vec![
        SynFieldMapping {
            input_field: "text".to_string(),
            output_field: "copy".to_string(),
            processor_id: "identity".to_string(),
        },
        // An empty processor id copies the value; an empty output field
        // reuses the input name
        SynFieldMapping {
            input_field: "extra".to_string(),
            output_field: String::new(),
            processor_id: String::new(),
        },
    ];

    let client = SynLLMClient::new("http://localhost:9", "unused");
    let generator = SynDatasetGenerator::new(config, client);
    generator.run().await.unwrap();

    let output =
        SynDataset::load_from_file(dir.path().join("out").join("result.json")).unwrap();
    assert_eq!(output.len(), 2);
    assert_eq!(output.items()[0].get("copy"), Some(&json!("hello")));
    assert_eq!(output.items()[0].get("text"), Some(&json!("hello")));
    assert_eq!(output.items()[0].get("extra"), Some(&json!(42)));
}

#[tokio::test]
async fn generator_no_llm_mode_copies_records_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("input.json"),
        r#"[{"a": 1}, {"a": 2}, {"a": 3}]"#,
    )
    .unwrap();

    let mut config = generator_config(dir.path(), "input.json");
    config.processing.no_llm = true;

    let client = SynLLMClient::new("http://localhost:9", "unused");
    let generator = SynDatasetGenerator::new(config, client);
    generator.run().await.unwrap();

    let output =
        SynDataset::load_from_file(dir.path().join("out").join("result.json")).unwrap();
    assert_eq!(output.len(), 3);
}

#[tokio::test]
async fn generator_applies_the_configured_filter() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("input.json"),
        r#"[{"difficulty": 9, "keep": true}, {"difficulty": 2}, {"other": 1}]"#,
    )
    .unwrap();

    let mut config = generator_config(dir.path(), "input.json");
    config.processing.no_llm = true;
    config.processing.filter.enabled = true;
    config.processing.filter.field = "difficulty".to_string();
    config.processing.filter.min_value = 5.0;

    let client = SynLLMClient::new("http://localhost:9", "unused");
    let generator = SynDatasetGenerator::new(config, client);
    generator.run().await.unwrap();

    // The low record fails the bound; the one missing the field cannot be
    // evaluated and is excluded as well
    let output =
        SynDataset::load_from_file(dir.path().join("out").join("result.json")).unwrap();
    assert_eq!(output.len(), 1);
    assert_eq!(output.items()[0].get("keep"), Some(&json!(true)));
}

#[tokio::test]
async fn generator_shutdown_flag_stops_admission() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.json"), r#"[{"a": 1}, {"a": 2}]"#).unwrap();

    let mut config = generator_config(dir.path(), "input.json");
    config.fields.input = vec![SynFieldMapping {
        input_field: "a".to_string(),
        output_field: "b".to_string(),
        processor_id: "identity".to_string(),
    }];

    let client = SynLLMClient::new("http://localhost:9", "unused");
    let generator = SynDatasetGenerator::new(config, client);

    // With the flag already set, no record is admitted and there is
    // nothing to save
    generator.shutdown_flag().store(true, Ordering::SeqCst);
    let err = generator.run().await.unwrap_err();
    assert!(err.to_string().contains("no data to save"));
}

#[tokio::test]
async fn generator_requires_an_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = generator_config(dir.path(), "input.json");
    config.io.input_file = String::new();

    let client = SynLLMClient::new("http://localhost:9", "unused");
    let generator = SynDatasetGenerator::new(config, client);

    let err = generator.run().await.unwrap_err();
    assert!(err.to_string().contains("no input dataset file configured"));
}
