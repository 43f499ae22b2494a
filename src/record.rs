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

//! # Synx Dataset Module
//!
//! This module provides the dataset model exchanged between Synx and the
//! programs it generates: an ordered list of flat key/value records,
//! persisted as a JSON array. Records use `serde_json` maps so structured
//! and semi-structured data can flow through without a fixed schema.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, SynError};

/// One flat key/value record.
pub type SynRecord = Map<String, Value>;

/// An ordered collection of records, serialized as a JSON array.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynDataset {
    items: Vec<SynRecord>,
}

impl SynDataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, item: SynRecord) {
        self.items.push(item);
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Read access to the records.
    pub fn items(&self) -> &[SynRecord] {
        &self.items
    }

    /// Replaces the records wholesale.
    pub fn set_items(&mut self, items: Vec<SynRecord>) {
        self.items = items;
    }

    /// Parses a dataset from a JSON array string.
    pub fn from_json(data: &str) -> Result<Self> {
        let items: Vec<SynRecord> = serde_json::from_str(data)?;
        Ok(Self { items })
    }

    /// Serializes the dataset to a JSON array string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    /// Loads a dataset from a `.json` file (array of objects, or a single
    /// object) or a `.jsonl` file (one object per line).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|err| SynError::Io(format!("error reading file: {}", err)))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let items = match extension.as_str() {
            "json" => match serde_json::from_str::<Vec<SynRecord>>(&data) {
                Ok(items) => items,
                // Fall back to a single top-level object
                Err(_) => {
                    let single: SynRecord = serde_json::from_str(&data).map_err(|err| {
                        SynError::Serde(format!("error parsing JSON: {}", err))
                    })?;
                    vec![single]
                }
            },
            "jsonl" => {
                let mut items = Vec::new();
                for line in data.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let item: SynRecord = serde_json::from_str(line).map_err(|err| {
                        SynError::Serde(format!("error parsing JSONL line: {}", err))
                    })?;
                    items.push(item);
                }
                items
            }
            other => {
                return Err(SynError::config(format!(
                    "unsupported file format: '{}', only .json and .jsonl are supported",
                    other
                )));
            }
        };

        Ok(Self { items })
    }

    /// Writes the dataset as an indented JSON array.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(path.as_ref(), data)
            .map_err(|err| SynError::Io(format!("error writing file: {}", err)))?;
        Ok(())
    }
}
