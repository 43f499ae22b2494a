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

//! # Synx Configuration Module
//!
//! Application configuration for the in-process engine and the interpreter
//! boundary. Configuration files are plain JSON; every section and field is
//! optional and falls back to its default, so partial configs load cleanly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SynError};

/// LLM API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for SynApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://0.0.0.0:8000/v1".to_string(),
            api_key: "token-abc123".to_string(),
            model: "t-tech/T-pro-it-1.0".to_string(),
        }
    }
}

/// Input and output file settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynIoConfig {
    pub input_file: String,
    pub output_dir: String,
    pub output_file: String,
}

impl Default for SynIoConfig {
    fn default() -> Self {
        Self {
            input_file: String::new(),
            output_dir: "output".to_string(),
            output_file: "dataset.json".to_string(),
        }
    }
}

/// Settings for the external interpreter that runs generated programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynInterpreterConfig {
    pub python_path: String,
    pub script_dir: String,
}

impl Default for SynInterpreterConfig {
    fn default() -> Self {
        Self {
            python_path: "python3".to_string(),
            script_dir: "output".to_string(),
        }
    }
}

/// Record filtering settings for the in-process engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynFilterConfig {
    pub enabled: bool,
    pub field: String,
    pub min_value: f64,
    pub max_value: f64,
    pub operator: String,
}

/// Processing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynProcessingConfig {
    pub max_concurrency: usize,
    pub temperature: f64,
    pub no_llm: bool,
    pub filter: SynFilterConfig,
}

impl Default for SynProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            temperature: 0.6,
            no_llm: false,
            filter: SynFilterConfig::default(),
        }
    }
}

/// Mapping from an input field to an output field via a named processor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynFieldMapping {
    pub input_field: String,
    pub output_field: String,
    pub processor_id: String,
}

/// Field mappings applied per record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynFieldsConfig {
    pub input: Vec<SynFieldMapping>,
    pub output: Vec<SynFieldMapping>,
}

/// Default prompts used when a mapping does not override them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynPromptConfig {
    pub system: String,
    pub user: String,
}

impl Default for SynPromptConfig {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant.".to_string(),
            user: String::new(),
        }
    }
}

/// Top-level Synx configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynConfig {
    pub api: SynApiConfig,
    pub io: SynIoConfig,
    pub interpreter: SynInterpreterConfig,
    pub processing: SynProcessingConfig,
    pub fields: SynFieldsConfig,
    pub prompt: SynPromptConfig,
    pub debug: bool,
}

impl SynConfig {
    /// Loads configuration from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())
            .map_err(|err| SynError::config(format!("error reading config file: {}", err)))?;
        let config: SynConfig = serde_json::from_str(&data)
            .map_err(|err| SynError::config(format!("error parsing config file: {}", err)))?;
        Ok(config)
    }

    /// Saves configuration to a JSON file with indentation.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), data)
            .map_err(|err| SynError::config(format!("error writing config file: {}", err)))?;
        Ok(())
    }

    /// Effective worker-pool width: the configured value, or the CPU count
    /// when unset.
    pub fn effective_concurrency(&self) -> usize {
        if self.processing.max_concurrency == 0 {
            num_cpus::get()
        } else {
            self.processing.max_concurrency
        }
    }
}
