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

//! # Synx Processor Module
//!
//! Pluggable field processors for the in-process engine. A processor takes
//! one field value and returns a transformed value; the
//! [`SynProcessorManager`] is a name-keyed registry the engine resolves
//! mappings against. Built-ins cover identity copying, LLM-backed
//! generation, and record filtering.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::SynLLMClient;
use crate::errors::{Result, SynError};
use crate::record::SynRecord;

/// Contract every field processor must fulfill.
#[async_trait]
pub trait SynProcessor: std::fmt::Debug + Send + Sync {
    /// Registry identifier for the processor.
    fn id(&self) -> &str;

    /// Transforms one field value.
    async fn process(&self, value: &Value) -> Result<Value>;
}

/// Name-keyed processor registry.
#[derive(Debug, Default)]
pub struct SynProcessorManager {
    processors: HashMap<String, Arc<dyn SynProcessor>>,
}

impl SynProcessorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a processor under its own id. Re-registering a name
    /// replaces the previous entry.
    pub fn register(&mut self, processor: Arc<dyn SynProcessor>) {
        self.processors
            .insert(processor.id().to_string(), processor);
    }

    /// Looks up a processor by id.
    pub fn get(&self, id: &str) -> Result<Arc<dyn SynProcessor>> {
        self.processors.get(id).cloned().ok_or_else(|| {
            SynError::processor(id, format!("processor with id '{}' not found", id))
        })
    }
}

/// Returns the value unchanged.
#[derive(Debug, Default)]
pub struct SynIdentityProcessor;

impl SynIdentityProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SynProcessor for SynIdentityProcessor {
    fn id(&self) -> &str {
        "identity"
    }

    async fn process(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}

/// Generates a replacement value through the LLM API.
#[derive(Debug)]
pub struct SynLLMProcessor {
    id: String,
    client: Arc<SynLLMClient>,
    model: String,
    system_prompt: String,
    user_template: String,
    temperature: f64,
}

impl SynLLMProcessor {
    pub fn new(
        id: impl Into<String>,
        client: Arc<SynLLMClient>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_template: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            id: id.into(),
            client,
            model: model.into(),
            system_prompt: system_prompt.into(),
            user_template: user_template.into(),
            temperature,
        }
    }
}

#[async_trait]
impl SynProcessor for SynLLMProcessor {
    fn id(&self) -> &str {
        &self.id
    }

    async fn process(&self, value: &Value) -> Result<Value> {
        let text = value
            .as_str()
            .ok_or_else(|| SynError::processor(&self.id, "value must be a string"))?;

        // An empty template sends the field value itself; otherwise the
        // value is substituted into the {value} placeholder
        let user_prompt = if self.user_template.is_empty() {
            text.to_string()
        } else {
            self.user_template.replace("{value}", text)
        };

        let completion = self
            .client
            .generate_completion(&self.model, &self.system_prompt, &user_prompt, self.temperature)
            .await?;

        Ok(Value::String(completion))
    }
}

/// Decides whether records pass the configured filter.
#[derive(Clone, Debug)]
pub struct SynFilterProcessor {
    field: String,
    min_value: f64,
    max_value: f64,
    string_value: String,
    comparator: String,
}

impl SynFilterProcessor {
    pub fn new(
        field: impl Into<String>,
        min_value: f64,
        max_value: f64,
        string_value: impl Into<String>,
        comparator: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            min_value,
            max_value,
            string_value: string_value.into(),
            comparator: comparator.into(),
        }
    }

    /// Checks whether the record should be included in the output.
    pub fn should_include(&self, item: &SynRecord) -> Result<bool> {
        let field_value = item.get(&self.field).ok_or_else(|| {
            SynError::processor("filter", format!("field '{}' not found in item", self.field))
        })?;

        // Numeric bounds take precedence when either is set
        if self.min_value != 0.0 || self.max_value != 0.0 {
            let number = field_value.as_f64().ok_or_else(|| {
                SynError::processor("filter", format!("field '{}' is not a number", self.field))
            })?;

            if self.min_value != 0.0 && number < self.min_value {
                return Ok(false);
            }
            if self.max_value != 0.0 && number > self.max_value {
                return Ok(false);
            }

            return Ok(true);
        }

        // String comparison
        if !self.string_value.is_empty() && !self.comparator.is_empty() {
            let text = field_value.as_str().ok_or_else(|| {
                SynError::processor("filter", format!("field '{}' is not a string", self.field))
            })?;

            return match self.comparator.as_str() {
                "eq" => Ok(text == self.string_value),
                "ne" => Ok(text != self.string_value),
                "contains" => Ok(text.contains(&self.string_value)),
                other => Err(SynError::processor(
                    "filter",
                    format!("unknown comparator '{}'", other),
                )),
            };
        }

        // No constraints configured: include everything
        Ok(true)
    }
}

#[async_trait]
impl SynProcessor for SynFilterProcessor {
    fn id(&self) -> &str {
        "filter"
    }

    // Filtering happens through should_include; as a field processor the
    // filter passes values through untouched
    async fn process(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}
