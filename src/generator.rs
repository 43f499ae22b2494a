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

//! # Synx Dataset Generator Module
//!
//! The in-process engine: loads a JSON dataset, applies the configured
//! filter, fans each record's mapped fields out to registered processors
//! under a bounded worker pool, and saves the result. A cooperative
//! shutdown flag — set by a one-shot interrupt watcher — stops admission of
//! new records while everything already processed is kept for saving.
//! Failed records are counted and skipped; they never abort the run.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::client::SynLLMClient;
use crate::config::SynConfig;
use crate::errors::{Result, SynError};
use crate::processor::{
    SynFilterProcessor, SynIdentityProcessor, SynLLMProcessor, SynProcessorManager,
};
use crate::record::{SynDataset, SynRecord};

/// Upper bound for one processor invocation.
const PROCESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of processing one record.
enum ItemOutcome {
    Done(SynRecord),
    Failed,
    Skipped,
}

/// Processes an input dataset into an output dataset.
#[derive(Debug)]
pub struct SynDatasetGenerator {
    config: SynConfig,
    processors: SynProcessorManager,
    shutdown: Arc<AtomicBool>,
}

impl SynDatasetGenerator {
    /// Creates a generator and registers the built-in processors plus one
    /// LLM processor per `llm` field mapping.
    pub fn new(config: SynConfig, client: SynLLMClient) -> Self {
        let client = Arc::new(client);
        let mut processors = SynProcessorManager::new();

        processors.register(Arc::new(SynIdentityProcessor::new()));

        for mapping in &config.fields.input {
            if mapping.processor_id == "llm" {
                processors.register(Arc::new(SynLLMProcessor::new(
                    format!("llm_{}", mapping.input_field),
                    Arc::clone(&client),
                    config.api.model.clone(),
                    config.prompt.system.clone(),
                    config.prompt.user.clone(),
                    config.processing.temperature,
                )));
            }
        }

        Self {
            config,
            processors,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared shutdown flag. Setting it stops admission of new records.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs the whole pipeline: load, filter, process, save.
    pub async fn run(&self) -> Result<()> {
        // One-shot interrupt watcher flips the cooperative flag; in-flight
        // records finish and everything processed so far is saved
        let shutdown = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, finishing current records...");
                shutdown.store(true, Ordering::SeqCst);
            }
        });

        let input = self.load_dataset()?;
        if input.is_empty() {
            return Err(SynError::internal("input dataset is empty or was not loaded"));
        }

        let items = self.apply_filter(input.items());
        let total = items.len();
        log::info!("processing dataset of {} records", total);

        if self.config.processing.no_llm {
            // Without the model the records are copied through unchanged
            log::warn!("no-LLM mode: records are copied without model processing");
            let mut output = SynDataset::new();
            output.set_items(items);
            return self.save_dataset(&output);
        }

        let output = self.process_dataset(items).await;
        self.save_dataset(&output)
    }

    fn load_dataset(&self) -> Result<SynDataset> {
        if self.config.io.input_file.is_empty() {
            return Err(SynError::config("no input dataset file configured"));
        }

        SynDataset::load_from_file(&self.config.io.input_file)
    }

    /// Applies the configured record filter. Records the filter cannot
    /// evaluate are excluded with a warning.
    fn apply_filter(&self, items: &[SynRecord]) -> Vec<SynRecord> {
        let filter_config = &self.config.processing.filter;
        if !filter_config.enabled {
            return items.to_vec();
        }

        let filter = SynFilterProcessor::new(
            filter_config.field.clone(),
            filter_config.min_value,
            filter_config.max_value,
            String::new(),
            filter_config.operator.clone(),
        );

        items
            .iter()
            .filter(|item| match filter.should_include(item) {
                Ok(keep) => keep,
                Err(err) => {
                    log::warn!("filter excluded a record: {}", err);
                    false
                }
            })
            .cloned()
            .collect()
    }

    /// Processes all records with bounded concurrency.
    async fn process_dataset(&self, items: Vec<SynRecord>) -> SynDataset {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.config.effective_concurrency()));

        let futures: Vec<_> = items
            .iter()
            .map(|item| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    // Cooperative shutdown: stop admitting records, both
                    // before and after waiting for a worker slot
                    if self.shutdown.load(Ordering::SeqCst) {
                        return ItemOutcome::Skipped;
                    }

                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return ItemOutcome::Skipped,
                    };

                    if self.shutdown.load(Ordering::SeqCst) {
                        return ItemOutcome::Skipped;
                    }

                    match self.process_item(item).await {
                        Ok(record) => ItemOutcome::Done(record),
                        Err(err) => {
                            log::warn!("error processing record: {}", err);
                            ItemOutcome::Failed
                        }
                    }
                }
            })
            .collect();

        let outcomes = futures::future::join_all(futures).await;

        let mut output = SynDataset::new();
        let mut failed = 0usize;
        let mut skipped = 0usize;

        for outcome in outcomes {
            match outcome {
                ItemOutcome::Done(record) => output.push(record),
                ItemOutcome::Failed => failed += 1,
                ItemOutcome::Skipped => skipped += 1,
            }
        }

        log::info!(
            "statistics: {} succeeded, {} failed, {} of {} processed",
            output.len(),
            failed,
            total - skipped,
            total
        );

        output
    }

    /// Processes one record through its configured field mappings. Fields
    /// not covered by a mapping are carried over unchanged.
    async fn process_item(&self, item: &SynRecord) -> Result<SynRecord> {
        let mut result = SynRecord::new();

        for mapping in &self.config.fields.input {
            let output_field = if mapping.output_field.is_empty() {
                mapping.input_field.clone()
            } else {
                mapping.output_field.clone()
            };

            let value = match item.get(&mapping.input_field) {
                Some(value) => value,
                None => {
                    log::debug!("field '{}' not found in item", mapping.input_field);
                    continue;
                }
            };

            let processed = if mapping.processor_id.is_empty() {
                value.clone()
            } else {
                // LLM mappings register per input field
                let lookup_id = if mapping.processor_id == "llm" {
                    format!("llm_{}", mapping.input_field)
                } else {
                    mapping.processor_id.clone()
                };

                let processor = self.processors.get(&lookup_id)?;

                match tokio::time::timeout(PROCESS_TIMEOUT, processor.process(value)).await {
                    Ok(processed) => processed?,
                    Err(_) => {
                        return Err(SynError::processor(lookup_id, "processing timed out"));
                    }
                }
            };

            result.insert(output_field, processed);
        }

        // Carry over the remaining fields unless a mapping wrote them
        for (key, value) in item.iter() {
            if !result.contains_key(key) {
                result.insert(key.clone(), value.clone());
            }
        }

        Ok(result)
    }

    fn save_dataset(&self, output: &SynDataset) -> Result<()> {
        if output.is_empty() {
            return Err(SynError::internal("no data to save"));
        }

        let output_dir = &self.config.io.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|err| {
            SynError::Io(format!("error creating directory {}: {}", output_dir, err))
        })?;

        let output_path = Path::new(output_dir).join(&self.config.io.output_file);
        output.save_to_file(&output_path)?;

        log::info!("results saved to {}", output_path.display());

        Ok(())
    }
}
