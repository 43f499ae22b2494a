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

//! # Synx Core Library
//!
//! Synx compiles a small declarative DSL for dataset-curation pipelines
//! into executable Python programs and supervises their execution. A
//! pipeline loads a dataset, selects and filters fields, defines prompt
//! templates, generates new fields through an LLM, merges datasets, and
//! saves results.
//!
//! ## Module Overview
//!
//! - **dsl**: the compiler pipeline — tokenizer, parser, AST, code
//!   generator, and the child-process executor
//! - **errors**: the SynError taxonomy shared by every stage
//! - **config**: JSON configuration with defaults for the engine and the
//!   interpreter boundary
//! - **record**: the flat JSON-record dataset model
//! - **client**: HTTP client for OpenAI-compatible completion endpoints
//! - **processor**: pluggable field processors and their registry
//! - **generator**: the in-process engine processing datasets with a
//!   bounded worker pool
//!
//! ## Quick Start
//!
//! ```rust
//! use synx::{SynDSL, errors::Result};
//!
//! fn compile() -> Result<String> {
//!     let dsl = SynDSL::new("python3", "output");
//!     dsl.parse_and_compile(
//!         "FROM squad {\n    FIELDS [\"question\", \"answers\"]\n    SAVE \"out.json\"\n}\n",
//!     )
//! }
//! ```
//!
//! ## Architecture
//!
//! Source text flows through the tokenizer into the parser, which builds a
//! closed-variant AST. The compiler deterministically lowers the AST into
//! program text, and the executor runs that program as a supervised child
//! process: output streams are drained concurrently, interrupts are never
//! forwarded (the generated program handles its own shutdown), and a
//! bounded grace period precedes any forced kill.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, SynError>`. Tokenize and parse errors
//! are fatal and precede any code generation; compilation itself cannot
//! fail; execution errors carry the captured child output.

pub mod client;
pub mod config;
pub mod dsl;
pub mod errors;
pub mod generator;
pub mod processor;
pub mod record;

pub use errors::{Result, SynError};

pub use client::{
    SynChoice, SynCompletionRequest, SynCompletionResponse, SynLLMClient, SynMessage,
};
pub use config::{
    SynApiConfig, SynConfig, SynFieldMapping, SynFieldsConfig, SynFilterConfig,
    SynInterpreterConfig, SynIoConfig, SynProcessingConfig, SynPromptConfig,
};
pub use dsl::{
    sanitize_var_name, tokenize, SynBlock, SynCompiler, SynDSL, SynExecutor,
    SynFieldsStatement, SynFilterBlock, SynFilterOp, SynFilterStatement, SynFilterValue,
    SynFromStatement, SynGenerateStatement, SynMergeStatement, SynParser,
    SynPragmaStatement, SynProgram, SynPromptKind, SynPromptStatement, SynSaveStatement,
    SynStatement, SynUsingBlock, SynUsingKind, SynUsingStatement, SynWithKind,
    SynWithStatement,
};
pub use generator::SynDatasetGenerator;
pub use processor::{
    SynFilterProcessor, SynIdentityProcessor, SynLLMProcessor, SynProcessor,
    SynProcessorManager,
};
pub use record::{SynDataset, SynRecord};
