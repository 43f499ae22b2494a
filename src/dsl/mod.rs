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

//! # DSL (Domain Specific Language) Module
//!
//! This module provides a declarative domain-specific language for defining
//! dataset-curation pipelines: load a dataset, select and filter fields,
//! define prompt templates, generate new fields with an LLM, merge datasets,
//! and save results.
//!
//! ## Architecture
//!
//! The DSL system is a classic compiler pipeline plus a process supervisor:
//!
//! - **Tokenizer** ([tokenizer]): converts DSL source text into an ordered
//!   token sequence
//! - **Parser** ([parser]): recursive descent with one token of lookahead,
//!   builds the AST from the token sequence
//! - **AST** ([ast]): the closed set of statement nodes produced by parsing
//! - **Compiler** ([compiler]): deterministically lowers the AST into the
//!   source text of an executable Python pipeline program
//! - **Executor** ([executor]): persists the generated program, runs it as a
//!   supervised child process, and streams its output
//!
//! ## Language Example
//!
//! ```text
//! PRAGMA AUTOSAVE
//!
//! SYSTEM PROMPT translator "You are a careful technical translator."
//!
//! USER PROMPT translate {
//!     FIELDS [question]
//!     "Translate the following question: {question}"
//! }
//!
//! FROM squad {
//!     FIELDS ["question", "answers"]
//!     FILTER difficulty >= 8
//!     GENERATE question AS translation {
//!         MODEL "gpt-4o-mini"
//!         TEMPERATURE 0.3
//!         PROMPT translate
//!     }
//!     SAVE "translated.json"
//! }
//! ```
//!
//! Statement keywords are case-sensitive uppercase; `#` starts a comment
//! that runs to the end of the line; double- or single-quoted strings are
//! accepted and unquoted on extraction.

pub mod ast;
pub mod compiler;
pub mod executor;
pub mod parser;
pub mod tokenizer;

use std::path::{Path, PathBuf};

pub use ast::{
    SynBlock, SynFieldsStatement, SynFilterBlock, SynFilterOp, SynFilterStatement,
    SynFilterValue, SynFromStatement, SynGenerateStatement, SynMergeStatement,
    SynPragmaStatement, SynProgram, SynPromptKind, SynPromptStatement, SynSaveStatement,
    SynStatement, SynUsingBlock, SynUsingKind, SynUsingStatement, SynWithKind,
    SynWithStatement,
};
pub use compiler::{sanitize_var_name, SynCompiler};
pub use executor::SynExecutor;
pub use parser::SynParser;
pub use tokenizer::tokenize;

use crate::errors::{Result, SynError};

/// Facade tying the compiler pipeline together: source text in, supervised
/// execution out.
#[derive(Clone, Debug)]
pub struct SynDSL {
    executor: SynExecutor,
    script_dir: PathBuf,
}

impl SynDSL {
    /// Creates a facade over the given interpreter path (empty selects
    /// `python3`) and script directory.
    pub fn new(interpreter: impl Into<String>, script_dir: impl Into<PathBuf>) -> Self {
        let script_dir = script_dir.into();
        Self {
            executor: SynExecutor::new(interpreter).with_script_dir(script_dir.clone()),
            script_dir,
        }
    }

    /// Enables or disables verbose diagnostics in the generated program.
    pub fn set_debug(&mut self, debug: bool) {
        self.executor.set_debug(debug);
    }

    /// Tokenizes, parses, and compiles DSL source text into the generated
    /// program text. No file is written and nothing is executed.
    pub fn parse_and_compile(&self, input: &str) -> Result<String> {
        let tokens = tokenize(input)?;

        let mut parser = SynParser::new(tokens);
        let program = parser.parse()?;

        let compiler = SynCompiler::new();
        Ok(compiler.compile(&program))
    }

    /// Reads DSL source from a file, compiles it, and executes the generated
    /// program. The script lands in the script directory as `<stem>.py`.
    pub async fn execute_from_file(&self, path: &Path, save_script: bool) -> Result<()> {
        let input = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| SynError::Io(format!("file reading error: {}", err)))?;

        let program = self.parse_and_compile(&input)?;

        let script_path = path
            .file_stem()
            .map(|stem| self.script_dir.join(format!("{}.py", stem.to_string_lossy())));

        self.executor
            .execute(&program, save_script, script_path.as_deref())
            .await
    }

    /// Compiles DSL source from a string and executes the generated program.
    /// An empty `script_name` falls back to the executor's default location.
    pub async fn execute_from_string(
        &self,
        input: &str,
        save_script: bool,
        script_name: &str,
    ) -> Result<()> {
        let program = self.parse_and_compile(input)?;

        let script_path = if script_name.is_empty() {
            None
        } else {
            Some(self.script_dir.join(script_name))
        };

        self.executor
            .execute(&program, save_script, script_path.as_deref())
            .await
    }
}
