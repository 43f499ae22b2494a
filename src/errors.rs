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

//! # Synx Error Module
//!
//! This module defines the error types used throughout Synx for consistent
//! error handling and reporting.
//!
//! ## Error Handling Philosophy
//!
//! Synx raises errors at three well-separated stages:
//!
//! - **Front end**: `Tokenize` and `Parse` errors are fatal and occur before
//!   any code generation begins; no partial program text is ever produced
//! - **Compilation**: compiling a well-formed AST cannot fail. Programs that
//!   are syntactically valid but semantically wrong (for example a GENERATE
//!   that references a dataset that was never loaded) compile successfully
//!   and fail when the generated program runs
//! - **Execution**: `Execution` errors cover interpreter launch failures and
//!   abnormal child exits, and carry the captured output streams so the
//!   failure can be diagnosed without re-running the pipeline
//!
//! ## Usage
//!
//! ```rust
//! use synx::errors::{Result, SynError};
//!
//! fn expect_name(token: Option<&str>) -> Result<&str> {
//!     token.ok_or_else(|| SynError::parse("expected dataset name after FROM"))
//! }
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Synx.
pub type Result<T> = std::result::Result<T, SynError>;

/// Canonical error enumeration for Synx.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum SynError {
    /// Raised when the tokenizer extracts no tokens from non-empty input.
    #[error("tokenize error: {message}")]
    Tokenize { message: String },

    /// Raised by the parser on any grammar violation. Parsing is fail-fast:
    /// the first violation aborts the parse and no partial AST is returned.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Raised when a generated program fails to launch or exits abnormally.
    /// Carries the output captured from the child process for diagnosis.
    #[error("execution error: {message}")]
    Execution {
        message: String,
        stdout: String,
        stderr: String,
    },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Errors raised while loading or saving configuration.
    #[error("config error: {message}")]
    Config { message: String },

    /// Errors raised by the LLM API client.
    #[error("client error: {message}")]
    Client { message: String },

    /// Any failure raised by a processor implementation.
    #[error("processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for SynError {
    fn from(err: io::Error) -> Self {
        SynError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SynError {
    fn from(err: serde_json::Error) -> Self {
        SynError::Serde(err.to_string())
    }
}

impl From<reqwest::Error> for SynError {
    fn from(err: reqwest::Error) -> Self {
        SynError::Client {
            message: err.to_string(),
        }
    }
}

impl SynError {
    /// Helper to construct tokenizer errors.
    pub fn tokenize<T: Into<String>>(message: T) -> Self {
        SynError::Tokenize {
            message: message.into(),
        }
    }

    /// Helper to construct parse errors.
    pub fn parse<T: Into<String>>(message: T) -> Self {
        SynError::Parse {
            message: message.into(),
        }
    }

    /// Helper to construct execution errors with captured output.
    pub fn execution(
        message: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        SynError::Execution {
            message: message.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Helper to construct config errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        SynError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct client errors.
    pub fn client<T: Into<String>>(message: T) -> Self {
        SynError::Client {
            message: message.into(),
        }
    }

    /// Helper to construct processor errors.
    pub fn processor(name: impl Into<String>, message: impl Into<String>) -> Self {
        SynError::Processor {
            processor: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        SynError::Internal(message.into())
    }
}
