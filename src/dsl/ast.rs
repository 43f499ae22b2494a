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

//! Abstract syntax tree for the Synx pipeline DSL.
//!
//! Every statement the parser can produce is a variant of [`SynStatement`],
//! so the compiler's traversal is exhaustive by construction: adding a
//! statement kind is a compile-time-checked change everywhere it is
//! consumed. Nodes carry data only; all behavior lives in the parser and
//! the compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root node of a parsed program.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SynProgram {
    pub statements: Vec<SynStatement>,
}

/// A block of statements in curly braces. Blocks are always closed; the
/// parser errors out if the input ends before the matching `}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SynBlock {
    pub statements: Vec<SynStatement>,
}

/// Closed set of statement kinds produced by the parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SynStatement {
    From(SynFromStatement),
    With(SynWithStatement),
    Fields(SynFieldsStatement),
    Using(SynUsingStatement),
    UsingBlock(SynUsingBlock),
    Filter(SynFilterStatement),
    FilterBlock(SynFilterBlock),
    Merge(SynMergeStatement),
    Save(SynSaveStatement),
    Generate(SynGenerateStatement),
    Prompt(SynPromptStatement),
    Pragma(SynPragmaStatement),
}

/// A FROM statement: load a named dataset, optionally configured by a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynFromStatement {
    pub dataset: String,
    pub block: Option<SynBlock>,
}

/// Setting selected by a WITH statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SynWithKind {
    Concurrency(i64),
    Stream,
}

/// A WITH statement: adjust a pipeline setting, optionally scoping a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynWithStatement {
    pub kind: SynWithKind,
    pub block: Option<SynBlock>,
}

/// A FIELDS statement: select the named fields from the dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynFieldsStatement {
    pub fields: Vec<String>,
}

/// Parameter kind accepted by USING.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynUsingKind {
    Model,
    Key,
    Url,
}

impl SynUsingKind {
    /// Maps a keyword token to a USING kind.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "MODEL" => Some(SynUsingKind::Model),
            "KEY" => Some(SynUsingKind::Key),
            "URL" => Some(SynUsingKind::Url),
            _ => None,
        }
    }
}

/// A single USING parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynUsingStatement {
    pub kind: SynUsingKind,
    pub value: String,
}

/// A USING block carrying multiple parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynUsingBlock {
    pub statements: Vec<SynUsingStatement>,
}

/// Comparison operator accepted by FILTER.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynFilterOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl SynFilterOp {
    /// Maps an operator token to a filter operator.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(SynFilterOp::Eq),
            ">" => Some(SynFilterOp::Gt),
            "<" => Some(SynFilterOp::Lt),
            ">=" => Some(SynFilterOp::Ge),
            "<=" => Some(SynFilterOp::Le),
            "!=" => Some(SynFilterOp::Ne),
            _ => None,
        }
    }
}

impl fmt::Display for SynFilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelled = match self {
            SynFilterOp::Eq => "=",
            SynFilterOp::Gt => ">",
            SynFilterOp::Lt => "<",
            SynFilterOp::Ge => ">=",
            SynFilterOp::Le => "<=",
            SynFilterOp::Ne => "!=",
        };
        f.write_str(spelled)
    }
}

/// Filter comparison value. Values that lex as integers are kept as
/// integers; everything else is a quote-stripped string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SynFilterValue {
    Str(String),
    Int(i64),
}

/// A single FILTER condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynFilterStatement {
    pub field: String,
    pub op: SynFilterOp,
    pub value: SynFilterValue,
}

/// A FILTER block: several conditions on subfields of one outer field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynFilterBlock {
    pub field: String,
    pub conditions: Vec<SynFilterStatement>,
}

/// A MERGE statement concatenating two or more loaded datasets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynMergeStatement {
    pub datasets: Vec<String>,
}

/// A SAVE statement writing the current dataset to a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynSaveStatement {
    pub filename: String,
}

/// A GENERATE statement: derive a target field from a source field with an
/// LLM. Temperature and token limits default to 0.7 and 1024 when the
/// parameter block is omitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynGenerateStatement {
    pub source_field: String,
    pub target_field: String,
    pub model: Option<String>,
    pub temperature: f64,
    pub tokens: i64,
    pub prompt_templates: Vec<String>,
}

/// Whether a prompt template addresses the system or the user role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynPromptKind {
    System,
    User,
}

/// A PROMPT statement defining a named request template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynPromptStatement {
    pub name: String,
    pub template: String,
    pub fields: Vec<String>,
    pub kind: SynPromptKind,
}

/// A compiler directive. Directives take effect at their position in the
/// statement order, never retroactively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SynPragmaStatement {
    Autosave,
    Concurrency(i64),
}
