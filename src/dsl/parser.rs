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

//! Recursive-descent parser for the Synx pipeline DSL.
//!
//! The parser holds the token sequence and a cursor that only ever moves
//! forward. Dispatch uses one token of lookahead: the current token selects
//! the statement production, and nested blocks recurse into the same
//! dispatcher, so a block may contain any statement kind including further
//! nested blocks. Parsing is strictly fail-fast — the first grammar
//! violation aborts with a [`SynError::Parse`] and no partial AST escapes.

use crate::dsl::ast::{
    SynBlock, SynFieldsStatement, SynFilterBlock, SynFilterOp, SynFilterStatement,
    SynFilterValue, SynFromStatement, SynGenerateStatement, SynMergeStatement,
    SynPragmaStatement, SynProgram, SynPromptKind, SynPromptStatement, SynSaveStatement,
    SynStatement, SynUsingBlock, SynUsingKind, SynUsingStatement, SynWithKind,
    SynWithStatement,
};
use crate::dsl::tokenizer::strip_quotes;
use crate::errors::{Result, SynError};

/// Parser state: the token array and an integer cursor.
#[derive(Debug)]
pub struct SynParser {
    tokens: Vec<String>,
    position: usize,
}

impl SynParser {
    /// Creates a parser over a token sequence produced by
    /// [`tokenize`](crate::dsl::tokenizer::tokenize).
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Current cursor position. After a successful parse this equals
    /// [`token_count`](Self::token_count) — no input is left unconsumed.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of tokens held by the parser.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Parses all statements and returns the program root.
    pub fn parse(&mut self) -> Result<SynProgram> {
        let mut program = SynProgram::default();

        while !self.is_eof() {
            let statement = self.parse_statement()?;
            program.statements.push(statement);
        }

        Ok(program)
    }

    fn parse_statement(&mut self) -> Result<SynStatement> {
        let token = match self.peek() {
            Some(token) => token.to_string(),
            None => return Err(SynError::parse("unexpected end of input")),
        };

        match token.as_str() {
            "FROM" => self.parse_from_statement(),
            "WITH" => self.parse_with_statement(),
            "FIELDS" => self.parse_fields_statement(),
            "USING" => self.parse_using_statement(),
            "FILTER" => self.parse_filter_statement(),
            "MERGE" => self.parse_merge_statement(),
            "SAVE" => self.parse_save_statement(),
            "GENERATE" => self.parse_generate_statement(),
            // Bare PROMPT means USER PROMPT, for backward compatibility.
            "PROMPT" => self.parse_prompt_statement(SynPromptKind::User),
            "PRAGMA" => self.parse_pragma_statement(),
            "SYSTEM" => {
                self.advance();
                if self.peek() == Some("PROMPT") {
                    self.advance();
                    self.parse_prompt_statement(SynPromptKind::System)
                } else {
                    Err(SynError::parse(format!(
                        "expected PROMPT after SYSTEM, got: {}",
                        self.peek().unwrap_or_default()
                    )))
                }
            }
            "USER" => {
                self.advance();
                if self.peek() == Some("PROMPT") {
                    self.advance();
                    self.parse_prompt_statement(SynPromptKind::User)
                } else {
                    Err(SynError::parse(format!(
                        "expected PROMPT after USER, got: {}",
                        self.peek().unwrap_or_default()
                    )))
                }
            }
            other => Err(SynError::parse(format!("unexpected token: {}", other))),
        }
    }

    fn parse_from_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // FROM

        let dataset = self
            .advance()
            .ok_or_else(|| SynError::parse("expected dataset name after FROM"))?;

        let block = if self.peek() == Some("{") {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(SynStatement::From(SynFromStatement { dataset, block }))
    }

    fn parse_with_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // WITH

        let with_type = self
            .advance()
            .ok_or_else(|| SynError::parse("expected setting type after WITH"))?;

        let kind = match with_type.as_str() {
            "CONCURRENCY" => {
                let value = self.advance().ok_or_else(|| {
                    SynError::parse("expected value after WITH CONCURRENCY")
                })?;
                let concurrency = value.parse::<i64>().map_err(|err| {
                    SynError::parse(format!("incorrect concurrency value: {}", err))
                })?;
                SynWithKind::Concurrency(concurrency)
            }
            "STREAM" => SynWithKind::Stream,
            other => {
                return Err(SynError::parse(format!("unknown WITH type: {}", other)));
            }
        };

        let block = if self.peek() == Some("{") {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(SynStatement::With(SynWithStatement { kind, block }))
    }

    fn parse_fields_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // FIELDS

        let fields = self.parse_name_list("field")?;
        if fields.is_empty() {
            return Err(SynError::parse("expected at least one field after FIELDS"));
        }

        Ok(SynStatement::Fields(SynFieldsStatement { fields }))
    }

    /// Parses either a bracketed, comma-separated name list or a single name.
    fn parse_name_list(&mut self, what: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();

        if self.peek() == Some("[") {
            self.advance(); // [

            while self.peek() != Some("]") {
                if self.is_eof() {
                    return Err(SynError::parse("expected closing bracket ]"));
                }

                let name = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected closing bracket ]"))?;
                names.push(strip_quotes(&name).to_string());

                if self.peek() == Some(",") {
                    self.advance();
                }
            }

            self.advance(); // ]
        } else {
            let name = self
                .advance()
                .ok_or_else(|| SynError::parse(format!("expected {} name", what)))?;
            names.push(strip_quotes(&name).to_string());
        }

        Ok(names)
    }

    fn parse_using_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // USING

        if self.peek() == Some("{") {
            self.advance(); // {

            let mut statements = Vec::new();

            while self.peek() != Some("}") {
                if self.is_eof() {
                    return Err(SynError::parse("expected closing brace }"));
                }

                let kind_token = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected closing brace }"))?;
                let kind = SynUsingKind::from_token(&kind_token).ok_or_else(|| {
                    SynError::parse(format!(
                        "expected USING type (MODEL, KEY, URL), got: {}",
                        kind_token
                    ))
                })?;

                let value = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected value after USING type"))?;

                statements.push(SynUsingStatement {
                    kind,
                    value: strip_quotes(&value).to_string(),
                });
            }

            self.advance(); // }

            Ok(SynStatement::UsingBlock(SynUsingBlock { statements }))
        } else {
            let kind_token = self
                .advance()
                .ok_or_else(|| SynError::parse("expected type after USING"))?;
            let kind = SynUsingKind::from_token(&kind_token).ok_or_else(|| {
                SynError::parse(format!(
                    "expected USING type (MODEL, KEY, URL), got: {}",
                    kind_token
                ))
            })?;

            let value = self
                .advance()
                .ok_or_else(|| SynError::parse("expected value after USING type"))?;

            Ok(SynStatement::Using(SynUsingStatement {
                kind,
                value: strip_quotes(&value).to_string(),
            }))
        }
    }

    fn parse_filter_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // FILTER

        let field = self
            .advance()
            .ok_or_else(|| SynError::parse("expected field after FILTER"))?;

        if self.peek() == Some("{") {
            self.advance(); // {

            let mut conditions = Vec::new();

            while self.peek() != Some("}") {
                if self.is_eof() {
                    return Err(SynError::parse("expected closing brace }"));
                }

                let subfield = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected closing brace }"))?;
                let (op, value) = self.parse_filter_condition(&subfield)?;

                conditions.push(SynFilterStatement {
                    field: subfield,
                    op,
                    value,
                });

                if self.peek() == Some(";") {
                    self.advance();
                }
            }

            self.advance(); // }

            Ok(SynStatement::FilterBlock(SynFilterBlock { field, conditions }))
        } else {
            let (op, value) = self.parse_filter_condition(&field)?;

            Ok(SynStatement::Filter(SynFilterStatement { field, op, value }))
        }
    }

    /// Parses the `<op> <value>` tail of a filter condition.
    fn parse_filter_condition(&mut self, field: &str) -> Result<(SynFilterOp, SynFilterValue)> {
        let op_token = self
            .advance()
            .ok_or_else(|| SynError::parse(format!("expected operator after {}", field)))?;
        let op = SynFilterOp::from_token(&op_token).ok_or_else(|| {
            SynError::parse(format!(
                "expected operator (=, >, <, >=, <=, !=), got: {}",
                op_token
            ))
        })?;

        let value_token = self
            .advance()
            .ok_or_else(|| SynError::parse(format!("expected value after {}", op_token)))?;

        // Integers stay integers; everything else is a quote-stripped string.
        let value = match value_token.parse::<i64>() {
            Ok(number) => SynFilterValue::Int(number),
            Err(_) => SynFilterValue::Str(strip_quotes(&value_token).to_string()),
        };

        Ok((op, value))
    }

    fn parse_merge_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // MERGE

        let mut datasets = Vec::new();

        if self.peek() == Some("[") {
            datasets = self.parse_name_list("dataset")?;
        } else {
            let first = self
                .advance()
                .ok_or_else(|| SynError::parse("expected dataset name after MERGE"))?;
            datasets.push(strip_quotes(&first).to_string());

            if self.peek() == Some(",") {
                self.advance();
                let second = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected dataset name after comma"))?;
                datasets.push(strip_quotes(&second).to_string());
            } else {
                return Err(SynError::parse("expected comma between datasets in MERGE"));
            }
        }

        if datasets.len() < 2 {
            return Err(SynError::parse(
                "at least two datasets are required for MERGE",
            ));
        }

        Ok(SynStatement::Merge(SynMergeStatement { datasets }))
    }

    fn parse_save_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // SAVE

        let filename = self
            .advance()
            .ok_or_else(|| SynError::parse("expected filename after SAVE"))?;

        Ok(SynStatement::Save(SynSaveStatement {
            filename: strip_quotes(&filename).to_string(),
        }))
    }

    fn parse_block(&mut self) -> Result<SynBlock> {
        self.advance(); // {

        let mut block = SynBlock::default();

        while self.peek() != Some("}") {
            if self.is_eof() {
                return Err(SynError::parse("expected closing brace }"));
            }

            let statement = self.parse_statement()?;
            block.statements.push(statement);
        }

        self.advance(); // }

        Ok(block)
    }

    fn parse_generate_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // GENERATE

        let source_field = self
            .advance()
            .ok_or_else(|| SynError::parse("expected source field after GENERATE"))?;

        if self.peek() != Some("AS") && self.peek() != Some("TO") {
            return Err(SynError::parse(format!(
                "expected 'AS' or 'TO' after source field, got: {}",
                self.peek().unwrap_or_default()
            )));
        }
        self.advance(); // AS or TO

        let target_field = self
            .advance()
            .ok_or_else(|| SynError::parse("expected target field after AS/TO"))?;

        let mut statement = SynGenerateStatement {
            source_field: strip_quotes(&source_field).to_string(),
            target_field: strip_quotes(&target_field).to_string(),
            model: None,
            temperature: 0.7,
            tokens: 1024,
            prompt_templates: Vec::new(),
        };

        if self.peek() == Some("{") {
            self.advance(); // {

            while self.peek() != Some("}") {
                if self.is_eof() {
                    return Err(SynError::parse("expected closing brace }"));
                }

                let parameter = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected closing brace }"))?;

                match parameter.as_str() {
                    "MODEL" => {
                        let model = self.advance().ok_or_else(|| {
                            SynError::parse("expected model name after MODEL")
                        })?;
                        statement.model = Some(strip_quotes(&model).to_string());
                    }
                    "TEMPERATURE" => {
                        let value = self.advance().ok_or_else(|| {
                            SynError::parse("expected value after TEMPERATURE")
                        })?;
                        statement.temperature = value.parse::<f64>().map_err(|_| {
                            SynError::parse(format!(
                                "expected numeric value for TEMPERATURE, got: {}",
                                value
                            ))
                        })?;
                    }
                    "TOKENS" => {
                        let value = self
                            .advance()
                            .ok_or_else(|| SynError::parse("expected value after TOKENS"))?;
                        statement.tokens = value.parse::<i64>().map_err(|_| {
                            SynError::parse(format!(
                                "expected integer value for TOKENS, got: {}",
                                value
                            ))
                        })?;
                    }
                    "PROMPT" => {
                        let name = self.advance().ok_or_else(|| {
                            SynError::parse("expected prompt name after PROMPT")
                        })?;
                        statement
                            .prompt_templates
                            .push(strip_quotes(&name).to_string());
                    }
                    other => {
                        return Err(SynError::parse(format!(
                            "unknown GENERATE parameter: {}",
                            other
                        )));
                    }
                }

                if self.peek() == Some(";") {
                    self.advance();
                }
            }

            self.advance(); // }
        }

        Ok(SynStatement::Generate(statement))
    }

    fn parse_prompt_statement(&mut self, kind: SynPromptKind) -> Result<SynStatement> {
        if self.peek() == Some("PROMPT") {
            self.advance();
        }

        let name = self
            .advance()
            .ok_or_else(|| SynError::parse("expected prompt name after PROMPT"))?;

        let mut fields = Vec::new();
        let template;

        if self.peek() == Some("{") {
            self.advance(); // {

            if self.peek() == Some("FIELDS") {
                self.advance();
                fields = self.parse_name_list("field")?;

                if self.is_eof() || self.peek() == Some("}") {
                    return Err(SynError::parse("expected text template after field list"));
                }
            }

            // Everything up to the closing brace is the template. Tokens are
            // re-joined with single spaces, so original inter-token spacing
            // inside multi-line templates is not preserved.
            let mut template_tokens = Vec::new();
            while self.peek() != Some("}") {
                if self.is_eof() {
                    return Err(SynError::parse("expected closing brace }"));
                }

                let token = self
                    .advance()
                    .ok_or_else(|| SynError::parse("expected closing brace }"))?;
                template_tokens.push(token);
            }

            template = strip_quotes(&template_tokens.join(" ")).to_string();

            self.advance(); // }
        } else {
            let token = self
                .advance()
                .ok_or_else(|| SynError::parse("expected text template"))?;
            template = strip_quotes(&token).to_string();
        }

        Ok(SynStatement::Prompt(SynPromptStatement {
            name: strip_quotes(&name).to_string(),
            template,
            fields,
            kind,
        }))
    }

    fn parse_pragma_statement(&mut self) -> Result<SynStatement> {
        self.advance(); // PRAGMA

        let pragma_type = self
            .advance()
            .ok_or_else(|| SynError::parse("expected pragma type after PRAGMA"))?;

        let pragma = match pragma_type.as_str() {
            "AUTOSAVE" => SynPragmaStatement::Autosave,
            "CONCURRENCY" => {
                let value = self.advance().ok_or_else(|| {
                    SynError::parse("expected value after PRAGMA CONCURRENCY")
                })?;
                let concurrency = value.parse::<i64>().map_err(|_| {
                    SynError::parse(format!(
                        "expected integer value for PRAGMA CONCURRENCY, got: {}",
                        value
                    ))
                })?;
                SynPragmaStatement::Concurrency(concurrency)
            }
            other => {
                return Err(SynError::parse(format!(
                    "unknown PRAGMA directive: {}",
                    other
                )));
            }
        };

        Ok(SynStatement::Pragma(pragma))
    }

    /// Returns the current token without moving the cursor.
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    /// Returns the current token and moves the cursor forward.
    fn advance(&mut self) -> Option<String> {
        let token = self.tokens.get(self.position).cloned()?;
        self.position += 1;
        Some(token)
    }

    /// True once the cursor has consumed every token.
    fn is_eof(&self) -> bool {
        self.position >= self.tokens.len()
    }
}
