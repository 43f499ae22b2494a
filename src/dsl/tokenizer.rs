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

//! Tokenizer for the Synx pipeline DSL.
//!
//! Tokenization runs in four passes over the source text:
//!
//! 1. strip `#`-to-end-of-line comments
//! 2. lift every double-quoted string literal out of the text and replace it
//!    with a unique placeholder, so punctuation or keywords inside string
//!    contents cannot be mis-tokenized
//! 3. scan the remaining text with a single alternation pattern whose
//!    branches are, in priority order, the fixed keyword/operator/punctuation
//!    set and a generic identifier/number/path pattern
//! 4. restore each placeholder to its original quoted text
//!
//! Characters that match none of the alternation branches are silently
//! dropped; the scanner only fails when the whole input yields zero tokens
//! (for example when the source is nothing but a comment).

use regex::Regex;

use crate::errors::{Result, SynError};

/// Splits DSL source text into a flat, ordered token sequence.
///
/// Surrounding whitespace is discarded. String literals survive as single
/// tokens with their quotes intact; later stages strip the quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    // Remove comments.
    let comments = Regex::new(r"#.*").unwrap();
    let input = comments.replace_all(input, "");

    // Extract quoted strings first so their contents cannot break tokenization.
    let mut string_tokens: Vec<String> = Vec::new();
    let strings = Regex::new(r#""[^"]*""#).unwrap();
    let input = strings.replace_all(&input, |caps: &regex::Captures<'_>| {
        string_tokens.push(caps[0].to_string());
        format!("__STR_{}__", string_tokens.len() - 1)
    });

    let pattern = Regex::new(
        r"(?:\s*)(TOKENS|SYSTEM|USER|AS|TO|FROM|WITH|FIELDS|USING|FILTER|MODEL|KEY|URL|CONCURRENCY|STREAM|MERGE|SAVE|GENERATE|PROMPT|TEMPERATURE|\{|\}|=|>=|<=|!=|>|<|;|,|\[|\]|__STR_\d+__|[\w\d./-]+)(?:\s*)",
    )
    .unwrap();

    let mut tokens: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(&input) {
        let mut token = caps[1].trim().to_string();
        if token.is_empty() {
            continue;
        }

        // Restore quoted strings.
        if token.starts_with("__STR_") && token.ends_with("__") {
            if let Ok(index) = token[6..token.len() - 2].parse::<usize>() {
                if index < string_tokens.len() {
                    token = string_tokens[index].clone();
                }
            }
        }

        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(SynError::tokenize("no recognizable tokens found"));
    }

    log::debug!("tokens: {}", tokens.join(", "));

    Ok(tokens)
}

/// Removes one layer of matching double or single quotes, if present.
pub(crate) fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
