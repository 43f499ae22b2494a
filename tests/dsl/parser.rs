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

use synx::dsl::{
    tokenize, SynFilterOp, SynFilterValue, SynParser, SynPragmaStatement, SynProgram,
    SynPromptKind, SynStatement, SynUsingKind, SynWithKind,
};
use synx::errors::{Result, SynError};

fn parse(input: &str) -> Result<SynProgram> {
    let tokens = tokenize(input)?;
    SynParser::new(tokens).parse()
}

fn parse_error(input: &str) -> String {
    match parse(input).unwrap_err() {
        SynError::Parse { message } => message,
        other => panic!("expected parse error, got: {other:?}"),
    }
}

#[test]
fn parser_consumes_every_token_of_a_well_formed_program() {
    let source = r#"
        PRAGMA AUTOSAVE
        WITH CONCURRENCY 8
        FROM squad {
            FIELDS ["question", "answers"]
            FILTER difficulty >= 8
            SAVE "output.json"
        }
        MERGE [ds_one, ds_two]
    "#;

    let tokens = tokenize(source).unwrap();
    let count = tokens.len();
    let mut parser = SynParser::new(tokens);
    parser.parse().unwrap();

    assert_eq!(parser.position(), count);
    assert_eq!(parser.token_count(), count);
}

#[test]
fn from_block_keeps_fields_and_save_statements() {
    let program = parse("FROM squad {\n    FIELDS [\"question\", \"answers\"]\n    SAVE \"output.json\"\n}").unwrap();

    assert_eq!(program.statements.len(), 1);

    let from = match &program.statements[0] {
        SynStatement::From(from) => from,
        other => panic!("expected FROM, got: {other:?}"),
    };
    assert_eq!(from.dataset, "squad");

    let block = from.block.as_ref().expect("block");
    assert_eq!(block.statements.len(), 2);

    match &block.statements[0] {
        SynStatement::Fields(fields) => {
            assert_eq!(fields.fields, vec!["question", "answers"]);
        }
        other => panic!("expected FIELDS, got: {other:?}"),
    }

    match &block.statements[1] {
        SynStatement::Save(save) => assert_eq!(save.filename, "output.json"),
        other => panic!("expected SAVE, got: {other:?}"),
    }
}

#[test]
fn from_without_block_has_no_block() {
    let program = parse("FROM squad").unwrap();
    match &program.statements[0] {
        SynStatement::From(from) => {
            assert_eq!(from.dataset, "squad");
            assert!(from.block.is_none());
        }
        other => panic!("expected FROM, got: {other:?}"),
    }
}

#[test]
fn standalone_filter_keeps_integer_values_typed() {
    let program = parse("FILTER difficulty >= 8").unwrap();

    match &program.statements[0] {
        SynStatement::Filter(filter) => {
            assert_eq!(filter.field, "difficulty");
            assert_eq!(filter.op, SynFilterOp::Ge);
            assert_eq!(filter.value, SynFilterValue::Int(8));
        }
        other => panic!("expected FILTER, got: {other:?}"),
    }
}

#[test]
fn standalone_filter_unquotes_string_values() {
    let program = parse("FILTER language = \"English\"").unwrap();

    match &program.statements[0] {
        SynStatement::Filter(filter) => {
            assert_eq!(filter.op, SynFilterOp::Eq);
            assert_eq!(filter.value, SynFilterValue::Str("English".to_string()));
        }
        other => panic!("expected FILTER, got: {other:?}"),
    }
}

#[test]
fn filter_block_collects_subfield_conditions() {
    let program = parse("FILTER metadata { score >= 5; language = en }").unwrap();

    match &program.statements[0] {
        SynStatement::FilterBlock(block) => {
            assert_eq!(block.field, "metadata");
            assert_eq!(block.conditions.len(), 2);
            assert_eq!(block.conditions[0].field, "score");
            assert_eq!(block.conditions[0].value, SynFilterValue::Int(5));
            assert_eq!(block.conditions[1].field, "language");
            assert_eq!(
                block.conditions[1].value,
                SynFilterValue::Str("en".to_string())
            );
        }
        other => panic!("expected FILTER block, got: {other:?}"),
    }
}

#[test]
fn filter_rejects_unknown_operators() {
    let message = parse_error("FILTER difficulty LIKE 8");
    assert!(message.contains("expected operator"));
}

#[test]
fn merge_requires_at_least_two_datasets() {
    let message = parse_error("MERGE [only_one]");
    assert!(message.contains("at least two datasets"));
}

#[test]
fn merge_accepts_comma_form_and_list_form() {
    let program = parse("MERGE first, second").unwrap();
    match &program.statements[0] {
        SynStatement::Merge(merge) => {
            assert_eq!(merge.datasets, vec!["first", "second"]);
        }
        other => panic!("expected MERGE, got: {other:?}"),
    }

    let program = parse("MERGE [a, b, c]").unwrap();
    match &program.statements[0] {
        SynStatement::Merge(merge) => {
            assert_eq!(merge.datasets, vec!["a", "b", "c"]);
        }
        other => panic!("expected MERGE, got: {other:?}"),
    }
}

#[test]
fn merge_without_comma_is_rejected() {
    let message = parse_error("MERGE first second");
    assert!(message.contains("expected comma"));
}

#[test]
fn generate_without_block_applies_defaults() {
    let program = parse("GENERATE question AS answer").unwrap();

    match &program.statements[0] {
        SynStatement::Generate(generate) => {
            assert_eq!(generate.source_field, "question");
            assert_eq!(generate.target_field, "answer");
            assert_eq!(generate.model, None);
            assert_eq!(generate.temperature, 0.7);
            assert_eq!(generate.tokens, 1024);
            assert!(generate.prompt_templates.is_empty());
        }
        other => panic!("expected GENERATE, got: {other:?}"),
    }
}

#[test]
fn generate_block_overrides_parameters() {
    let program = parse(
        "GENERATE question TO translation {\n    MODEL \"gpt-4o-mini\"\n    TEMPERATURE 0.3;\n    TOKENS 512\n    PROMPT first; PROMPT second\n}",
    )
    .unwrap();

    match &program.statements[0] {
        SynStatement::Generate(generate) => {
            assert_eq!(generate.model.as_deref(), Some("gpt-4o-mini"));
            assert_eq!(generate.temperature, 0.3);
            assert_eq!(generate.tokens, 512);
            assert_eq!(generate.prompt_templates, vec!["first", "second"]);
        }
        other => panic!("expected GENERATE, got: {other:?}"),
    }
}

#[test]
fn generate_requires_as_or_to() {
    let message = parse_error("GENERATE question answer");
    assert!(message.contains("expected 'AS' or 'TO'"));
}

#[test]
fn generate_rejects_non_numeric_parameters() {
    let message = parse_error("GENERATE q AS a { TEMPERATURE warm }");
    assert!(message.contains("expected numeric value for TEMPERATURE"));

    let message = parse_error("GENERATE q AS a { TOKENS many }");
    assert!(message.contains("expected integer value for TOKENS"));
}

#[test]
fn bare_prompt_parses_as_user_prompt() {
    let program = parse("PROMPT translate \"Translate this\"").unwrap();

    match &program.statements[0] {
        SynStatement::Prompt(prompt) => {
            assert_eq!(prompt.name, "translate");
            assert_eq!(prompt.template, "Translate this");
            assert_eq!(prompt.kind, SynPromptKind::User);
            assert!(prompt.fields.is_empty());
        }
        other => panic!("expected PROMPT, got: {other:?}"),
    }
}

#[test]
fn system_prompt_parses_with_system_kind() {
    let program = parse("SYSTEM PROMPT guard \"You are careful.\"").unwrap();

    match &program.statements[0] {
        SynStatement::Prompt(prompt) => {
            assert_eq!(prompt.name, "guard");
            assert_eq!(prompt.kind, SynPromptKind::System);
        }
        other => panic!("expected PROMPT, got: {other:?}"),
    }
}

#[test]
fn user_prompt_block_collects_fields_and_template() {
    let program =
        parse("USER PROMPT translate {\n    FIELDS [question]\n    \"Translate: {question}\"\n}")
            .unwrap();

    match &program.statements[0] {
        SynStatement::Prompt(prompt) => {
            assert_eq!(prompt.kind, SynPromptKind::User);
            assert_eq!(prompt.fields, vec!["question"]);
            assert_eq!(prompt.template, "Translate: {question}");
        }
        other => panic!("expected PROMPT, got: {other:?}"),
    }
}

#[test]
fn prompt_block_without_template_after_fields_is_rejected() {
    let message = parse_error("PROMPT p { FIELDS [question] }");
    assert!(message.contains("expected text template"));
}

#[test]
fn system_without_prompt_is_rejected() {
    let message = parse_error("SYSTEM GENERATE");
    assert!(message.contains("expected PROMPT after SYSTEM"));
}

#[test]
fn pragma_autosave_and_concurrency_parse() {
    let program = parse("PRAGMA AUTOSAVE\nPRAGMA CONCURRENCY 4").unwrap();

    assert_eq!(
        program.statements[0],
        SynStatement::Pragma(SynPragmaStatement::Autosave)
    );
    assert_eq!(
        program.statements[1],
        SynStatement::Pragma(SynPragmaStatement::Concurrency(4))
    );
}

#[test]
fn pragma_rejects_unknown_directives_and_bad_values() {
    let message = parse_error("PRAGMA TURBO");
    assert!(message.contains("unknown PRAGMA directive"));

    let message = parse_error("PRAGMA CONCURRENCY lots");
    assert!(message.contains("expected integer value for PRAGMA CONCURRENCY"));
}

#[test]
fn with_concurrency_and_stream_parse() {
    let program = parse("WITH CONCURRENCY 8\nWITH STREAM").unwrap();

    match &program.statements[0] {
        SynStatement::With(with) => {
            assert_eq!(with.kind, SynWithKind::Concurrency(8));
            assert!(with.block.is_none());
        }
        other => panic!("expected WITH, got: {other:?}"),
    }

    match &program.statements[1] {
        SynStatement::With(with) => assert_eq!(with.kind, SynWithKind::Stream),
        other => panic!("expected WITH, got: {other:?}"),
    }
}

#[test]
fn with_rejects_bad_concurrency_and_unknown_kinds() {
    let message = parse_error("WITH CONCURRENCY abc");
    assert!(message.contains("incorrect concurrency value"));

    let message = parse_error("WITH TURBO");
    assert!(message.contains("unknown WITH type"));
}

#[test]
fn using_single_and_block_forms_parse() {
    let program = parse("USING MODEL \"gpt-4o\"").unwrap();
    match &program.statements[0] {
        SynStatement::Using(using) => {
            assert_eq!(using.kind, SynUsingKind::Model);
            assert_eq!(using.value, "gpt-4o");
        }
        other => panic!("expected USING, got: {other:?}"),
    }

    let program =
        parse("USING {\n    MODEL m\n    KEY secret\n    URL \"http://localhost:8000/v1\"\n}")
            .unwrap();
    match &program.statements[0] {
        SynStatement::UsingBlock(block) => {
            assert_eq!(block.statements.len(), 3);
            assert_eq!(block.statements[0].kind, SynUsingKind::Model);
            assert_eq!(block.statements[1].kind, SynUsingKind::Key);
            assert_eq!(block.statements[2].kind, SynUsingKind::Url);
            assert_eq!(block.statements[2].value, "http://localhost:8000/v1");
        }
        other => panic!("expected USING block, got: {other:?}"),
    }
}

#[test]
fn using_rejects_unknown_kinds_in_both_forms() {
    let message = parse_error("USING TOKEN abc");
    assert!(message.contains("expected USING type"));

    let message = parse_error("USING { TOKEN abc }");
    assert!(message.contains("expected USING type"));
}

#[test]
fn nested_blocks_recurse_into_the_statement_dispatcher() {
    let program = parse(
        "FROM squad {\n    WITH CONCURRENCY 2 {\n        FIELDS [question]\n    }\n    SAVE out.json\n}",
    )
    .unwrap();

    let from = match &program.statements[0] {
        SynStatement::From(from) => from,
        other => panic!("expected FROM, got: {other:?}"),
    };
    let block = from.block.as_ref().expect("block");

    match &block.statements[0] {
        SynStatement::With(with) => {
            assert_eq!(with.kind, SynWithKind::Concurrency(2));
            let inner = with.block.as_ref().expect("nested block");
            assert!(matches!(inner.statements[0], SynStatement::Fields(_)));
        }
        other => panic!("expected WITH, got: {other:?}"),
    }
}

#[test]
fn unterminated_block_is_rejected() {
    let message = parse_error("FROM squad {\n    FIELDS [question]\n");
    assert!(message.contains("expected closing brace"));
}

#[test]
fn unexpected_leading_token_is_rejected() {
    let message = parse_error("LOAD squad");
    assert!(message.contains("unexpected token: LOAD"));
}

#[test]
fn fields_accepts_single_name_form() {
    let program = parse("FIELDS question").unwrap();
    match &program.statements[0] {
        SynStatement::Fields(fields) => assert_eq!(fields.fields, vec!["question"]),
        other => panic!("expected FIELDS, got: {other:?}"),
    }
}

#[test]
fn fields_rejects_an_empty_list() {
    let message = parse_error("FIELDS []");
    assert!(message.contains("at least one field"));
}
