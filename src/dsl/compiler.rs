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

//! Compiler lowering the Synx AST into an executable Python pipeline program.
//!
//! The compiler emits a fixed prelude (default globals, the save routine,
//! and the generation support functions), then walks the program's top-level
//! statements in order. Statements inside a FROM block are partitioned into
//! three phases — configuration, generate, save — and emitted in that order
//! regardless of how they were written, so the dataset-load call always sees
//! the accumulated field and filter state. Top-level WITH blocks are NOT
//! partitioned: their statements are recompiled as ordinary top-level
//! statements, a deliberate asymmetry from the in-FROM case.
//!
//! Compilation cannot fail. Programs that are syntactically valid but
//! semantically wrong (a GENERATE before any dataset is loaded, a MERGE of
//! unknown names) compile successfully and fail when the generated program
//! runs. Compiling the same AST twice yields byte-identical output.

use crate::dsl::ast::{
    SynFilterOp, SynFilterValue, SynGenerateStatement, SynPragmaStatement, SynProgram,
    SynPromptKind, SynPromptStatement, SynStatement, SynUsingBlock, SynUsingKind,
    SynUsingStatement, SynWithKind,
};

/// Transient state for a single compile call: the dataset variables emitted
/// so far (to keep generated identifiers unique and stable) and whether
/// PRAGMA AUTOSAVE has enabled interrupt-handling emission. The flag change
/// is order-dependent: handler registration is emitted in place at the point
/// the pragma occurs, never retroactively.
#[derive(Debug, Default)]
struct SynCompileContext {
    datasets: Vec<String>,
    autosave: bool,
}

impl SynCompileContext {
    fn register_dataset(&mut self, variable: &str) {
        if !self.datasets.iter().any(|known| known == variable) {
            self.datasets.push(variable.to_string());
        }
    }

    fn dataset_count(&self) -> usize {
        self.datasets.len()
    }
}

/// Lowers parsed programs into Python source text.
#[derive(Debug, Default)]
pub struct SynCompiler;

impl SynCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles the program. A fresh [`SynCompileContext`] is created per
    /// call and threaded through the lowering functions, so the compiler
    /// itself holds no state between calls.
    pub fn compile(&self, program: &SynProgram) -> String {
        let mut out = String::new();
        let mut context = SynCompileContext::default();

        emit_prelude(&mut out, &context);

        for statement in &program.statements {
            compile_statement(&mut out, statement, 1, &mut context);
        }

        out.push_str(
            "    # If no explicit save was performed, results are only saved on interrupt\n",
        );
        out.push_str("    # Automatic save on SIGINT is implemented through signal_handler\n\n");

        out.push_str("if __name__ == '__main__':\n");
        out.push_str("    main()\n");

        out
    }
}

/// Python import lines placed at the top of every generated program.
const IMPORTS: &[&str] = &[
    "import datasets",
    "from datasets import load_dataset, Dataset, concatenate_datasets",
    "import pandas as pd",
    "import os",
    "import sys",
    "import json",
    "from openai import AsyncOpenAI",
    "import time",
    "import asyncio",
    "from tqdm import tqdm",
    "import signal",
];

fn emit_prelude(out: &mut String, context: &SynCompileContext) {
    for import in IMPORTS {
        out.push_str(import);
        out.push('\n');
    }
    out.push('\n');

    out.push_str("def main():\n");

    out.push_str("    # Define debug mode\n");
    out.push_str("    debug = os.environ.get('SYN_DEBUG', '0') == '1'\n");
    out.push('\n');

    out.push_str("    # Default values\n");
    out.push_str("    concurrency = 1\n");
    out.push_str("    stream = False\n");
    out.push_str("    model = None\n");
    out.push_str("    api_key = None\n");
    out.push_str("    api_url = None\n");
    out.push_str("    output_file = 'output.json'\n");
    out.push_str("    loaded_datasets = {}\n");
    out.push_str("    was_saved = False\n");
    out.push_str("    prompt_templates = {}\n");
    out.push_str("    system_prompts = {}\n");
    out.push_str("    shutdown = False\n");
    out.push_str(&format!(
        "    sigint_handler_registered = {}  # Whether the SIGINT handler is registered\n",
        python_bool(context.autosave)
    ));
    out.push('\n');

    out.push_str(SIGNAL_HANDLER);

    // The handler definition is always emitted; registration only happens
    // here when interrupt handling was enabled before traversal began.
    if context.autosave {
        out.push_str("    signal.signal(signal.SIGINT, signal_handler)\n\n");
    } else {
        out.push_str("    # SIGINT signal handler is disabled\n\n");
    }

    out.push_str(SAVE_ROUTINE);
    out.push_str(API_CALL_ROUTINE);
    out.push_str(PROCESS_ITEM_ROUTINE);
    out.push_str(GENERATE_BATCH_ROUTINE);
    out.push_str(GENERATE_SYNC_ROUTINE);
    out.push_str(LOAD_DATASET_ROUTINE);
}

/// Handler for Ctrl+C inside the generated program. The generated program is
/// responsible for its own interruption; the executor never forwards signals.
const SIGNAL_HANDLER: &str = r#"    # Ctrl+C signal handler
    def signal_handler(sig, frame):
        nonlocal shutdown
        if shutdown:
            return  # Already handling a signal
        print('\n🛑 Termination signal received. Saving current results...')
        shutdown = True
        # Save current results
        save_current_results()
        print('👋 Shutting down.')
        # Explicitly terminate the process with code 0
        sys.exit(0)

"#;

/// Saves the most recently registered dataset, inventing an emergency
/// filename when no SAVE statement ran.
const SAVE_ROUTINE: &str = r#"    # Function to save current results
    def save_current_results():
        if not loaded_datasets:
            print('❌ No data to save.')
            return

        # Pick the most recently registered dataset
        last_dataset_name = list(loaded_datasets.keys())[-1]
        last_dataset = loaded_datasets[last_dataset_name]

        # Create the output directory if it does not exist
        os.makedirs('output', exist_ok=True)

        # Generate an emergency filename if no name was specified
        save_filename = output_file
        if not was_saved:
            timestamp = time.strftime('%Y%m%d_%H%M%S')
            save_filename = f'emergency_save_{timestamp}.json'

        # Full paths for the dataset directory and the JSON copy
        dataset_dir = os.path.join('output', os.path.splitext(save_filename)[0])
        json_path = os.path.join('output', save_filename)

        # Skip the save if the directory already exists
        if os.path.exists(dataset_dir):
            print(f'ℹ️ Dataset already saved to {dataset_dir}. Skipping re-save.')
            return

        print(f'💾 Saving dataset {last_dataset_name} to {dataset_dir}...')

        try:
            # Save the dataset in its native on-disk format
            last_dataset.save_to_disk(dataset_dir)

            # Also write a JSON copy for compatibility
            with open(json_path, 'w', encoding='utf-8') as f:
                json.dump([item for item in last_dataset], f, ensure_ascii=False, indent=2)

            print(f'✅ Done! Processed {last_dataset.num_rows} records. Dataset saved to {dataset_dir} and as JSON to {json_path}')
        except Exception as e:
            print(f'❌ Error saving results: {e}')

"#;

/// Single API call with error containment: failures degrade to an embedded
/// error marker in the result, never an aborted batch.
const API_CALL_ROUTINE: &str = r#"    # Function for asynchronous LLM API calls
    async def call_openai_api_async(prompt, model_name='gpt-3.5-turbo', temperature=0.7, max_tokens=1024, semaphore=None, system_prompt=None):
        client = None

        # If a semaphore is provided, use it to bound concurrency
        async with semaphore or asyncio.Semaphore(1):
            try:
                if debug:
                    print(f'Request to model {model_name} with temperature {temperature}')
                    print(f'Prompt: {prompt[:100]}...' if len(prompt) > 100 else f'Prompt: {prompt}')
                    if system_prompt:
                        print(f'System prompt: {system_prompt[:100]}...' if len(system_prompt) > 100 else f'System prompt: {system_prompt}')

                client = AsyncOpenAI(api_key=api_key, base_url=api_url if api_url else None)

                # Build the message list depending on the system prompt
                messages = []
                if system_prompt:
                    messages.append({'role': 'system', 'content': system_prompt})
                messages.append({'role': 'user', 'content': prompt})

                response = await client.chat.completions.create(
                    model=model_name,
                    messages=messages,
                    temperature=temperature,
                    max_tokens=max_tokens,
                    timeout=20  # Timeout in seconds for the HTTP request
                )

                return response.choices[0].message.content.strip()
            except Exception as e:
                error_msg = str(e)
                print(f'Error calling LLM API: {error_msg}')
                if 'authentication' in error_msg.lower() or 'key' in error_msg.lower():
                    print('Problem with the API key. Check your key.')
                elif 'timeout' in error_msg.lower() or 'connection' in error_msg.lower():
                    print('Timeout exceeded. Check your connection or API availability.')
                return f'[Generation error: {error_msg}]'
            finally:
                # Close the client if possible
                if client and hasattr(client, 'close'):
                    try:
                        await client.close()
                    except:
                        pass

"#;

const PROCESS_ITEM_ROUTINE: &str = r#"    # Function for asynchronous processing of one dataset record
    async def process_item_async(item, source_field, target_field, model_name, temperature, max_tokens, prompt_template, semaphore, pbar=None):
        try:
            if shutdown:
                return item

            item_dict = dict(item)
            system_prompt = None

            # Check for a system prompt
            if prompt_template is not None and prompt_template in system_prompts:
                system_prompt = system_prompts[prompt_template]

            # Build the prompt from the template or the source field
            if prompt_template is not None and prompt_template in prompt_templates:
                template = prompt_templates[prompt_template]['template']
                fields = prompt_templates[prompt_template]['fields']

                # Substitute fields into the template
                prompt = template
                for field in fields:
                    if field in item_dict:
                        prompt = prompt.replace('{' + field + '}', str(item_dict[field]))
            else:
                # Use the source field directly
                if source_field in item_dict:
                    prompt = str(item_dict[source_field])
                else:
                    print(f'Warning: field {source_field} is missing in record')
                    prompt = ''

            # Generate the response
            response = await call_openai_api_async(prompt, model_name, temperature, max_tokens, semaphore, system_prompt)

            # Attach the result
            item_dict[target_field] = response
            return item_dict
        except Exception as e:
            print(f'Error processing record: {e}')
            return item
        finally:
            if pbar:
                pbar.update(1)

"#;

/// Batch driver: fixed-size chunks, semaphore-bounded concurrency within a
/// chunk, cooperative shutdown between chunks, partial results preserved.
const GENERATE_BATCH_ROUTINE: &str = r#"    # Function for asynchronous content generation over the whole dataset
    async def generate_content_async(dataset, source_field, target_field, model_name=None, temperature=0.7, max_tokens=1024, prompt_template=None):
        if model_name is None:
            if model is None:
                print('❌ Error: model not specified for generation')
                return dataset
            model_name = model

        if api_key is None:
            print('❌ Error: API key not specified for accessing the LLM API')
            return dataset

        print(f'🔄 Generating field {target_field} based on {source_field} using model {model_name}...')

        try:
            # Semaphore bounding in-flight requests
            semaphore = asyncio.Semaphore(concurrency)

            # Debug mode processes a small sample only
            if debug:
                sample_size = min(5, len(dataset))
                dataset_sample = dataset.select(range(sample_size))
            else:
                sample_size = len(dataset)
                dataset_sample = dataset

            print(f'Processing {sample_size} records...')

            all_items = list(dataset_sample)
            processed_items = []

            # Prepare the progress bar
            pbar = tqdm(total=sample_size, desc='Generation')

            # Process at most 100 records per chunk
            batch_size = min(100, sample_size)

            for i in range(0, sample_size, batch_size):
                if shutdown:
                    print('\n🛑 Stopping processing due to signal')
                    break

                # Current chunk
                current_batch = all_items[i:min(i+batch_size, sample_size)]
                batch_tasks = []

                # Create tasks for the current chunk
                for item in current_batch:
                    task = asyncio.create_task(process_item_async(
                        item, source_field, target_field, model_name,
                        temperature, max_tokens, prompt_template, semaphore, pbar
                    ))
                    batch_tasks.append(task)

                # Wait for the current chunk to complete
                batch_results = await asyncio.gather(*batch_tasks)
                processed_items.extend(batch_results)

                # Stop admitting new chunks once the shutdown flag is set,
                # keeping everything processed so far
                if shutdown:
                    print('\n🛑 Stopping after processing the current chunk...')
                    break

            pbar.close()

            print('✅ Generation completed!')

            if len(processed_items) < sample_size:
                print(f'ℹ️ Processed {len(processed_items)} out of {sample_size} records (stopped by user)')

            # Build a dataset from the processed records
            return Dataset.from_list(processed_items)
        except Exception as e:
            print(f'❌ Error generating content: {e}')
            # Keep whatever was processed
            if 'processed_items' in locals() and processed_items:
                print(f'💾 Saving {len(processed_items)} processed records...')
                return Dataset.from_list(processed_items)
            # Fall back to the original dataset
            return dataset

"#;

const GENERATE_SYNC_ROUTINE: &str = r#"    # Function for generating content (synchronous wrapper)
    def generate_content(dataset, source_field, target_field, model_name=None, temperature=0.7, max_tokens=1024, prompt_template=None):
        # Drive the asynchronous version through an event loop
        loop = asyncio.new_event_loop()
        asyncio.set_event_loop(loop)
        try:
            def handle_loop_signal():
                for task in asyncio.all_tasks(loop):
                    task.cancel()

            # Register a loop-level handler only when no script-level handler exists
            if not shutdown and not sigint_handler_registered:
                loop.add_signal_handler(signal.SIGINT, handle_loop_signal)

            return loop.run_until_complete(generate_content_async(
                dataset, source_field, target_field, model_name, temperature, max_tokens, prompt_template
            ))
        except (KeyboardInterrupt, asyncio.CancelledError):
            print('\n🛑 Processing interrupted by user.')
            return dataset
        finally:
            # Cancel any tasks still pending
            try:
                pending = asyncio.all_tasks(loop)
                for task in pending:
                    task.cancel()

                # Give the tasks a chance to finish cleanly
                if pending:
                    loop.run_until_complete(asyncio.gather(*pending, return_exceptions=True))
            except Exception:
                pass

            loop.close()

"#;

/// Dataset loading with field selection and filter application. Dotted
/// filter keys from FILTER blocks are not resolved for non-streaming
/// datasets; the loader warns and skips them.
const LOAD_DATASET_ROUTINE: &str = r#"    # Function to load a dataset
    def load_dataset_with_config(name, streaming=False, fields=None, filters=None):
        print(f'Loading dataset {name}...')
        ds = load_dataset(name, streaming=streaming)

        # Pick the train split when a DatasetDict comes back
        if not streaming and isinstance(ds, dict):
            if debug:
                print(f'Selecting the train split')
            ds = ds['train']

        # Apply filters
        if filters:
            if debug:
                print(f'Applying filters: {filters}')
            if streaming:
                ds = ds.filter(lambda x: all(x.get(k) is not None and eval(f"x['{k}'] {v['op']} {v['value']}") for k, v in filters.items()))
            else:
                for key, filter_info in filters.items():
                    if '.' in key:
                        print(f'Warning: nested filters are not supported yet: {key}')
                        continue
                    ds = ds.filter(lambda x: key in x and eval(f"x['{key}'] {filter_info['op']} {filter_info['value']}"))

        # Select fields
        if fields:
            if debug:
                print(f'Selecting fields: {fields}')
            ds = ds.select_columns(fields)

        return ds

"#;

/// Compiles one top-level statement.
fn compile_statement(
    out: &mut String,
    statement: &SynStatement,
    indent: usize,
    context: &mut SynCompileContext,
) {
    let pad = "    ".repeat(indent);

    match statement {
        SynStatement::From(from) => {
            // Unique, sanitized variable for this dataset
            let dataset_var = format!("ds_{}", sanitize_var_name(&from.dataset));
            context.register_dataset(&dataset_var);

            out.push_str(&format!("{}# Loading dataset {}\n", pad, from.dataset));

            // Per-dataset field and filter state
            out.push_str(&format!("{}fields_{} = []\n", pad, dataset_var));
            out.push_str(&format!("{}filters_{} = {{}}\n", pad, dataset_var));

            // Split the block into configuration, generate, and save phases,
            // preserving relative order within each phase
            let mut setup = Vec::new();
            let mut generates = Vec::new();
            let mut saves = Vec::new();

            if let Some(block) = &from.block {
                for inner in &block.statements {
                    match inner {
                        SynStatement::Generate(_) => generates.push(inner),
                        SynStatement::Save(_) => saves.push(inner),
                        _ => setup.push(inner),
                    }
                }
            }

            // 1. Configuration statements (FIELDS, USING, WITH, PROMPT, ...)
            for inner in setup {
                compile_block_statement(out, inner, indent, &dataset_var, context);
            }

            // 2. Load the dataset with the configured parameters
            out.push_str(&format!(
                "{}# Load the dataset with the configured parameters\n",
                pad
            ));
            out.push_str(&format!(
                "{}{} = load_dataset_with_config('{}', streaming=stream, fields=fields_{}, filters=filters_{})\n",
                pad, dataset_var, from.dataset, dataset_var, dataset_var
            ));
            out.push_str(&format!(
                "{}loaded_datasets['{}'] = {}\n",
                pad, dataset_var, dataset_var
            ));

            // 3. Generation statements run against the loaded dataset
            if !generates.is_empty() {
                out.push_str(&format!("{}# Generate new dataset fields\n", pad));
                for inner in generates {
                    compile_block_statement(out, inner, indent, &dataset_var, context);
                }
            }

            // 4. Save statements come last
            if !saves.is_empty() {
                out.push_str(&format!("{}# Save results\n", pad));
                for inner in saves {
                    compile_block_statement(out, inner, indent, &dataset_var, context);
                }
            }
        }

        SynStatement::With(with) => {
            match with.kind {
                SynWithKind::Concurrency(value) => {
                    out.push_str(&format!("{}concurrency = {}\n", pad, value));
                }
                SynWithKind::Stream => {
                    out.push_str(&format!("{}stream = True\n", pad));
                }
            }

            // A WITH block outside FROM recompiles its statements as ordinary
            // top-level statements, without phase partitioning
            if let Some(block) = &with.block {
                for inner in &block.statements {
                    compile_statement(out, inner, indent, context);
                }
            }
        }

        SynStatement::Pragma(pragma) => match pragma {
            SynPragmaStatement::Autosave => {
                context.autosave = true;
                out.push_str(&format!(
                    "{}# PRAGMA AUTOSAVE directive: enable autosave on SIGINT\n",
                    pad
                ));
                out.push_str(&format!("{}# Register the signal handler\n", pad));
                out.push_str(&format!(
                    "{}sigint_handler_registered = True  # Mark the SIGINT handler as registered\n",
                    pad
                ));
                out.push_str(&format!(
                    "{}signal.signal(signal.SIGINT, signal_handler)\n",
                    pad
                ));
            }
            SynPragmaStatement::Concurrency(value) => {
                out.push_str(&format!(
                    "{}# PRAGMA CONCURRENCY directive: set global concurrency\n",
                    pad
                ));
                out.push_str(&format!("{}concurrency = {}\n", pad, value));
            }
        },

        SynStatement::Fields(fields) => {
            // Outside a FROM block the selection applies to the shared state
            out.push_str(&format!(
                "{}fields = {}\n",
                pad,
                format_python_list(&fields.fields)
            ));
        }

        SynStatement::Using(using) => {
            emit_using(out, &pad, using);
        }

        SynStatement::UsingBlock(block) => {
            emit_using_block(out, &pad, block);
        }

        SynStatement::Filter(filter) => {
            out.push_str(&format!(
                "{}filters['{}'] = {{'op': '{}', 'value': {}}}\n",
                pad,
                filter.field,
                convert_operator_to_python(filter.op),
                format_python_value(&filter.value)
            ));
        }

        SynStatement::FilterBlock(block) => {
            for condition in &block.conditions {
                out.push_str(&format!(
                    "{}filters['{}.{}'] = {{'op': '{}', 'value': {}}}\n",
                    pad,
                    block.field,
                    condition.field,
                    convert_operator_to_python(condition.op),
                    format_python_value(&condition.value)
                ));
            }
        }

        SynStatement::Merge(merge) => {
            // Allocate a fresh variable for the merged dataset
            let merged_var = format!("merged_ds_{}", context.dataset_count() + 1);
            context.register_dataset(&merged_var);

            out.push_str(&format!("{}# Merge datasets\n", pad));
            out.push_str(&format!("{}{} = concatenate_datasets([", pad, merged_var));

            for (index, name) in merge.datasets.iter().enumerate() {
                out.push_str(&format!("ds_{}", sanitize_var_name(name)));
                if index < merge.datasets.len() - 1 {
                    out.push_str(", ");
                }
            }

            out.push_str("])\n");

            out.push_str(&format!(
                "{}loaded_datasets['{}'] = {}\n",
                pad, merged_var, merged_var
            ));
        }

        SynStatement::Save(save) => {
            out.push_str(&format!("{}# Save to file\n", pad));
            out.push_str(&format!("{}output_file = '{}'\n", pad, save.filename));
            out.push_str(&format!("{}was_saved = True\n", pad));
            out.push_str(&format!("{}# Save the dataset\n", pad));
            out.push_str(&format!("{}save_current_results()\n", pad));
        }

        SynStatement::Prompt(prompt) => {
            emit_prompt(out, &pad, prompt);
        }

        SynStatement::Generate(generate) => {
            out.push_str(&format!(
                "{}# Generate field {} based on {}\n",
                pad, generate.target_field, generate.source_field
            ));

            let (model_arg, prompt_arg) = generate_call_args(generate);

            // At top level the call targets the most recently registered dataset
            out.push_str(&format!(
                "{}# Pick the most recently loaded dataset\n",
                pad
            ));
            out.push_str(&format!(
                "{}last_dataset_name = list(loaded_datasets.keys())[-1]\n",
                pad
            ));
            out.push_str(&format!(
                "{}last_dataset = loaded_datasets[last_dataset_name]\n",
                pad
            ));

            out.push_str(&format!("{}# Run asynchronous content generation\n", pad));
            out.push_str(&format!(
                "{}last_dataset = generate_content(last_dataset, '{}', '{}', {}, {:.1}, {}, {})\n",
                pad,
                generate.source_field,
                generate.target_field,
                model_arg,
                generate.temperature,
                generate.tokens,
                prompt_arg
            ));

            out.push_str(&format!(
                "{}loaded_datasets[last_dataset_name] = last_dataset\n",
                pad
            ));
        }
    }
}

/// Compiles a statement inside a FROM block, where field and filter state is
/// tracked per dataset variable.
fn compile_block_statement(
    out: &mut String,
    statement: &SynStatement,
    indent: usize,
    dataset_var: &str,
    context: &mut SynCompileContext,
) {
    let pad = "    ".repeat(indent);

    match statement {
        SynStatement::Fields(fields) => {
            out.push_str(&format!(
                "{}fields_{} = {}\n",
                pad,
                dataset_var,
                format_python_list(&fields.fields)
            ));
        }

        SynStatement::Filter(filter) => {
            out.push_str(&format!(
                "{}filters_{}['{}'] = {{'op': '{}', 'value': {}}}\n",
                pad,
                dataset_var,
                filter.field,
                convert_operator_to_python(filter.op),
                format_python_value(&filter.value)
            ));
        }

        SynStatement::FilterBlock(block) => {
            for condition in &block.conditions {
                out.push_str(&format!(
                    "{}filters_{}['{}.{}'] = {{'op': '{}', 'value': {}}}\n",
                    pad,
                    dataset_var,
                    block.field,
                    condition.field,
                    convert_operator_to_python(condition.op),
                    format_python_value(&condition.value)
                ));
            }
        }

        SynStatement::Using(using) => {
            emit_using(out, &pad, using);
        }

        SynStatement::UsingBlock(block) => {
            emit_using_block(out, &pad, block);
        }

        SynStatement::With(with) => {
            match with.kind {
                SynWithKind::Concurrency(value) => {
                    out.push_str(&format!("{}concurrency = {}\n", pad, value));
                }
                SynWithKind::Stream => {
                    out.push_str(&format!("{}stream = True\n", pad));
                }
            }

            // Inside FROM, a nested WITH block keeps the generate-last rule:
            // everything else first, then the generation statements
            if let Some(block) = &with.block {
                let mut generates = Vec::new();
                let mut others = Vec::new();

                for inner in &block.statements {
                    match inner {
                        SynStatement::Generate(_) => generates.push(inner),
                        _ => others.push(inner),
                    }
                }

                for inner in others {
                    compile_block_statement(out, inner, indent, dataset_var, context);
                }

                for inner in generates {
                    compile_block_statement(out, inner, indent, dataset_var, context);
                }
            }
        }

        SynStatement::Generate(generate) => {
            out.push_str(&format!(
                "{}# Generate field {} based on {}\n",
                pad, generate.target_field, generate.source_field
            ));

            let (model_arg, prompt_arg) = generate_call_args(generate);

            out.push_str(&format!("{}# Run asynchronous content generation\n", pad));
            out.push_str(&format!(
                "{}{} = generate_content({}, '{}', '{}', {}, {:.1}, {}, {})\n",
                pad,
                dataset_var,
                dataset_var,
                generate.source_field,
                generate.target_field,
                model_arg,
                generate.temperature,
                generate.tokens,
                prompt_arg
            ));

            out.push_str(&format!(
                "{}loaded_datasets['{}'] = {}\n",
                pad, dataset_var, dataset_var
            ));
        }

        SynStatement::Save(save) => {
            out.push_str(&format!("{}# Save the dataset to a file\n", pad));
            out.push_str(&format!("{}output_file = '{}'\n", pad, save.filename));
            out.push_str(&format!("{}was_saved = True\n", pad));
            out.push_str(&format!("{}save_current_results()\n", pad));
        }

        SynStatement::Prompt(prompt) => {
            emit_prompt(out, &pad, prompt);
        }

        // Nested FROM, MERGE, and PRAGMA have no FROM-local lowering and
        // emit nothing inside a block
        SynStatement::From(_) | SynStatement::Merge(_) | SynStatement::Pragma(_) => {}
    }
}

fn emit_using(out: &mut String, pad: &str, using: &SynUsingStatement) {
    match using.kind {
        SynUsingKind::Model => {
            out.push_str(&format!("{}model = '{}'\n", pad, using.value));
        }
        SynUsingKind::Key => {
            out.push_str(&format!("{}api_key = '{}'\n", pad, using.value));
        }
        SynUsingKind::Url => {
            out.push_str(&format!("{}api_url = '{}'\n", pad, using.value));
        }
    }
}

fn emit_using_block(out: &mut String, pad: &str, block: &SynUsingBlock) {
    for statement in &block.statements {
        emit_using(out, pad, statement);
    }
}

fn emit_prompt(out: &mut String, pad: &str, prompt: &SynPromptStatement) {
    out.push_str(&format!(
        "{}# Define prompt template {}\n",
        pad, prompt.name
    ));

    match prompt.kind {
        SynPromptKind::System => {
            // System prompts store the text only
            out.push_str(&format!(
                "{}system_prompts['{}'] = '{}'\n",
                pad, prompt.name, prompt.template
            ));
        }
        SynPromptKind::User => {
            // User prompts store the template plus its substitution fields
            out.push_str(&format!(
                "{}prompt_templates['{}'] = {{\n",
                pad, prompt.name
            ));
            out.push_str(&format!(
                "{}    'template': '{}',\n",
                pad, prompt.template
            ));
            out.push_str(&format!(
                "{}    'fields': {}\n",
                pad,
                format_python_list(&prompt.fields)
            ));
            out.push_str(&format!("{}}}\n", pad));
        }
    }
}

/// Resolves the model and prompt arguments for a generation call. Only the
/// first declared prompt template is used; extra names are reported and
/// ignored.
fn generate_call_args(generate: &SynGenerateStatement) -> (String, String) {
    let model_arg = match &generate.model {
        Some(model) => format!("'{}'", model),
        None => "None".to_string(),
    };

    let prompt_arg = match generate.prompt_templates.first() {
        Some(first) => {
            if generate.prompt_templates.len() > 1 {
                log::warn!(
                    "GENERATE lists {} prompt templates; only the first ('{}') is used",
                    generate.prompt_templates.len(),
                    first
                );
            }
            format!("'{}'", first)
        }
        None => "None".to_string(),
    };

    (model_arg, prompt_arg)
}

/// Maps a DSL comparison operator to its Python spelling.
fn convert_operator_to_python(op: SynFilterOp) -> &'static str {
    match op {
        SynFilterOp::Eq => "==",
        SynFilterOp::Gt => ">",
        SynFilterOp::Lt => "<",
        SynFilterOp::Ge => ">=",
        SynFilterOp::Le => "<=",
        SynFilterOp::Ne => "!=",
    }
}

/// Formats a string list as a Python list literal.
fn format_python_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Formats a filter value as a Python literal.
fn format_python_value(value: &SynFilterValue) -> String {
    match value {
        SynFilterValue::Str(text) => format!("'{}'", text),
        SynFilterValue::Int(number) => number.to_string(),
    }
}

/// Derives a valid, stable Python identifier fragment from a dataset name by
/// replacing path separators, dashes, and dots with underscores.
pub fn sanitize_var_name(name: &str) -> String {
    name.replace(['/', '-', '.'], "_")
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
