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

//! The executor is interpreter-agnostic, so these tests drive it with `sh`
//! scripts: process supervision, exit classification, and cleanup behave
//! exactly as they do with the Python interpreter.

use synx::dsl::SynExecutor;
use synx::errors::SynError;

#[tokio::test]
async fn execute_removes_the_script_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.sh");

    let executor = SynExecutor::new("sh");
    executor
        .execute("echo hello\n", false, Some(path.as_path()))
        .await
        .unwrap();

    assert!(!path.exists());
}

#[tokio::test]
async fn execute_keeps_the_script_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keep.sh");

    let executor = SynExecutor::new("sh");
    executor
        .execute("echo kept\n", true, Some(path.as_path()))
        .await
        .unwrap();

    assert!(path.exists());
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "echo kept\n");
}

#[tokio::test]
async fn execute_uses_the_default_script_location() {
    let dir = tempfile::tempdir().unwrap();

    let executor = SynExecutor::new("sh").with_script_dir(dir.path());
    executor.execute("exit 0\n", true, None).await.unwrap();

    assert!(dir.path().join("syn_script.py").exists());
}

#[tokio::test]
async fn execute_creates_missing_destination_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/run.sh");

    let executor = SynExecutor::new("sh");
    executor.execute("exit 0\n", true, Some(path.as_path())).await.unwrap();

    assert!(path.exists());
}

#[tokio::test]
async fn nonzero_exit_carries_captured_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fail.sh");

    let executor = SynExecutor::new("sh");
    let err = executor
        .execute("echo some progress\necho boom >&2\nexit 1\n", false, Some(path.as_path()))
        .await
        .unwrap_err();

    match err {
        SynError::Execution {
            message,
            stdout,
            stderr,
        } => {
            assert!(message.contains("error executing generated program"));
            assert!(stdout.contains("some progress"));
            assert!(stderr.contains("boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn termination_via_sigint_counts_as_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interrupt.sh");

    // The child interrupts itself; the generated programs are expected to
    // handle interruption on their own, so this is a clean shutdown
    let executor = SynExecutor::new("sh");
    let result = executor
        .execute("kill -INT $$\n", false, Some(path.as_path()))
        .await;

    assert!(result.is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn termination_via_sigterm_counts_as_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terminate.sh");

    let executor = SynExecutor::new("sh");
    let result = executor
        .execute("kill -TERM $$\n", false, Some(path.as_path()))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn missing_interpreter_fails_to_launch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.sh");

    let executor = SynExecutor::new("/nonexistent/interpreter");
    let err = executor
        .execute("echo unreachable\n", false, Some(path.as_path()))
        .await
        .unwrap_err();

    match err {
        SynError::Execution { message, .. } => {
            assert!(message.contains("error starting interpreter"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_interpreter_path_defaults_to_python3() {
    // The default is part of the external contract; constructing the
    // executor must not panic and must carry the conventional name
    let executor = SynExecutor::new("");
    assert!(format!("{executor:?}").contains("python3"));
}
