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

//! Executor supervising generated pipeline programs.
//!
//! The executor persists the generated program text, spawns the configured
//! interpreter on it, and streams the child's output line by line while
//! capturing it for diagnostics. Interrupt handling follows one rule: the
//! signal is never forwarded to the child. The generated program registers
//! its own handler when PRAGMA AUTOSAVE asked for one, so the executor only
//! stops listening after the first interrupt and races a fixed grace period
//! against the child's own shutdown, escalating to a forced kill if the
//! child outlives it. A child terminated by SIGINT or SIGTERM counts as
//! success; any other nonzero exit is an execution error.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::errors::{Result, SynError};

/// Interpreter used when none is configured.
const DEFAULT_INTERPRETER: &str = "python3";

/// Script filename used when the caller does not provide a destination.
const DEFAULT_SCRIPT_NAME: &str = "syn_script.py";

/// How long an interrupted child may keep running before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Runs generated programs as supervised child processes.
#[derive(Clone, Debug)]
pub struct SynExecutor {
    interpreter: String,
    script_dir: PathBuf,
    debug: bool,
}

impl SynExecutor {
    /// Creates an executor for the given interpreter path. An empty path
    /// selects the conventional `python3`.
    pub fn new(interpreter: impl Into<String>) -> Self {
        let interpreter = interpreter.into();
        Self {
            interpreter: if interpreter.is_empty() {
                DEFAULT_INTERPRETER.to_string()
            } else {
                interpreter
            },
            script_dir: PathBuf::from("output"),
            debug: false,
        }
    }

    /// Overrides the directory that receives generated scripts.
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    /// Enables or disables verbose diagnostics in the child process.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Directory that receives generated scripts by default.
    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    /// Writes `program` to `script_path` (or the default location), runs the
    /// interpreter on it, and supervises the process to completion. The
    /// script is removed afterwards unless `save_script` is set.
    pub async fn execute(
        &self,
        program: &str,
        save_script: bool,
        script_path: Option<&Path>,
    ) -> Result<()> {
        let path = match script_path {
            Some(path) => path.to_path_buf(),
            None => self.script_dir.join(DEFAULT_SCRIPT_NAME),
        };

        // Make sure the destination directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    SynError::Io(format!("error creating script directory: {}", err))
                })?;
            }
        }

        tokio::fs::write(&path, program)
            .await
            .map_err(|err| SynError::Io(format!("error saving generated script: {}", err)))?;

        log::debug!("executing generated program: {}", path.display());

        let mut child = Command::new(&self.interpreter)
            .arg(&path)
            .env("SYN_DEBUG", if self.debug { "1" } else { "0" })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                SynError::execution(
                    format!("error starting interpreter '{}': {}", self.interpreter, err),
                    String::new(),
                    String::new(),
                )
            })?;

        // Drain both output streams concurrently, mirroring them to our own
        // streams while capturing them for diagnostics
        let stdout_task = child
            .stdout
            .take()
            .map(|stream| tokio::spawn(drain_stream(stream, false)));
        let stderr_task = child
            .stderr
            .take()
            .map(|stream| tokio::spawn(drain_stream(stream, true)));

        let status = self.wait_for_exit(&mut child).await?;

        let stdout_text = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr_text = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            // A child terminated via interrupt or terminate handled the
            // signal itself; that is a clean shutdown, not a failure
            if interrupted_by_signal(&status) {
                log::info!("process interrupted by user");
                return Ok(());
            }

            return Err(SynError::execution(
                format!("error executing generated program: {}", status),
                stdout_text,
                stderr_text,
            ));
        }

        // Remove the temporary file unless the caller wants to keep it
        if !save_script {
            tokio::fs::remove_file(&path).await.map_err(|err| {
                SynError::Io(format!("error removing temporary file: {}", err))
            })?;
        }

        Ok(())
    }

    /// Waits for the child to exit. If an interrupt arrives first, the
    /// listener is dropped (no further signals are observed here), the
    /// signal is NOT forwarded, and the child gets a bounded grace period
    /// before a forced kill.
    async fn wait_for_exit(&self, child: &mut tokio::process::Child) -> Result<ExitStatus> {
        let status = tokio::select! {
            status = child.wait() => {
                status.map_err(|err| SynError::Io(format!("error waiting for process: {}", err)))?
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!(
                    "interrupt received; the generated program handles the signal itself if a handler was enabled"
                );

                match timeout(SHUTDOWN_GRACE, child.wait()).await {
                    Ok(status) => {
                        log::info!("interpreter process terminated");
                        status.map_err(|err| {
                            SynError::Io(format!("error waiting for process: {}", err))
                        })?
                    }
                    Err(_) => {
                        log::warn!("timed out waiting for the interpreter; killing the process");
                        child.kill().await.map_err(|err| {
                            SynError::Io(format!("error killing process: {}", err))
                        })?;
                        child.wait().await.map_err(|err| {
                            SynError::Io(format!("error waiting for process: {}", err))
                        })?
                    }
                }
            }
        };

        Ok(status)
    }
}

/// Forwards a child stream line by line and returns the captured text.
async fn drain_stream<R>(stream: R, to_stderr: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    let mut captured = String::new();

    while let Ok(Some(line)) = lines.next_line().await {
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
        captured.push_str(&line);
        captured.push('\n');
    }

    captured
}

#[cfg(unix)]
fn interrupted_by_signal(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    matches!(
        status.signal(),
        Some(signal) if signal == libc::SIGINT || signal == libc::SIGTERM
    )
}

#[cfg(not(unix))]
fn interrupted_by_signal(_status: &ExitStatus) -> bool {
    false
}
