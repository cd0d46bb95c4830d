// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One-shot remote command execution and outcome classification.
//!
//! Every run ends in exactly one of four classes, which double as the
//! process exit code so scripts can branch on the kind of failure.

use russh::ChannelMsg;

use super::client::Connection;
use super::error::SshError;

/// Outcome class of a remote run. The discriminants are the process
/// exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Command finished with status 0 and wrote nothing to stderr.
    Success = 0,
    /// The command could not be started or reported a nonzero status.
    RunFailed = 10,
    /// The command exited 0 but wrote to stderr.
    RemoteStderr = 11,
    /// No session channel could be opened on the connection.
    SessionFailed = 12,
}

impl ExitClass {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// What a remote run produced, with its classification.
#[derive(Debug)]
pub struct RunOutcome {
    pub class: ExitClass,
    /// Human-readable failure detail; empty on success.
    pub message: String,
    /// Everything the command wrote to stdout.
    pub stdout: String,
}

/// Raw channel output before classification.
#[derive(Debug, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: Option<u32>,
}

/// Join user commands into the single line handed to the remote shell.
/// The trailing `exit` closes the login shell even when a command left
/// a subshell behind.
pub fn join_commands(commands: &[String]) -> String {
    let mut parts: Vec<&str> = commands.iter().map(String::as_str).collect();
    parts.push("exit");
    parts.join(" && ")
}

/// Run `commands` on the connection and classify the result.
pub async fn run_remote(conn: &Connection, commands: &[String]) -> RunOutcome {
    let channel = match conn.open_channel().await {
        Ok(channel) => channel,
        Err(e) => {
            return RunOutcome {
                class: ExitClass::SessionFailed,
                message: format!("could not open a session on {}: {e}", conn.host()),
                stdout: String::new(),
            }
        }
    };

    let line = join_commands(commands);
    tracing::debug!(host = conn.host(), command = %line, "exec");

    match execute_on(channel, &line).await {
        Ok(output) => classify(output),
        Err(e) => RunOutcome {
            class: ExitClass::RunFailed,
            message: e.to_string(),
            stdout: String::new(),
        },
    }
}

/// Run a single command and hand back the raw output, no classification.
/// Used for short probe commands where the caller interprets the reply.
pub async fn exec_capture(conn: &Connection, command: &str) -> Result<CommandOutput, SshError> {
    let channel = conn.open_channel().await?;
    execute_on(channel, command).await
}

async fn execute_on(
    mut channel: russh::Channel<russh::client::Msg>,
    command: &str,
) -> Result<CommandOutput, SshError> {
    channel.exec(true, command).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_status = None;

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
            ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
            ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
            _ => {}
        }
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_status,
    })
}

/// Classification is total: every combination of exit status and stderr
/// maps to exactly one class. A nonzero status wins over stderr noise.
fn classify(output: CommandOutput) -> RunOutcome {
    let (class, message) = match output.exit_status {
        Some(0) => {
            if output.stderr.trim().is_empty() {
                (ExitClass::Success, String::new())
            } else {
                (ExitClass::RemoteStderr, output.stderr.clone())
            }
        }
        Some(code) => (
            ExitClass::RunFailed,
            format!("Process exited with status {code}"),
        ),
        None => (
            ExitClass::RunFailed,
            "command did not report an exit status".to_string(),
        ),
    };

    RunOutcome {
        class,
        message,
        stdout: output.stdout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(stdout: &str, stderr: &str, exit_status: Option<u32>) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_status,
        }
    }

    #[test]
    fn join_appends_exit() {
        assert_eq!(join_commands(&[]), "exit");
        assert_eq!(join_commands(&["ls".into()]), "ls && exit");
        assert_eq!(
            join_commands(&["cd /tmp".into(), "ls".into()]),
            "cd /tmp && ls && exit"
        );
    }

    #[test]
    fn clean_run_is_success() {
        let outcome = classify(out("hello\n", "", Some(0)));
        assert_eq!(outcome.class, ExitClass::Success);
        assert_eq!(outcome.class.code(), 0);
        assert!(outcome.message.is_empty());
        assert_eq!(outcome.stdout, "hello\n");
    }

    #[test]
    fn stderr_output_taints_a_zero_exit() {
        let outcome = classify(out("partial", "warning: deprecated\n", Some(0)));
        assert_eq!(outcome.class, ExitClass::RemoteStderr);
        assert_eq!(outcome.class.code(), 11);
        assert!(outcome.message.contains("deprecated"));
    }

    #[test]
    fn whitespace_only_stderr_is_clean() {
        let outcome = classify(out("", " \n", Some(0)));
        assert_eq!(outcome.class, ExitClass::Success);
    }

    #[test]
    fn nonzero_status_wins_over_stderr() {
        let outcome = classify(out("", "boom\n", Some(127)));
        assert_eq!(outcome.class, ExitClass::RunFailed);
        assert_eq!(outcome.class.code(), 10);
        assert_eq!(outcome.message, "Process exited with status 127");
    }

    #[test]
    fn missing_status_is_a_run_failure() {
        let outcome = classify(out("", "", None));
        assert_eq!(outcome.class, ExitClass::RunFailed);
    }
}
