// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Measurement process invocation.
//!
//! Runs one external measurement executable per attempt, reads the single
//! nanosecond value it prints and retries failed attempts under a bounded
//! [`RetryPolicy`]. Processes are spawned from an explicit argument vector;
//! no shell is involved.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{HardValidationError, HarnessError, HarnessResult, InvokeError};
use crate::sampler::LatencySource;
use crate::types::{ExitState, MeasurementConfiguration, Microseconds};

/// Attempts per trial in the reference harness (1 initial + 2 retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound accepted for a configured attempt limit.
const MAX_ATTEMPTS_LIMIT: u32 = 100;

/// Executable path plus discrete positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line for a configuration's executable inside `binary_dir`.
    pub fn for_configuration(binary_dir: &Path, configuration: &MeasurementConfiguration) -> Self {
        Self::new(binary_dir.join(configuration.kind().executable_name()))
            .args(configuration.arguments())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What a finished measurement process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ExitState,
    /// First line of stdout, if the process printed one.
    pub first_line: Option<String>,
}

/// Launches a process and blocks until it exits.
pub trait ProcessRunner {
    fn run(&mut self, command: &CommandLine) -> Result<ProcessOutput, InvokeError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, command: &CommandLine) -> Result<ProcessOutput, InvokeError> {
        let output = Command::new(command.program())
            .args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| InvokeError::SpawnFailed {
                program: command.program().to_path_buf(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().map(str::to_owned);

        Ok(ProcessOutput {
            status: output.status.into(),
            first_line,
        })
    }
}

/// Bounded retry policy for a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retry_on_malformed_output: bool,
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` launches per trial.
    pub fn new(max_attempts: u32) -> Result<Self, HardValidationError> {
        if max_attempts == 0 || max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(HardValidationError::InvalidFieldValue {
                field: "max_attempts",
                value: max_attempts.to_string(),
                reason: format!("Must be between 1 and {}", MAX_ATTEMPTS_LIMIT),
            });
        }
        Ok(Self {
            max_attempts,
            retry_on_malformed_output: false,
        })
    }

    /// Whether unparseable output from a successful exit consumes a retry
    /// instead of failing the trial outright.
    pub fn with_retry_on_malformed_output(mut self, retry: bool) -> Self {
        self.retry_on_malformed_output = retry;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retries_malformed_output(&self) -> bool {
        self.retry_on_malformed_output
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_on_malformed_output: false,
        }
    }
}

/// Result of one process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Exit code zero and a parseable reading.
    Success(Microseconds),
    /// Nonzero exit or signal; retryable.
    Failed(ExitState),
    /// Exit code zero but the output was missing or not an integer.
    Malformed { output: String, reason: String },
}

/// Parse the first stdout line of a measurement process.
///
/// The value is nanoseconds; the result is truncated to whole microseconds.
pub fn parse_measurement(first_line: Option<&str>) -> Result<Microseconds, InvokeError> {
    let line = first_line.ok_or_else(|| InvokeError::ParseFailure {
        output: String::new(),
        reason: "process printed no output".to_string(),
    })?;

    line.trim()
        .parse::<u64>()
        .map(Microseconds::from_nanos)
        .map_err(|e| InvokeError::ParseFailure {
            output: line.to_string(),
            reason: e.to_string(),
        })
}

/// Runs measurement executables and masks transient failures.
#[derive(Debug)]
pub struct Invoker<R = SystemRunner> {
    runner: R,
    policy: RetryPolicy,
    binary_dir: PathBuf,
    attempts_made: u64,
}

impl Invoker<SystemRunner> {
    /// Invoker that launches real processes from `binary_dir`.
    pub fn system(binary_dir: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self::new(SystemRunner, policy, binary_dir)
    }
}

impl<R: ProcessRunner> Invoker<R> {
    pub fn new(runner: R, policy: RetryPolicy, binary_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            policy,
            binary_dir: binary_dir.into(),
            attempts_made: 0,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn binary_dir(&self) -> &Path {
        &self.binary_dir
    }

    /// Total process launches so far, retries included.
    pub fn attempts_made(&self) -> u64 {
        self.attempts_made
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Launch the command once and classify the result.
    ///
    /// A spawn failure is returned as an error; it is never retried.
    pub fn attempt(&mut self, command: &CommandLine) -> Result<AttemptOutcome, InvokeError> {
        self.attempts_made += 1;
        let output = self.runner.run(command)?;

        if !output.status.is_success() {
            return Ok(AttemptOutcome::Failed(output.status));
        }

        match parse_measurement(output.first_line.as_deref()) {
            Ok(micros) => Ok(AttemptOutcome::Success(micros)),
            Err(InvokeError::ParseFailure { output, reason }) => {
                Ok(AttemptOutcome::Malformed { output, reason })
            }
            Err(e) => Err(e),
        }
    }

    /// Run the command until it succeeds or the attempt limit is reached.
    pub fn invoke(&mut self, command: &CommandLine) -> Result<Microseconds, InvokeError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match self.attempt(command)? {
                AttemptOutcome::Success(micros) => {
                    tracing::trace!(command = %command, attempt, micros = micros.get(), "Measurement succeeded");
                    return Ok(micros);
                }
                AttemptOutcome::Failed(status) => InvokeError::ExecutionFailure {
                    attempts: attempt,
                    last_status: status,
                },
                AttemptOutcome::Malformed { output, reason } => {
                    let failure = InvokeError::ParseFailure { output, reason };
                    if !self.policy.retries_malformed_output() {
                        tracing::error!(command = %command, attempt, error = %failure, "Malformed measurement output");
                        return Err(failure);
                    }
                    failure
                }
            };

            if attempt >= max_attempts {
                tracing::error!(command = %command, attempts = attempt, error = %failure, "Retries exhausted");
                return Err(failure);
            }

            tracing::warn!(
                command = %command,
                attempt,
                max_attempts,
                error = %failure,
                "Measurement attempt failed, retrying"
            );
        }
    }
}

impl<R: ProcessRunner> LatencySource for Invoker<R> {
    fn measure(&mut self, configuration: &MeasurementConfiguration) -> HarnessResult<Microseconds> {
        let command = CommandLine::for_configuration(&self.binary_dir, configuration);
        self.invoke(&command)
            .map_err(|source| HarnessError::Execution {
                configuration: *configuration,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferSize, MessageSize, Transport};
    use std::collections::VecDeque;

    /// Replays canned outputs and records every command it was asked to run.
    struct ScriptedRunner {
        outputs: VecDeque<ProcessOutput>,
        commands: Vec<CommandLine>,
    }

    impl ScriptedRunner {
        fn new(outputs: Vec<ProcessOutput>) -> Self {
            Self {
                outputs: outputs.into(),
                commands: Vec::new(),
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&mut self, command: &CommandLine) -> Result<ProcessOutput, InvokeError> {
            self.commands.push(command.clone());
            Ok(self.outputs.pop_front().unwrap_or_else(|| failure(1)))
        }
    }

    fn success(line: &str) -> ProcessOutput {
        ProcessOutput {
            status: ExitState::Code(0),
            first_line: Some(line.to_string()),
        }
    }

    fn failure(code: i32) -> ProcessOutput {
        ProcessOutput {
            status: ExitState::Code(code),
            first_line: None,
        }
    }

    fn command() -> CommandLine {
        CommandLine::new("/opt/bench/posix_ipc_measurement").arg("100")
    }

    #[test]
    fn test_parse_converts_nanos_to_micros() {
        assert_eq!(
            parse_measurement(Some("1500000")).unwrap(),
            Microseconds::new(1500)
        );
        assert_eq!(
            parse_measurement(Some("  12741 \r")).unwrap(),
            Microseconds::new(12)
        );
    }

    #[test]
    fn test_parse_rejects_missing_and_garbage() {
        assert!(matches!(
            parse_measurement(None),
            Err(InvokeError::ParseFailure { .. })
        ));
        assert!(matches!(
            parse_measurement(Some("")),
            Err(InvokeError::ParseFailure { .. })
        ));
        assert!(matches!(
            parse_measurement(Some("fast")),
            Err(InvokeError::ParseFailure { .. })
        ));
        assert!(matches!(
            parse_measurement(Some("-5")),
            Err(InvokeError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_first_attempt_success() {
        let runner = ScriptedRunner::new(vec![success("2000")]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");

        assert_eq!(invoker.invoke(&command()).unwrap(), Microseconds::new(2));
        assert_eq!(invoker.attempts_made(), 1);
    }

    #[test]
    fn test_fails_twice_then_succeeds() {
        let runner = ScriptedRunner::new(vec![failure(1), failure(2), success("7000")]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");

        assert_eq!(invoker.invoke(&command()).unwrap(), Microseconds::new(7));
        assert_eq!(invoker.attempts_made(), 3);
        assert_eq!(invoker.runner().commands.len(), 3);
    }

    #[test]
    fn test_always_failing_exhausts_after_three_attempts() {
        let runner = ScriptedRunner::new(vec![failure(4), failure(5), failure(6), success("1")]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");

        let err = invoker.invoke(&command()).unwrap_err();
        match err {
            InvokeError::ExecutionFailure {
                attempts,
                last_status,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_status, ExitState::Code(6));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(invoker.attempts_made(), 3);
    }

    #[test]
    fn test_signal_termination_is_retried() {
        let killed = ProcessOutput {
            status: ExitState::Signal(9),
            first_line: None,
        };
        let runner = ScriptedRunner::new(vec![killed, success("3000")]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");

        assert_eq!(invoker.invoke(&command()).unwrap(), Microseconds::new(3));
        assert_eq!(invoker.attempts_made(), 2);
    }

    #[test]
    fn test_malformed_output_fails_immediately_by_default() {
        let runner = ScriptedRunner::new(vec![success("oops"), success("1000")]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");

        let err = invoker.invoke(&command()).unwrap_err();
        assert!(matches!(err, InvokeError::ParseFailure { ref output, .. } if output == "oops"));
        assert_eq!(invoker.attempts_made(), 1);
    }

    #[test]
    fn test_malformed_output_consumes_retry_when_enabled() {
        let policy = RetryPolicy::default().with_retry_on_malformed_output(true);
        let runner = ScriptedRunner::new(vec![success("oops"), success("1000")]);
        let mut invoker = Invoker::new(runner, policy, "/opt/bench");

        assert_eq!(invoker.invoke(&command()).unwrap(), Microseconds::new(1));
        assert_eq!(invoker.attempts_made(), 2);
    }

    #[test]
    fn test_malformed_output_on_last_attempt_reports_parse_failure() {
        let policy = RetryPolicy::new(2)
            .unwrap()
            .with_retry_on_malformed_output(true);
        let runner = ScriptedRunner::new(vec![failure(1), success("")]);
        let mut invoker = Invoker::new(runner, policy, "/opt/bench");

        let err = invoker.invoke(&command()).unwrap_err();
        assert!(matches!(err, InvokeError::ParseFailure { .. }));
        assert_eq!(invoker.attempts_made(), 2);
    }

    #[test]
    fn test_retry_policy_bounds() {
        assert!(RetryPolicy::new(0).is_err());
        assert!(RetryPolicy::new(1).is_ok());
        assert!(RetryPolicy::new(101).is_err());
        assert_eq!(RetryPolicy::default().max_attempts(), 3);
        assert!(!RetryPolicy::default().retries_malformed_output());
    }

    #[test]
    fn test_measure_builds_transport_command_line() {
        let runner = ScriptedRunner::new(vec![success("5000"), success("6000")]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");

        let posix =
            MeasurementConfiguration::new(Transport::PosixPipe, MessageSize::new(100).unwrap());
        let mach = MeasurementConfiguration::new(
            Transport::MachPort {
                receive_buffer_size: BufferSize::MACH_DEFAULT,
            },
            MessageSize::new(8192).unwrap(),
        );

        assert_eq!(invoker.measure(&posix).unwrap(), Microseconds::new(5));
        assert_eq!(invoker.measure(&mach).unwrap(), Microseconds::new(6));

        let commands = &invoker.runner().commands;
        assert_eq!(
            commands[0].program(),
            Path::new("/opt/bench/posix_ipc_measurement")
        );
        assert_eq!(commands[0].arguments(), ["100"]);
        assert_eq!(
            commands[1].program(),
            Path::new("/opt/bench/mach_ipc_measurement")
        );
        assert_eq!(commands[1].arguments(), ["8192", "4096"]);
    }

    #[test]
    fn test_measure_wraps_failure_with_configuration() {
        let runner = ScriptedRunner::new(vec![failure(1), failure(1), failure(1)]);
        let mut invoker = Invoker::new(runner, RetryPolicy::default(), "/opt/bench");
        let config =
            MeasurementConfiguration::new(Transport::PosixPipe, MessageSize::new(500).unwrap());

        let err = invoker.measure(&config).unwrap_err();
        match err {
            HarnessError::Execution {
                configuration,
                source: InvokeError::ExecutionFailure { attempts: 3, .. },
            } => assert_eq!(configuration, config),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_command_line_display() {
        let cmd = CommandLine::new("/bin/mach_ipc_measurement").args(["100", "4096"]);
        assert_eq!(cmd.to_string(), "/bin/mach_ipc_measurement 100 4096");
    }
}
