// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! IPC Latency Harness Core Library
//!
//! Invokes external IPC measurement executables, retries transient failures,
//! and reduces repeated trials to a median latency. Provides the validated
//! configuration types and the run state machine used by the sweep.

pub mod config;
pub mod error;
pub mod invoker;
pub mod sampler;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigLoader, HarnessConfig, REFERENCE_MESSAGE_SIZES};
pub use error::{
    HardValidationError, HarnessError, HarnessResult, InvokeError, StateTransitionError,
};
pub use invoker::{
    AttemptOutcome, CommandLine, Invoker, ProcessOutput, ProcessRunner, RetryPolicy, SystemRunner,
};
pub use sampler::{LatencySource, SampleSet, Sampler};
pub use state::{RunState, RunStateMachine};
pub use types::{
    BufferSize, ExitState, MeasurementConfiguration, MessageSize, Microseconds, Transport,
    TransportKind, TrialCount,
};
