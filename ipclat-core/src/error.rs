// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for the IPC latency harness.
//!
//! This module defines explicit enum error types.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ExitState, MeasurementConfiguration, MessageSize, TransportKind};

/// Top-level error type for a harness run.
/// Every variant aborts the run; nothing is retried at this level.
#[derive(Debug, Error)]
pub enum HarnessError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Measurement Errors - No Partial Sample Sets
    // =========================================================================
    #[error("Measurement failed for {configuration}: {source}")]
    Execution {
        configuration: MeasurementConfiguration,
        #[source]
        source: InvokeError,
    },

    #[error("Sample set must have an odd, non-zero length (got {len})")]
    InvalidSampleSet { len: usize },

    #[error("Duplicate result for {transport} message size {message_size}")]
    DuplicateResult {
        transport: TransportKind,
        message_size: MessageSize,
    },

    // =========================================================================
    // Run State Errors
    // =========================================================================
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] StateTransitionError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors reject a configuration before any process is spawned.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Trial count must be odd and non-zero: {count}")]
    InvalidTrialCount { count: usize },

    #[error("Duplicate message size: {size}")]
    DuplicateMessageSize { size: u64 },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Failures of a single Invoker call (one trial, all of its attempts).
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Failed to spawn {program}: {reason}")]
    SpawnFailed { program: PathBuf, reason: String },

    #[error("Process failed with {last_status} after {attempts} attempts")]
    ExecutionFailure {
        attempts: u32,
        last_status: ExitState,
    },

    #[error("Unparseable measurement output {output:?}: {reason}")]
    ParseFailure { output: String, reason: String },
}

/// State transition errors for the run state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Run is in terminal state: {state}")]
    TerminalState { state: &'static str },
}

/// Result type alias using HarnessError.
pub type HarnessResult<T> = Result<T, HarnessError>;
