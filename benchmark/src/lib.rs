// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! IPC Latency Sweep
//!
//! Runs the message-size sweep over both measurement transports and renders
//! the per-transport median latency tables.
//!
//! # Sweep
//!
//! - **POSIX pipe**: `posix_ipc_measurement <message_size>`
//! - **Mach port**: `mach_ipc_measurement <message_size> <receive_buffer_size>`
//!
//! Each (transport, message size) pair is sampled a fixed odd number of times
//! and reported as the median, in microseconds.

pub mod harness;
pub mod metrics;
pub mod reporter;

pub use harness::SweepHarness;
pub use metrics::{ResultEntry, ResultTable, SweepReport};
pub use reporter::{progress_line, ReporterError, TextReporter};
