// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::fmt;
use std::process::ExitStatus;

use crate::error::HardValidationError;

/// Nanoseconds per microsecond, the divisor applied to every reported value.
const NANOS_PER_MICRO: u64 = 1_000;

/// Validated message size in bytes.
/// Must be positive (non-zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageSize(u64);

impl MessageSize {
    /// Create a new MessageSize with validation.
    pub fn new(bytes: u64) -> Result<Self, HardValidationError> {
        if bytes == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "message_size",
                value: "0".to_string(),
                reason: "Message size must be at least one byte".to_string(),
            });
        }
        Ok(Self(bytes))
    }

    /// Get the size in bytes.
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for MessageSize {
    type Error = HardValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageSize> for u64 {
    fn from(size: MessageSize) -> Self {
        size.0
    }
}

/// Validated receive buffer size in bytes for the Mach transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferSize(u64);

impl BufferSize {
    /// Buffer size the reference sweep hands to every Mach invocation.
    pub const MACH_DEFAULT: BufferSize = BufferSize(4096);

    /// Create a new BufferSize with validation.
    pub fn new(bytes: u64) -> Result<Self, HardValidationError> {
        if bytes == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "mach_receive_buffer_size",
                value: "0".to_string(),
                reason: "Receive buffer size must be non-zero".to_string(),
            });
        }
        Ok(Self(bytes))
    }

    /// Get the size in bytes.
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of trials per configuration.
/// Always odd and non-zero so the median is a single observed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialCount(usize);

impl TrialCount {
    /// Trial count of the reference sweep.
    pub const REFERENCE: TrialCount = TrialCount(201);

    /// Create a new TrialCount with validation.
    pub fn new(count: usize) -> Result<Self, HardValidationError> {
        if count == 0 || count % 2 == 0 {
            return Err(HardValidationError::InvalidTrialCount { count });
        }
        Ok(Self(count))
    }

    /// Get the number of trials.
    pub fn get(&self) -> usize {
        self.0
    }

    /// Index of the median in a sorted sample set of this length.
    pub fn median_index(&self) -> usize {
        self.0 / 2
    }
}

impl fmt::Display for TrialCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single latency observation in whole microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Microseconds(u64);

impl Microseconds {
    /// Wrap a value already expressed in microseconds.
    pub const fn new(micros: u64) -> Self {
        Self(micros)
    }

    /// Convert a nanosecond reading, truncating the sub-microsecond remainder.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos / NANOS_PER_MICRO)
    }

    /// Get the inner value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Microseconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Microseconds> for u64 {
    fn from(micros: Microseconds) -> Self {
        micros.0
    }
}

/// Parameter-free transport selector, used as the result table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// POSIX pipes between a forked parent and child.
    PosixPipe,
    /// Mach messages through a bootstrap-registered port.
    MachPort,
}

impl TransportKind {
    /// Short name used in progress lines and report titles.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PosixPipe => "posix",
            Self::MachPort => "mach",
        }
    }

    /// File name of the measurement executable for this transport.
    pub const fn executable_name(&self) -> &'static str {
        match self {
            Self::PosixPipe => "posix_ipc_measurement",
            Self::MachPort => "mach_ipc_measurement",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A transport together with its fixed invocation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    PosixPipe,
    MachPort { receive_buffer_size: BufferSize },
}

impl Transport {
    /// Get the parameter-free selector.
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::PosixPipe => TransportKind::PosixPipe,
            Self::MachPort { .. } => TransportKind::MachPort,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PosixPipe => write!(f, "posix"),
            Self::MachPort {
                receive_buffer_size,
            } => write!(f, "mach (receive buffer {})", receive_buffer_size),
        }
    }
}

/// One benchmark point: a transport and a message size.
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasurementConfiguration {
    transport: Transport,
    message_size: MessageSize,
}

impl MeasurementConfiguration {
    pub fn new(transport: Transport, message_size: MessageSize) -> Self {
        Self {
            transport,
            message_size,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn message_size(&self) -> MessageSize {
        self.message_size
    }

    /// Positional arguments the measurement executable expects.
    pub fn arguments(&self) -> Vec<String> {
        match self.transport {
            Transport::PosixPipe => vec![self.message_size.to_string()],
            Transport::MachPort {
                receive_buffer_size,
            } => vec![
                self.message_size.to_string(),
                receive_buffer_size.to_string(),
            ],
        }
    }
}

impl fmt::Display for MeasurementConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} message size {} bytes",
            self.transport, self.message_size
        )
    }
}

/// How a measurement process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    /// Exited normally with this status code.
    Code(i32),
    /// Killed by this signal.
    Signal(i32),
    /// Platform reported neither a code nor a signal.
    Unknown,
}

impl ExitState {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

impl From<ExitStatus> for ExitState {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }

        Self::Unknown
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {}", code),
            Self::Signal(signal) => write!(f, "signal {}", signal),
            Self::Unknown => write!(f, "unknown exit status"),
        }
    }
}
