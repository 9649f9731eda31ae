// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Run state machine with typed state transitions.
//!
//! Implements the run lifecycle: Idle → Sweeping → Reporting → Done,
//! with a single failure edge Sweeping → Aborted.
//! Invalid transitions result in StateTransitionError.

use crate::error::StateTransitionError;
use crate::types::TransportKind;

/// Harness run states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing measured yet.
    Idle,

    /// Sampling the configuration at `size_index` of the sweep for `transport`.
    Sweeping {
        transport: TransportKind,
        size_index: usize,
    },

    /// Every configuration has a median; tables are being rendered.
    Reporting,

    /// Report emitted.
    Done,

    /// A configuration exhausted its retries. Terminal.
    Aborted,
}

impl RunState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Sweeping { .. } => "Sweeping",
            Self::Reporting => "Reporting",
            Self::Done => "Done",
            Self::Aborted => "Aborted",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: RunState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Sweeping { .. })
                | (Self::Sweeping { .. }, Self::Sweeping { .. })
                | (Self::Sweeping { .. }, Self::Reporting)
                | (Self::Sweeping { .. }, Self::Aborted)
                | (Self::Reporting, Self::Done)
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sweeping {
                transport,
                size_index,
            } => write!(f, "Sweeping({}, {})", transport, size_index),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// State machine for one harness run.
#[derive(Debug)]
pub struct RunStateMachine {
    current_state: RunState,
    transition_count: u64,
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: RunState::Idle,
            transition_count: 0,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> RunState {
        self.current_state
    }

    /// Get total number of transitions.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: RunState) -> Result<(), StateTransitionError> {
        if self.current_state.is_terminal() {
            return Err(StateTransitionError::TerminalState {
                state: self.current_state.name(),
            });
        }

        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::debug!(from = %self.current_state, to = %target, "Run state transition");

        self.current_state = target;
        self.transition_count += 1;

        Ok(())
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
