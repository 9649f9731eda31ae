// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Result types for a completed sweep.
//!
//! The [`ResultTable`] keeps one median per (transport, message size) in the
//! order the sweep produced them. Lookup is by key; iteration is always in
//! insertion order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ipclat_core::{
    HarnessError, HarnessResult, MeasurementConfiguration, MessageSize, Microseconds,
    TransportKind, TrialCount,
};

/// Median latency for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEntry {
    pub configuration: MeasurementConfiguration,
    pub median: Microseconds,
}

/// Ordered store of per-configuration medians.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    entries: Vec<ResultEntry>,
    index: HashMap<(TransportKind, MessageSize), usize>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a median. Each (transport, message size) may be recorded once.
    pub fn insert(
        &mut self,
        configuration: MeasurementConfiguration,
        median: Microseconds,
    ) -> HarnessResult<()> {
        let key = (configuration.kind(), configuration.message_size());
        if self.index.contains_key(&key) {
            return Err(HarnessError::DuplicateResult {
                transport: key.0,
                message_size: key.1,
            });
        }

        self.index.insert(key, self.entries.len());
        self.entries.push(ResultEntry {
            configuration,
            median,
        });
        Ok(())
    }

    pub fn get(&self, transport: TransportKind, message_size: MessageSize) -> Option<Microseconds> {
        self.index
            .get(&(transport, message_size))
            .map(|&i| self.entries[i].median)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ResultEntry> {
        self.entries.iter()
    }

    /// Entries for one transport, in insertion order.
    pub fn rows(&self, transport: TransportKind) -> impl Iterator<Item = &ResultEntry> {
        self.entries
            .iter()
            .filter(move |e| e.configuration.kind() == transport)
    }

    /// Transports in the order their first entry was recorded.
    pub fn transports(&self) -> Vec<TransportKind> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            let kind = entry.configuration.kind();
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        seen
    }
}

/// A finished sweep with its run metadata.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub table: ResultTable,
    pub trials: TrialCount,
    /// Process launches across the whole sweep, retries included.
    pub attempts: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SweepReport {
    pub fn new(
        table: ResultTable,
        trials: TrialCount,
        attempts: u64,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            table,
            trials,
            attempts,
            started_at,
            finished_at,
        }
    }

    /// Wall-clock duration of the sweep in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Format a millisecond duration in human-readable form (auto-selects ms/s/m).
    pub fn format_duration(ms: u64) -> String {
        if ms < 1_000 {
            format!("{}ms", ms)
        } else if ms < 60_000 {
            format!("{:.2}s", ms as f64 / 1_000.0)
        } else {
            format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000)
        }
    }
}
