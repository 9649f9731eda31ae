// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sweep harness for running every configuration of a benchmark run.
//!
//! Visits each transport in order and, for each, each message size in order.
//! Every configuration is sampled to a median and recorded in a
//! [`ResultTable`]. The first unrecoverable failure aborts the sweep.

use ipclat_core::{
    HarnessConfig, HarnessError, HarnessResult, LatencySource, MeasurementConfiguration,
    MessageSize, RunState, RunStateMachine, Sampler, Transport,
};

use crate::metrics::ResultTable;

/// Drives the sampler across the full transport × message size sweep.
#[derive(Debug)]
pub struct SweepHarness {
    sampler: Sampler,
    transports: Vec<Transport>,
    message_sizes: Vec<MessageSize>,
    state: RunStateMachine,
}

impl SweepHarness {
    /// Create a harness for the given sweep.
    pub fn new(
        sampler: Sampler,
        transports: Vec<Transport>,
        message_sizes: Vec<MessageSize>,
    ) -> Self {
        Self {
            sampler,
            transports,
            message_sizes,
            state: RunStateMachine::new(),
        }
    }

    /// Create a harness for a validated configuration.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(
            Sampler::new(config.trials),
            config.transports().to_vec(),
            config.message_sizes.clone(),
        )
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state.state()
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler
    }

    /// Every configuration in sweep order.
    pub fn configurations(&self) -> Vec<MeasurementConfiguration> {
        self.transports
            .iter()
            .flat_map(|&transport| {
                self.message_sizes
                    .iter()
                    .map(move |&size| MeasurementConfiguration::new(transport, size))
            })
            .collect()
    }

    /// Sample every configuration and collect the medians.
    ///
    /// `progress` is called once per configuration before it is sampled.
    /// On success the run is left in `Reporting`; on failure in `Aborted`.
    pub fn run<S, P>(&mut self, source: &mut S, mut progress: P) -> HarnessResult<ResultTable>
    where
        S: LatencySource + ?Sized,
        P: FnMut(&MeasurementConfiguration) -> std::io::Result<()>,
    {
        let mut table = ResultTable::new();

        for &transport in &self.transports {
            for (size_index, &size) in self.message_sizes.iter().enumerate() {
                self.state.transition_to(RunState::Sweeping {
                    transport: transport.kind(),
                    size_index,
                })?;

                let configuration = MeasurementConfiguration::new(transport, size);
                // Reject a repeated key before any process is spawned for it
                let result = match table.get(transport.kind(), size) {
                    Some(_) => Err(HarnessError::DuplicateResult {
                        transport: transport.kind(),
                        message_size: size,
                    }),
                    None => Ok(()),
                }
                .and_then(|()| {
                    progress(&configuration).map_err(|e| HarnessError::Io {
                        context: "writing progress",
                        source: e,
                    })
                })
                .and_then(|()| self.sampler.median(source, &configuration))
                .and_then(|median| table.insert(configuration, median).map(|()| median));

                let median = match result {
                    Ok(median) => median,
                    Err(e) => {
                        tracing::error!(
                            configuration = %configuration,
                            error = %e,
                            "Sweep aborted"
                        );
                        self.state.transition_to(RunState::Aborted)?;
                        return Err(e);
                    }
                };

                tracing::info!(
                    transport = %transport.kind(),
                    message_size = size.bytes(),
                    median_us = median.get(),
                    "Configuration measured"
                );
            }
        }

        self.state.transition_to(RunState::Reporting)?;
        Ok(table)
    }

    /// Mark the report as emitted.
    pub fn complete(&mut self) -> HarnessResult<()> {
        self.state.transition_to(RunState::Done)?;
        Ok(())
    }
}
