// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Repeated trials and median extraction.
//!
//! The sampler drives a [`LatencySource`] a fixed, odd number of times for one
//! configuration, sorts the observations once and reads the middle element.
//! The median is never averaged, so it is always a latency that was actually
//! observed.

use crate::error::{HarnessError, HarnessResult};
use crate::types::{MeasurementConfiguration, Microseconds, TrialCount};

/// Produces one latency observation per call.
pub trait LatencySource {
    fn measure(&mut self, configuration: &MeasurementConfiguration) -> HarnessResult<Microseconds>;
}

/// Sorted, odd-length set of observations for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet {
    samples: Vec<Microseconds>,
}

impl SampleSet {
    /// Sort the observations in place and freeze them.
    pub fn from_samples(mut samples: Vec<Microseconds>) -> HarnessResult<Self> {
        if samples.len() % 2 == 0 {
            return Err(HarnessError::InvalidSampleSet { len: samples.len() });
        }
        samples.sort_unstable();
        Ok(Self { samples })
    }

    /// Element at sorted index `len / 2`.
    pub fn median(&self) -> Microseconds {
        self.samples[self.samples.len() / 2]
    }

    pub fn min(&self) -> Microseconds {
        self.samples[0]
    }

    pub fn max(&self) -> Microseconds {
        self.samples[self.samples.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; construction rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Observations in ascending order.
    pub fn as_slice(&self) -> &[Microseconds] {
        &self.samples
    }
}

/// Runs a fixed number of trials per configuration.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    trials: TrialCount,
}

impl Sampler {
    pub fn new(trials: TrialCount) -> Self {
        Self { trials }
    }

    pub fn trials(&self) -> TrialCount {
        self.trials
    }

    /// Collect exactly `trials` observations.
    ///
    /// The first failing trial aborts collection; there is no partial set.
    pub fn sample<S>(
        &self,
        source: &mut S,
        configuration: &MeasurementConfiguration,
    ) -> HarnessResult<SampleSet>
    where
        S: LatencySource + ?Sized,
    {
        let mut samples = Vec::with_capacity(self.trials.get());
        for trial in 0..self.trials.get() {
            let micros = source.measure(configuration)?;
            tracing::trace!(
                transport = %configuration.kind(),
                message_size = configuration.message_size().bytes(),
                trial,
                micros = micros.get(),
                "Trial complete"
            );
            samples.push(micros);
        }

        SampleSet::from_samples(samples)
    }

    /// Median latency over `trials` observations.
    pub fn median<S>(
        &self,
        source: &mut S,
        configuration: &MeasurementConfiguration,
    ) -> HarnessResult<Microseconds>
    where
        S: LatencySource + ?Sized,
    {
        let set = self.sample(source, configuration)?;
        tracing::debug!(
            transport = %configuration.kind(),
            message_size = configuration.message_size().bytes(),
            min = set.min().get(),
            median = set.median().get(),
            max = set.max().get(),
            "Sample set complete"
        );
        Ok(set.median())
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(TrialCount::REFERENCE)
    }
}
