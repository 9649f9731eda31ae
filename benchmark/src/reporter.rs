// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Plain-text report generation for sweep results.
//!
//! Writes one progress line per configuration while the sweep runs, then one
//! table per transport with rows in sweep order.

use std::io::{self, Write};

use ipclat_core::MeasurementConfiguration;
use thiserror::Error;

use crate::metrics::SweepReport;

/// Width of the message size column, header included.
const SIZE_COLUMN_WIDTH: usize = 18;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to write report: {0}")]
    Write(#[from] io::Error),
}

/// Progress line announcing the configuration about to be sampled.
pub fn progress_line(configuration: &MeasurementConfiguration) -> String {
    format!(
        "measuring {} message size: {}",
        configuration.kind(),
        configuration.message_size()
    )
}

/// Text reporter writing to any byte sink.
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write and flush the progress line for one configuration.
    pub fn progress(&mut self, configuration: &MeasurementConfiguration) -> io::Result<()> {
        writeln!(self.out, "{}", progress_line(configuration))?;
        self.out.flush()
    }

    /// Render one table per transport followed by the run summary.
    pub fn render(&mut self, report: &SweepReport) -> Result<(), ReporterError> {
        for (i, transport) in report.table.transports().into_iter().enumerate() {
            if i > 0 {
                writeln!(self.out)?;
            }
            writeln!(self.out, "{} measurements", transport)?;
            writeln!(
                self.out,
                "{:<width$}{}",
                "[message size]",
                "[median latency (us)]",
                width = SIZE_COLUMN_WIDTH
            )?;
            for entry in report.table.rows(transport) {
                writeln!(
                    self.out,
                    "{:<width$}{}",
                    entry.configuration.message_size().to_string(),
                    entry.median,
                    width = SIZE_COLUMN_WIDTH
                )?;
            }
        }

        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} trials per configuration, {} process launches, sweep took {}",
            report.trials,
            report.attempts,
            SweepReport::format_duration(report.duration_ms())
        )?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
