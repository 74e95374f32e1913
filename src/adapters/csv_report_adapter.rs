//! CSV signal report adapter implementing ReportPort.
//!
//! One row per bar: `date` (when the frame has dates), `close` (when
//! present), each planned indicator under its series name, then
//! `entry_signal` and `exit_signal` as 0/1. Undefined values are empty cells.

use crate::domain::compiler::Signals;
use crate::domain::error::TradesigError;
use crate::domain::frame::PriceFrame;
use crate::domain::series::NumericSeries;
use crate::domain::strategy::StrategyDefinition;
use crate::ports::report_port::ReportPort;
use std::io;

pub struct CsvReportAdapter {
    include_indicators: bool,
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CsvReportAdapter {
    pub fn new(include_indicators: bool) -> Self {
        Self { include_indicators }
    }

    /// Write the report to any writer.
    pub fn write_to<W: io::Write>(
        &self,
        writer: W,
        frame: &PriceFrame,
        signals: &Signals,
    ) -> Result<(), TradesigError> {
        if signals.len() != frame.len() {
            return Err(TradesigError::Report {
                reason: format!(
                    "signal length {} does not match frame length {}",
                    signals.len(),
                    frame.len()
                ),
            });
        }

        let close = frame.column("close");
        let indicators: Vec<(&str, &NumericSeries)> = if self.include_indicators {
            signals
                .indicators
                .iter()
                .map(|s| (s.name.as_str(), &s.series))
                .collect()
        } else {
            Vec::new()
        };

        let mut header: Vec<&str> = Vec::new();
        if frame.dates().is_some() {
            header.push("date");
        }
        if close.is_some() {
            header.push("close");
        }
        header.extend(indicators.iter().map(|(name, _)| *name));
        header.push("entry_signal");
        header.push("exit_signal");

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&header).map_err(report_error)?;

        for i in 0..frame.len() {
            let mut row: Vec<String> = Vec::with_capacity(header.len());
            if let Some(dates) = frame.dates() {
                row.push(dates[i].format("%Y-%m-%d").to_string());
            }
            if let Some(close) = close {
                row.push(cell(close, i));
            }
            for (_, series) in &indicators {
                row.push(cell(series, i));
            }
            row.push(flag(signals.entry_signal[i]));
            row.push(flag(signals.exit_signal[i]));
            wtr.write_record(&row).map_err(report_error)?;
        }

        wtr.flush().map_err(|e| TradesigError::Report {
            reason: format!("failed to flush report: {}", e),
        })?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        frame: &PriceFrame,
        signals: &Signals,
        strategy: &StrategyDefinition,
        output_path: &str,
    ) -> Result<(), TradesigError> {
        let file = std::fs::File::create(output_path).map_err(|e| TradesigError::Report {
            reason: format!("failed to create {}: {}", output_path, e),
        })?;
        self.write_to(file, frame, signals)?;
        log::info!(
            "wrote {} rows for '{}' to {}",
            frame.len(),
            strategy.name,
            output_path
        );
        Ok(())
    }
}

fn cell(series: &NumericSeries, index: usize) -> String {
    series.get(index).map(|v| v.to_string()).unwrap_or_default()
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn report_error(e: csv::Error) -> TradesigError {
    TradesigError::Report {
        reason: format!("CSV write error: {}", e),
    }
}
