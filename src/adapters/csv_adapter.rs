//! CSV file data adapter.
//!
//! Reads a headed CSV into a `PriceFrame`. The date column (matched
//! case-insensitively, `%Y-%m-%d`) is optional; every other column is numeric.
//! OHLCV headers are normalised to lowercase, all other headers are kept
//! verbatim. Empty cells load as undefined values.

use crate::domain::error::TradesigError;
use crate::domain::frame::{PRICE_FIELDS, PriceFrame};
use crate::domain::series::NumericSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;

pub struct CsvAdapter {
    date_column: String,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new("date")
    }
}

impl CsvAdapter {
    pub fn new(date_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
        }
    }

    /// Parse CSV text already in memory.
    pub fn parse(&self, content: &str) -> Result<PriceFrame, TradesigError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| TradesigError::Data {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();

        let mut date_index = None;
        let mut columns: Vec<(usize, String)> = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            if date_index.is_none() && header.eq_ignore_ascii_case(&self.date_column) {
                date_index = Some(i);
                continue;
            }
            let name = normalise_column(header);
            if name.is_empty() {
                return Err(TradesigError::Data {
                    reason: format!("column {} has an empty header", i + 1),
                });
            }
            if columns.iter().any(|(_, existing)| *existing == name) {
                return Err(TradesigError::Data {
                    reason: format!("duplicate column '{}'", name),
                });
            }
            columns.push((i, name));
        }
        if columns.is_empty() {
            return Err(TradesigError::Data {
                reason: "no numeric columns found".into(),
            });
        }

        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TradesigError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = row + 2;

            if let Some(index) = date_index {
                let raw = record.get(index).unwrap_or("");
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    TradesigError::Data {
                        reason: format!("line {}: invalid date '{}': {}", line, raw, e),
                    }
                })?;
                dates.push(date);
            }

            for (slot, (index, name)) in columns.iter().enumerate() {
                let raw = record.get(*index).unwrap_or("");
                let value = if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse::<f64>().map_err(|_| TradesigError::Data {
                        reason: format!("line {}: invalid number '{}' in column '{}'", line, raw, name),
                    })?)
                };
                values[slot].push(value);
            }
        }

        let rows = values.first().map(Vec::len).unwrap_or(0);
        if rows == 0 {
            log::warn!("CSV contains a header but no rows");
        }

        let mut order: Vec<usize> = (0..rows).collect();
        if date_index.is_some() {
            order.sort_by_key(|&i| dates[i]);
            if order.windows(2).any(|w| dates[w[0]] == dates[w[1]]) {
                log::warn!("CSV contains duplicate dates");
            }
        } else {
            log::info!(
                "no '{}' column found; rows are used in file order",
                self.date_column
            );
        }

        let mut frame = PriceFrame::new(rows);
        for ((_, name), column) in columns.into_iter().zip(values) {
            let series: NumericSeries = order.iter().map(|&i| column[i]).collect();
            frame.insert(name, series).map_err(|e| TradesigError::Data {
                reason: e.to_string(),
            })?;
        }
        if date_index.is_some() {
            let sorted = order.iter().map(|&i| dates[i]).collect();
            frame = frame.with_dates(sorted).map_err(|e| TradesigError::Data {
                reason: e.to_string(),
            })?;
        }

        log::debug!("loaded {} rows", frame.len());
        Ok(frame)
    }
}

impl DataPort for CsvAdapter {
    fn load_frame(&self, source: &str) -> Result<PriceFrame, TradesigError> {
        let content = fs::read_to_string(source).map_err(|e| TradesigError::Data {
            reason: format!("failed to read {}: {}", source, e),
        })?;
        self.parse(&content)
    }
}

fn normalise_column(header: &str) -> String {
    let lower = header.to_ascii_lowercase();
    if PRICE_FIELDS.contains(&lower.as_str()) {
        lower
    } else {
        header.to_string()
    }
}
