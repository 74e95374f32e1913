//! Tabular time-series input: named numeric columns, one row per bar.

use crate::domain::series::NumericSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Canonical price columns. Loaders normalise these names to lowercase.
pub const PRICE_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq)]
pub struct PriceFrame {
    dates: Option<Vec<NaiveDate>>,
    columns: BTreeMap<String, NumericSeries>,
    rows: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("column '{column}' has {found} rows, expected {expected}")]
pub struct ColumnLengthError {
    pub column: String,
    pub expected: usize,
    pub found: usize,
}

impl PriceFrame {
    pub fn new(rows: usize) -> Self {
        Self {
            dates: None,
            columns: BTreeMap::new(),
            rows,
        }
    }

    /// Frame with the five OHLCV columns, all fully defined.
    pub fn from_ohlcv(
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self, ColumnLengthError> {
        let mut frame = PriceFrame::new(close.len());
        frame.insert("open", NumericSeries::from_values(open))?;
        frame.insert("high", NumericSeries::from_values(high))?;
        frame.insert("low", NumericSeries::from_values(low))?;
        frame.insert("close", NumericSeries::from_values(close))?;
        frame.insert("volume", NumericSeries::from_values(volume))?;
        Ok(frame)
    }

    /// Frame with only a close column; open/high/low mirror close and volume is zero.
    pub fn from_closes(closes: &[f64]) -> Self {
        let n = closes.len();
        let mut frame = PriceFrame::new(n);
        for name in ["open", "high", "low", "close"] {
            frame
                .columns
                .insert(name.to_string(), NumericSeries::from_values(closes.to_vec()));
        }
        frame
            .columns
            .insert("volume".to_string(), NumericSeries::from_values(vec![0.0; n]));
        frame
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        series: NumericSeries,
    ) -> Result<(), ColumnLengthError> {
        let name = name.into();
        if series.len() != self.rows {
            return Err(ColumnLengthError {
                column: name,
                expected: self.rows,
                found: series.len(),
            });
        }
        self.columns.insert(name, series);
        Ok(())
    }

    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self, ColumnLengthError> {
        if dates.len() != self.rows {
            return Err(ColumnLengthError {
                column: "date".to_string(),
                expected: self.rows,
                found: dates.len(),
            });
        }
        self.dates = Some(dates);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&NumericSeries> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }
}
