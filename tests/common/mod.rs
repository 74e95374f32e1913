#![allow(dead_code)]

use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;
use tradesig::domain::frame::PriceFrame;
use tradesig::domain::indicator::IndicatorRegistry;
use tradesig::domain::series::NumericSeries;

pub fn registry() -> IndicatorRegistry {
    IndicatorRegistry::builtin()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn frame_of(closes: &[f64]) -> PriceFrame {
    PriceFrame::from_closes(closes)
}

/// Close-only frame with consecutive daily dates starting 2024-01-01.
pub fn dated_frame(closes: &[f64]) -> PriceFrame {
    let start = date(2024, 1, 1);
    let dates = (0..closes.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    PriceFrame::from_closes(closes).with_dates(dates).unwrap()
}

/// Frame with `close` plus one extra column.
pub fn frame_with(closes: &[f64], column: &str, values: &[f64]) -> PriceFrame {
    let mut frame = PriceFrame::from_closes(closes);
    frame
        .insert(column, NumericSeries::from_values(values.to_vec()))
        .unwrap();
    frame
}

/// Deterministic zig-zag price walk.
pub fn generate_closes(count: usize, start_price: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let wave = ((i % 7) as f64 - 3.0) * 0.8;
            start_price + i as f64 * 0.25 + wave
        })
        .collect()
}

pub fn csv_for(closes: &[f64]) -> String {
    let start = date(2024, 1, 1);
    let mut out = String::from("date,open,high,low,close,volume\n");
    for (i, close) in closes.iter().enumerate() {
        let day = start + chrono::Duration::days(i as i64);
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            day.format("%Y-%m-%d"),
            close - 0.5,
            close + 1.0,
            close - 1.0,
            close,
            1000 + i
        ));
    }
    out
}

pub fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

pub fn write_temp_ini(content: &str) -> NamedTempFile {
    write_temp(content, ".ini")
}

pub fn write_temp_csv(content: &str) -> NamedTempFile {
    write_temp(content, ".csv")
}

pub fn bools(s: &str) -> Vec<bool> {
    s.chars().map(|c| c == '1').collect()
}
