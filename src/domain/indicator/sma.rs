//! Simple Moving Average.
//!
//! SMA(n)[i] = mean of source[i-n+1..=i].
//! Warmup: first (n-1) values are undefined, and any window holding an
//! undefined source value is undefined.

use crate::domain::series::NumericSeries;

pub fn calculate_sma(source: &NumericSeries, period: usize) -> NumericSeries {
    if period == 0 {
        return NumericSeries::undefined(source.len());
    }

    let mut out = Vec::with_capacity(source.len());
    let mut sum = 0.0;
    let mut missing = 0usize;

    for i in 0..source.len() {
        match source.get(i) {
            Some(v) => sum += v,
            None => missing += 1,
        }
        if i >= period {
            match source.get(i - period) {
                Some(v) => sum -= v,
                None => missing -= 1,
            }
        }

        if i + 1 >= period && missing == 0 {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }

    NumericSeries::from_options(out)
}
