//! Standard Deviation.
//!
//! Population standard deviation over n values.
//! STDDEV(n)[i] = sqrt(sum((P[i-j] - SMA(n)[i])^2 for j in 0..n-1) / n)
//! Warmup: first (n-1) values are undefined.

use crate::domain::series::NumericSeries;

pub fn calculate_stddev(source: &NumericSeries, period: usize) -> NumericSeries {
    if period == 0 {
        return NumericSeries::undefined(source.len());
    }

    (0..source.len())
        .map(|i| {
            let start = (i + 1).checked_sub(period)?;
            let window: Vec<f64> = (start..=i)
                .map(|j| source.get(j))
                .collect::<Option<_>>()?;

            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            Some(variance.sqrt())
        })
        .collect()
}
