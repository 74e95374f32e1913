//! Weighted Moving Average.
//!
//! O(n) sliding window update of the weighted and plain window sums.
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//! Warmup: first (n-1) values are undefined. Undefined inputs count as zero
//! in the running sums and mark every window that contains them undefined.

use crate::domain::series::NumericSeries;

pub fn calculate_wma(source: &NumericSeries, period: usize) -> NumericSeries {
    if period == 0 {
        return NumericSeries::undefined(source.len());
    }

    let mut out = Vec::with_capacity(source.len());
    let divisor = period as f64 * (period as f64 + 1.0) / 2.0;
    let mut weighted_sum: f64 = 0.0;
    let mut window_sum: f64 = 0.0;
    let mut missing = 0usize;

    for i in 0..source.len() {
        let price = source.get(i).unwrap_or(0.0);
        if !source.is_valid(i) {
            missing += 1;
        }

        if i < period {
            weighted_sum += (i + 1) as f64 * price;
            window_sum += price;
        } else {
            let dropped = source.get(i - period).unwrap_or(0.0);
            if !source.is_valid(i - period) {
                missing -= 1;
            }
            weighted_sum += period as f64 * price - window_sum;
            window_sum += price - dropped;
        }

        if i + 1 >= period && missing == 0 {
            out.push(Some(weighted_sum / divisor));
        } else {
            out.push(None);
        }
    }

    NumericSeries::from_options(out)
}
