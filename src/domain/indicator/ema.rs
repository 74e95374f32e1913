//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = P[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are undefined. An undefined input restarts the
//! warmup from the next defined value.

use crate::domain::series::NumericSeries;

pub fn calculate_ema(source: &NumericSeries, period: usize) -> NumericSeries {
    if period == 0 {
        return NumericSeries::undefined(source.len());
    }

    let mut out = Vec::with_capacity(source.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;
    let mut run = 0usize;

    for value in source.iter() {
        let Some(price) = value else {
            run = 0;
            sum = 0.0;
            out.push(None);
            continue;
        };

        run += 1;
        if run < period {
            sum += price;
            out.push(None);
        } else if run == period {
            sum += price;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = price * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }

    NumericSeries::from_options(out)
}
