//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n values are undefined (n price changes are needed for the
//! initial average). A change is only defined when both of its endpoints
//! are; an undefined change restarts the warmup.

use crate::domain::series::NumericSeries;

pub fn calculate_rsi(source: &NumericSeries, period: usize) -> NumericSeries {
    if period == 0 {
        return NumericSeries::undefined(source.len());
    }

    let mut out = Vec::with_capacity(source.len());
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut run = 0usize;

    for i in 0..source.len() {
        let change = match (i.checked_sub(1).and_then(|p| source.get(p)), source.get(i)) {
            (Some(prev), Some(curr)) => curr - prev,
            _ => {
                run = 0;
                avg_gain = 0.0;
                avg_loss = 0.0;
                out.push(None);
                continue;
            }
        };
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        run += 1;
        if run <= period {
            avg_gain += gain / period as f64;
            avg_loss += loss / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }

        if run < period {
            out.push(None);
        } else {
            out.push(Some(rsi_value(avg_gain, avg_loss)));
        }
    }

    NumericSeries::from_options(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(prices: &[f64]) -> NumericSeries {
        NumericSeries::from_values(prices.to_vec())
    }

    #[test]
    fn rsi_empty_and_single() {
        assert!(calculate_rsi(&series(&[]), 14).is_empty());
        let s = calculate_rsi(&series(&[100.0]), 14);
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(0), None);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let s = calculate_rsi(&series(&prices), 14);
        for i in 0..14 {
            assert!(!s.is_valid(i), "value {} should be undefined", i);
        }
        assert!(s.is_valid(14));
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let s = calculate_rsi(&series(&prices), 14);
        assert!((s.get(14).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let s = calculate_rsi(&series(&prices), 14);
        assert!(s.get(14).unwrap().abs() < 1e-10);
    }

    #[test]
    fn rsi_known_two_period() {
        // changes: +2, -1, +3 ; seed avg_gain = 1, avg_loss = 0.5 -> RSI 66.67
        // next: gain 3 -> avg_gain 2, avg_loss 0.25 -> RSI 88.89
        let s = calculate_rsi(&series(&[10.0, 12.0, 11.0, 14.0]), 2);
        assert_eq!(s.get(1), None);
        assert!((s.get(2).unwrap() - 200.0 / 3.0).abs() < 1e-9);
        assert!((s.get(3).unwrap() - 800.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let s = calculate_rsi(&series(&prices), 14);
        for v in s.iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_gap_restarts_warmup() {
        let src = NumericSeries::from_options(vec![
            Some(1.0),
            Some(2.0),
            Some(3.0),
            None,
            Some(5.0),
            Some(6.0),
            Some(7.0),
        ]);
        let s = calculate_rsi(&src, 2);
        assert_eq!(s.get(2), Some(100.0));
        assert_eq!(s.get(3), None);
        assert_eq!(s.get(4), None);
        assert_eq!(s.get(5), None);
        assert_eq!(s.get(6), Some(100.0));
    }
}
