//! ROC (Rate of Change).
//!
//! ROC(n)[i] = ((P[i] - P[i-n]) / P[i-n]) * 100
//! If P[i-n] == 0: ROC = 0
//! Warmup: first n values are undefined; either endpoint undefined gives undefined.

use crate::domain::series::NumericSeries;

pub fn calculate_roc(source: &NumericSeries, period: usize) -> NumericSeries {
    if period == 0 {
        return NumericSeries::undefined(source.len());
    }

    (0..source.len())
        .map(|i| {
            let prev = source.get(i.checked_sub(period)?)?;
            let curr = source.get(i)?;
            if prev == 0.0 {
                Some(0.0)
            } else {
                Some((curr - prev) / prev * 100.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_known_values() {
        let s = calculate_roc(&NumericSeries::from_values(vec![100.0, 110.0, 99.0]), 1);
        assert_eq!(s.get(0), None);
        assert!((s.get(1).unwrap() - 10.0).abs() < 1e-10);
        assert!((s.get(2).unwrap() + 10.0).abs() < 1e-10);
    }

    #[test]
    fn roc_zero_base_is_zero() {
        let s = calculate_roc(&NumericSeries::from_values(vec![0.0, 5.0]), 1);
        assert_eq!(s.get(1), Some(0.0));
    }

    #[test]
    fn roc_undefined_endpoint() {
        let src = NumericSeries::from_options(vec![Some(1.0), None, Some(3.0), Some(4.0)]);
        let s = calculate_roc(&src, 2);
        assert_eq!(s.get(2), Some(200.0));
        assert_eq!(s.get(3), None);
    }

    #[test]
    fn roc_warmup() {
        let s = calculate_roc(&NumericSeries::from_values(vec![1.0; 5]), 3);
        assert_eq!(s.valid_count(), 2);
    }
}
