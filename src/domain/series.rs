//! Series value types shared by indicators and the evaluator.
//!
//! A `NumericSeries` pairs each value with a validity flag: positions where an
//! indicator lacks look-back history (or an input cell is missing) are
//! undefined rather than carrying a sentinel number. Boolean expressions over
//! such series are three-valued (`Truth`) and only collapse to `false` at the
//! signal boundary.

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSeries {
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl NumericSeries {
    /// A fully defined series.
    pub fn from_values(values: Vec<f64>) -> Self {
        let valid = vec![true; values.len()];
        Self { values, valid }
    }

    /// Build from optional values; `None` marks an undefined position.
    pub fn from_options<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let (values, valid) = values
            .into_iter()
            .map(|v| match v {
                Some(x) if !x.is_nan() => (x, true),
                _ => (0.0, false),
            })
            .unzip();
        Self { values, valid }
    }

    /// A series of `len` undefined values.
    pub fn undefined(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
            valid: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        match self.valid.get(index) {
            Some(true) => Some(self.values[index]),
            _ => None,
        }
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }
}

impl FromIterator<Option<f64>> for NumericSeries {
    fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
        NumericSeries::from_options(iter)
    }
}

/// Kleene three-valued logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }

    /// Collapse to a signal: only a definite `True` fires.
    pub fn is_true(self) -> bool {
        self == Truth::True
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value { Truth::True } else { Truth::False }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruthSeries(pub Vec<Truth>);

impl TruthSeries {
    pub fn constant(value: Truth, len: usize) -> Self {
        TruthSeries(vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn and(&self, other: &TruthSeries) -> TruthSeries {
        self.zip_with(other, Truth::and)
    }

    pub fn or(&self, other: &TruthSeries) -> TruthSeries {
        self.zip_with(other, Truth::or)
    }

    fn zip_with(&self, other: &TruthSeries, f: impl Fn(Truth, Truth) -> Truth) -> TruthSeries {
        TruthSeries(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| f(*a, *b))
                .collect(),
        )
    }

    /// Boolean signal with undefined positions mapped to `false`.
    pub fn to_signal(&self) -> Vec<bool> {
        self.0.iter().map(|t| t.is_true()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_options_marks_none_and_nan_invalid() {
        let s = NumericSeries::from_options(vec![Some(1.0), None, Some(f64::NAN), Some(4.0)]);
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(0), Some(1.0));
        assert_eq!(s.get(1), None);
        assert_eq!(s.get(2), None);
        assert_eq!(s.get(3), Some(4.0));
        assert_eq!(s.valid_count(), 2);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let s = NumericSeries::from_values(vec![1.0]);
        assert_eq!(s.get(5), None);
        assert!(!s.is_valid(5));
    }

    #[test]
    fn undefined_series() {
        let s = NumericSeries::undefined(3);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![None, None, None]);
    }

    #[test]
    fn kleene_and() {
        use Truth::*;
        assert_eq!(True.and(True), True);
        assert_eq!(True.and(False), False);
        assert_eq!(Unknown.and(False), False);
        assert_eq!(Unknown.and(True), Unknown);
        assert_eq!(Unknown.and(Unknown), Unknown);
    }

    #[test]
    fn kleene_or() {
        use Truth::*;
        assert_eq!(False.or(False), False);
        assert_eq!(True.or(Unknown), True);
        assert_eq!(Unknown.or(False), Unknown);
        assert_eq!(Unknown.or(Unknown), Unknown);
    }

    #[test]
    fn truth_series_collapse_unknown_to_false() {
        let t = TruthSeries(vec![Truth::True, Truth::Unknown, Truth::False]);
        assert_eq!(t.to_signal(), vec![true, false, false]);
    }

    #[test]
    fn truth_series_elementwise() {
        let a = TruthSeries(vec![Truth::True, Truth::Unknown, Truth::False]);
        let b = TruthSeries(vec![Truth::True, Truth::True, Truth::Unknown]);
        assert_eq!(
            a.and(&b),
            TruthSeries(vec![Truth::True, Truth::Unknown, Truth::False])
        );
        assert_eq!(
            a.or(&b),
            TruthSeries(vec![Truth::True, Truth::True, Truth::Unknown])
        );
    }
}
