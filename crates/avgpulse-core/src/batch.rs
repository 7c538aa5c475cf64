//! Observation batch behind an average counter.
//!
//! A batch is the ordered list of values recorded since the last flush. The
//! owner drains it with [`Batch::take_average`], which always leaves it empty.

/// Pending observations for one counter window.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    values: Vec<f64>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a value may enter a batch. NaN and infinities would poison
    /// the mean.
    pub fn accepts(value: f64) -> bool {
        value.is_finite()
    }

    /// Append one observation. Callers filter with [`Batch::accepts`] first.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean of the pending values, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    /// Compute the mean and reset the batch, whether or not it was empty.
    pub fn take_average(&mut self) -> Option<f64> {
        let average = self.average();
        self.values = Vec::new();
        average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_has_no_average() {
        let mut b = Batch::new();
        assert_eq!(b.average(), None);
        assert_eq!(b.take_average(), None);
        assert!(b.is_empty());
    }

    #[test]
    fn accepts_only_finite() {
        assert!(!Batch::accepts(f64::NAN));
        assert!(!Batch::accepts(f64::INFINITY));
        assert!(!Batch::accepts(f64::NEG_INFINITY));
        assert!(Batch::accepts(-3.5));
        assert!(Batch::accepts(0.0));
    }

    #[test]
    fn take_resets() {
        let mut b = Batch::new();
        b.push(10.0);
        b.push(20.0);
        b.push(30.0);
        assert_eq!(b.take_average(), Some(20.0));
        assert!(b.is_empty());
        assert_eq!(b.take_average(), None);
    }
}
