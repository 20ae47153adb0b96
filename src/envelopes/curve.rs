//! Interpolation curves for envelope segments.

/// Interpolation curve applied to an envelope segment.
///
/// All curves map a normalized input in [0, 1] to a normalized output in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Curve {
    /// Constant rate of change
    #[default]
    Linear,

    /// Slow start, fast finish. The parameter is the exponent (2.0 = squared).
    Exponential(f64),

    /// Fast start, slow finish. Inverse shape of `Exponential`.
    Logarithmic(f64),
}

impl Curve {
    /// Applies the curve to a normalized value.
    ///
    /// # Examples
    ///
    /// ```
    /// use beatcoach::envelopes::Curve;
    ///
    /// assert_eq!(Curve::Linear.apply(0.5), 0.5);
    /// assert_eq!(Curve::Exponential(2.0).apply(0.5), 0.25);
    /// ```
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => t,
            Curve::Exponential(exp) => t.powf(*exp),
            Curve::Logarithmic(exp) => 1.0 - (1.0 - t).powf(*exp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let curve = Curve::Linear;
        assert_eq!(curve.apply(0.0), 0.0);
        assert_eq!(curve.apply(0.5), 0.5);
        assert_eq!(curve.apply(1.0), 1.0);
    }

    #[test]
    fn test_exponential_curve() {
        let curve = Curve::Exponential(3.0);
        assert_eq!(curve.apply(0.5), 0.125);
        assert_eq!(curve.apply(1.0), 1.0);
    }

    #[test]
    fn test_logarithmic_curve() {
        let curve = Curve::Logarithmic(2.0);
        assert_eq!(curve.apply(0.5), 0.75);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(Curve::Linear.apply(-0.5), 0.0);
        assert_eq!(Curve::Linear.apply(1.5), 1.0);
    }
}
