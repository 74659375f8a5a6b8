//! Profitability filter
//!
//! Decides whether a matched listing gets surfaced. Broad mode lets every
//! new listing through; narrow mode requires a reference price and caps
//! how far over the market mean a listing may be. The severity tag shown
//! in the alert is computed elsewhere and never feeds back into this
//! decision.

/// Inclusion decision for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Include,
    /// Narrow mode, no reference price matched
    SkipNoReference,
    /// Narrow mode, priced too far over the reference mean
    SkipTooExpensive,
}

#[derive(Debug, Clone)]
pub struct DealFilter {
    /// Narrow mode includes iff price <= mean * ratio
    max_over_ref_ratio: f64,
}

impl DealFilter {
    pub fn new(max_over_ref_ratio: f64) -> Self {
        Self { max_over_ref_ratio }
    }

    pub fn evaluate(&self, price: i64, mean: Option<f64>, broad_mode: bool) -> Verdict {
        if broad_mode {
            return Verdict::Include;
        }

        match mean {
            Some(mean) if mean > 0.0 => {
                if price as f64 <= mean * self.max_over_ref_ratio {
                    Verdict::Include
                } else {
                    Verdict::SkipTooExpensive
                }
            }
            _ => Verdict::SkipNoReference,
        }
    }
}

impl Default for DealFilter {
    fn default() -> Self {
        Self::new(1.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_includes_at_threshold() {
        let filter = DealFilter::new(1.2);
        assert_eq!(
            filter.evaluate(1200, Some(1000.0), false),
            Verdict::Include
        );
    }

    #[test]
    fn test_narrow_excludes_just_over_threshold() {
        let filter = DealFilter::new(1.2);
        assert_eq!(
            filter.evaluate(1201, Some(1000.0), false),
            Verdict::SkipTooExpensive
        );
    }

    #[test]
    fn test_narrow_excludes_without_reference() {
        let filter = DealFilter::new(1.2);
        assert_eq!(filter.evaluate(100, None, false), Verdict::SkipNoReference);
    }

    #[test]
    fn test_narrow_treats_zero_mean_as_unmatched() {
        let filter = DealFilter::new(1.2);
        assert_eq!(
            filter.evaluate(100, Some(0.0), false),
            Verdict::SkipNoReference
        );
    }

    #[test]
    fn test_broad_includes_everything() {
        let filter = DealFilter::new(1.2);
        assert_eq!(filter.evaluate(999_999, None, true), Verdict::Include);
        assert_eq!(
            filter.evaluate(999_999, Some(1000.0), true),
            Verdict::Include
        );
    }

    #[test]
    fn test_custom_ratio() {
        let filter = DealFilter::new(1.0);
        assert_eq!(
            filter.evaluate(1000, Some(1000.0), false),
            Verdict::Include
        );
        assert_eq!(
            filter.evaluate(1001, Some(1000.0), false),
            Verdict::SkipTooExpensive
        );
    }
}
