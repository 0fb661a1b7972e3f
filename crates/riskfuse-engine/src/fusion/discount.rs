//! Correlation discounting of redundant evidence.
//!
//! Detector `k` in processing order gets `1 - max_{j<k} |r(k, j)|`; the
//! first detector always gets 1.0. The result lies in [0, 1].

use crate::correlation::CorrelationStore;

/// Discount applied to one detection and the earlier detector behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationDiscount<'a> {
    pub discount: f64,
    /// Earlier detector with the largest |r|, when that |r| is non-zero.
    pub correlated_with: Option<&'a str>,
}

/// Discounts for detector ids already in processing order.
pub fn correlation_discounts<'a>(
    ordered_ids: &[&'a str],
    correlations: &CorrelationStore,
) -> Vec<CorrelationDiscount<'a>> {
    ordered_ids
        .iter()
        .enumerate()
        .map(|(k, id)| {
            let mut max_abs = 0.0_f64;
            let mut correlated_with = None;
            for earlier in &ordered_ids[..k] {
                let r = correlations.get(id, earlier).abs();
                if r > max_abs {
                    max_abs = r;
                    correlated_with = Some(*earlier);
                }
            }
            CorrelationDiscount {
                discount: (1.0 - max_abs).clamp(0.0, 1.0),
                correlated_with,
            }
        })
        .collect()
}
