//! Picking pass modes.

/// Which picking pass a selection session runs.
///
/// The mode picks the depth-test policy at `begin`, the id-acceptance
/// policy in `load_id` and the reconciliation policy at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectMode {
    /// Every candidate with visible fragments in the region is a hit,
    /// regardless of draw order.
    All,
    /// Depth-tested pass that records every candidate surviving
    /// `LessEqual` and leaves the nearest depth in the depth buffer.
    NearestFirstPass,
    /// Redraws the first-pass survivors with an `Equal` depth test to find
    /// the one lying exactly at the stored nearest depth.
    NearestSecondPass,
}

impl SelectMode {
    /// Short label used in log output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NearestFirstPass => "nearest (first pass)",
            Self::NearestSecondPass => "nearest (second pass)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        let labels = [
            SelectMode::All.label(),
            SelectMode::NearestFirstPass.label(),
            SelectMode::NearestSecondPass.label(),
        ];
        assert_eq!(labels[0], "all");
        assert!(labels.iter().all(|l| !l.is_empty()));
        assert_ne!(labels[1], labels[2]);
    }
}
