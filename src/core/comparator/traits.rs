//! Trait definitions for comparison strategies.

/// Decides whether a Hamming distance makes two images near duplicates
pub trait ComparisonStrategy: Send + Sync {
    fn is_duplicate(&self, distance: u32) -> bool;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Accepts any distance up to and including a fixed threshold
#[derive(Debug, Clone)]
pub struct ThresholdStrategy {
    threshold: u32,
}

impl ThresholdStrategy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdStrategy {
    /// 5 of 64 bits
    fn default() -> Self {
        Self::new(5)
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_duplicate(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    fn description(&self) -> String {
        format!("Hamming distance <= {}", self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let strategy = ThresholdStrategy::new(5);

        assert!(strategy.is_duplicate(0));
        assert!(strategy.is_duplicate(5));
        assert!(!strategy.is_duplicate(6));
    }

    #[test]
    fn default_threshold_is_five() {
        let strategy = ThresholdStrategy::default();
        assert!(strategy.is_duplicate(5));
        assert!(!strategy.is_duplicate(6));
    }

    #[test]
    fn description_includes_threshold() {
        assert_eq!(ThresholdStrategy::new(7).description(), "Hamming distance <= 7");
    }
}
