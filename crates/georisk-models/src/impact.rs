use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Negative,
    Neutral,
    Positive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// Stage 4 per-theme output (§3, §4.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeImpact {
    pub theme: String,
    pub direction: Direction,
    pub magnitude: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub signal_count: usize,
    pub summary: String,
}

/// Stage 4 output (§3, §4.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateImpact {
    pub overall_direction: Direction,
    pub overall_magnitude: f64,
    pub overall_confidence: f64,
    pub theme_impacts: Vec<ThemeImpact>,
    pub total_signals: usize,
}

/// Stage 5 output: the final three-way distribution (§3, §4.10).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ActionProbabilities {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl ActionProbabilities {
    pub const NEUTRAL_DEFAULT: ActionProbabilities = ActionProbabilities {
        negative: 0.2,
        neutral: 0.6,
        positive: 0.2,
    };

    /// Clamp all three components to non-negative and renormalize so the
    /// sum is exactly 1. Falls back to the neutral default if all three
    /// are zero (§4.10, invariant 8).
    pub fn normalized(negative: f64, neutral: f64, positive: f64) -> Self {
        let negative = negative.max(0.0);
        let neutral = neutral.max(0.0);
        let positive = positive.max(0.0);
        let sum = negative + neutral + positive;
        if sum <= 0.0 {
            return Self::NEUTRAL_DEFAULT;
        }
        Self {
            negative: negative / sum,
            neutral: neutral / sum,
            positive: positive / sum,
        }
    }

    pub fn dominant(&self) -> Direction {
        if self.negative >= self.neutral && self.negative >= self.positive {
            Direction::Negative
        } else if self.positive >= self.neutral && self.positive >= self.negative {
            Direction::Positive
        } else {
            Direction::Neutral
        }
    }

    /// One-line description of the dominant action and its margin.
    /// Supplemental helper, not consumed downstream.
    pub fn summary(&self) -> String {
        match self.dominant() {
            Direction::Negative => format!(
                "Leaning negative ({:.0}% vs {:.0}% positive)",
                self.negative * 100.0,
                self.positive * 100.0
            ),
            Direction::Positive => format!(
                "Leaning positive ({:.0}% vs {:.0}% negative)",
                self.positive * 100.0,
                self.negative * 100.0
            ),
            Direction::Neutral => format!("Neutral ({:.0}% hold)", self.neutral * 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_sums_to_one() {
        let p = ActionProbabilities::normalized(2.0, 1.0, 1.0);
        assert!((p.negative + p.neutral + p.positive - 1.0).abs() < 1e-9);
        assert_eq!(p.negative, 0.5);
    }

    #[test]
    fn all_zero_falls_back_to_neutral_default() {
        let p = ActionProbabilities::normalized(0.0, 0.0, 0.0);
        assert_eq!(p, ActionProbabilities::NEUTRAL_DEFAULT);
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let p = ActionProbabilities::normalized(-1.0, 1.0, 1.0);
        assert_eq!(p.negative, 0.0);
        assert_eq!(p.neutral, 0.5);
    }

    #[test]
    fn summary_reflects_dominant_action() {
        let p = ActionProbabilities {
            negative: 0.6,
            neutral: 0.2,
            positive: 0.2,
        };
        assert!(p.summary().contains("negative"));
    }
}
