use georisk_models::impact::{ActionProbabilities, AggregateImpact, Direction, RiskTolerance, ThemeImpact};

/// Stage 5 (§4.10): starts from the overall direction's base distribution,
/// nudges it per theme, then applies a risk-tolerance multiplier.
pub fn synthesize_probabilities(impact: &AggregateImpact, risk_tolerance: RiskTolerance) -> ActionProbabilities {
    let m = impact.overall_magnitude;
    let (mut negative, mut neutral, mut positive) = match impact.overall_direction {
        Direction::Negative => (0.4 + 0.4 * m, 0.4 - 0.2 * m, 0.2 - 0.2 * m),
        Direction::Positive => (0.2 - 0.1 * m, 0.4 - 0.2 * m, 0.4 + 0.3 * m),
        Direction::Neutral => (0.2, 0.6, 0.2),
    };

    for theme_impact in &impact.theme_impacts {
        apply_theme_nudge(&mut negative, &mut neutral, &mut positive, theme_impact);
    }

    if impact.overall_direction == Direction::Negative {
        let (neg_mult, neu_mult, pos_mult) = match risk_tolerance {
            RiskTolerance::Low => (1.3, 0.9, 0.7),
            RiskTolerance::High => (0.8, 1.1, 1.0),
            RiskTolerance::Medium => (1.0, 1.0, 1.0),
        };
        negative *= neg_mult;
        neutral *= neu_mult;
        positive *= pos_mult;
    }

    ActionProbabilities::normalized(negative, neutral, positive)
}

fn apply_theme_nudge(negative: &mut f64, neutral: &mut f64, positive: &mut f64, theme_impact: &ThemeImpact) {
    let w = theme_impact.magnitude * theme_impact.confidence * 0.3;
    match theme_impact.direction {
        Direction::Negative => {
            *negative += w;
            *neutral -= 0.5 * w;
            *positive -= 0.5 * w;
        }
        Direction::Positive => {
            *positive += w;
            *neutral -= 0.5 * w;
            *negative -= 0.5 * w;
        }
        Direction::Neutral => {
            *neutral += w;
            *negative -= 0.5 * w;
            *positive -= 0.5 * w;
        }
    }
}
