//! Routing objectives and their score weight vectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named weight vector over (rate, reliability, speed, stp) that
/// parameterises route score composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Objective {
    /// Lowest effective cost.
    BestRate,
    /// Balanced across all factors.
    Optimum,
    /// Settlement speed first.
    FastestExecution,
    /// Maximum straight-through processing.
    MaxStp,
}

/// Weights applied to the four sub-scores. Each vector sums to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub rate: f64,
    pub reliability: f64,
    pub speed: f64,
    pub stp: f64,
}

impl Objective {
    /// The contractual weight vector for this objective.
    pub fn weights(&self) -> ScoreWeights {
        match self {
            Objective::BestRate => ScoreWeights {
                rate: 0.70,
                reliability: 0.15,
                speed: 0.10,
                stp: 0.05,
            },
            Objective::Optimum => ScoreWeights {
                rate: 0.40,
                reliability: 0.25,
                speed: 0.20,
                stp: 0.15,
            },
            Objective::FastestExecution => ScoreWeights {
                rate: 0.20,
                reliability: 0.25,
                speed: 0.45,
                stp: 0.10,
            },
            Objective::MaxStp => ScoreWeights {
                rate: 0.25,
                reliability: 0.20,
                speed: 0.15,
                stp: 0.40,
            },
        }
    }
}

impl ScoreWeights {
    /// Dot product with a sub-score vector.
    pub fn compose(&self, rate: f64, reliability: f64, speed: f64, stp: f64) -> f64 {
        self.rate * rate + self.reliability * reliability + self.speed * speed + self.stp * stp
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Objective::BestRate => "BEST_RATE",
            Objective::Optimum => "OPTIMUM",
            Objective::FastestExecution => "FASTEST_EXECUTION",
            Objective::MaxStp => "MAX_STP",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BEST_RATE" => Ok(Objective::BestRate),
            "OPTIMUM" => Ok(Objective::Optimum),
            "FASTEST_EXECUTION" => Ok(Objective::FastestExecution),
            "MAX_STP" => Ok(Objective::MaxStp),
            other => Err(format!("unknown objective: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_vectors_sum_to_one() {
        for objective in [
            Objective::BestRate,
            Objective::Optimum,
            Objective::FastestExecution,
            Objective::MaxStp,
        ] {
            let w = objective.weights();
            let sum = w.rate + w.reliability + w.speed + w.stp;
            assert!((sum - 1.0).abs() < f64::EPSILON, "{objective} sums to {sum}");
        }
    }

    #[test]
    fn test_compose_is_dot_product() {
        let w = Objective::BestRate.weights();
        let score = w.compose(1.0, 1.0, 1.0, 1.0);
        assert!((score - 1.0).abs() < f64::EPSILON);

        let score = w.compose(0.895, 0.99, 0.9, 1.0);
        assert!((score - (0.7 * 0.895 + 0.15 * 0.99 + 0.10 * 0.9 + 0.05)).abs() < 1e-12);
    }

    #[test]
    fn test_objective_round_trips_as_string() {
        for objective in [
            Objective::BestRate,
            Objective::Optimum,
            Objective::FastestExecution,
            Objective::MaxStp,
        ] {
            let parsed: Objective = objective.to_string().parse().unwrap();
            assert_eq!(parsed, objective);
        }
    }
}
