//! Parameterized rollout policies for baseline simulation.

use std::fmt;

use rand::{Rng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::selector::{ActionSelector, DecisionPoint};
use crate::{Error, Result, types::ActionId};

/// Probability that [`RolloutPolicy::Biased`] follows its preferred action.
pub const BIASED_FOLLOW_PROBABILITY: f64 = 0.75;

/// Rollout policy used by [`super::Tester::simulate`].
///
/// A parameter vector holds, for the `k`-th decision point of an episode, the
/// preferred index into that point's legal action set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "lowercase")]
pub enum RolloutPolicy {
    /// Always the preferred action.
    Optimal(Vec<usize>),
    /// The preferred action with probability [`BIASED_FOLLOW_PROBABILITY`],
    /// otherwise uniform over the candidates.
    Biased(Vec<usize>),
    /// Uniform over the candidates.
    Uniform,
}

impl RolloutPolicy {
    pub fn params(&self) -> &[usize] {
        match self {
            RolloutPolicy::Optimal(params) | RolloutPolicy::Biased(params) => params,
            RolloutPolicy::Uniform => &[],
        }
    }

    /// Preferred action at `point`.
    ///
    /// Indexes past the legal set clamp to its last action; decision points
    /// past the parameter vector prefer index 0. If the preferred action was
    /// found infeasible, the first remaining candidate stands in.
    pub fn preferred(&self, point: &DecisionPoint<'_>) -> ActionId {
        let wanted = self.params().get(point.index).copied().unwrap_or(0);
        let clamped = wanted.min(point.legal.len().saturating_sub(1));
        match point.legal.get(clamped) {
            Some(&action) if point.is_candidate(action) => action,
            _ => point.candidates[0],
        }
    }
}

impl fmt::Display for RolloutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloutPolicy::Optimal(params) => write!(f, "optimal{params:?}"),
            RolloutPolicy::Biased(params) => write!(f, "biased{params:?}"),
            RolloutPolicy::Uniform => write!(f, "uniform"),
        }
    }
}

impl ActionSelector for RolloutPolicy {
    fn select(&mut self, point: &DecisionPoint<'_>, rng: &mut StdRng) -> Result<ActionId> {
        if point.candidates.is_empty() {
            return Err(Error::NoActionsAvailable {
                observation: point.observation.values().to_vec(),
            });
        }
        if point.is_forced() {
            return Ok(point.candidates[0]);
        }

        let uniform = |rng: &mut StdRng| {
            point
                .candidates
                .choose(rng)
                .copied()
                .ok_or_else(|| Error::NoActionsAvailable {
                    observation: point.observation.values().to_vec(),
                })
        };

        match self {
            RolloutPolicy::Optimal(_) => Ok(self.preferred(point)),
            RolloutPolicy::Biased(_) => {
                if rng.random::<f64>() < BIASED_FOLLOW_PROBABILITY {
                    Ok(self.preferred(point))
                } else {
                    uniform(rng)
                }
            }
            RolloutPolicy::Uniform => uniform(rng),
        }
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::types::Observation;

    fn ids(raw: &[usize]) -> Vec<ActionId> {
        raw.iter().copied().map(ActionId::new).collect()
    }

    #[test]
    fn preferred_clamps_and_defaults() {
        let observation = Observation::new(vec![0.0]);
        let legal = ids(&[2, 4, 5]);
        let point = DecisionPoint {
            index: 0,
            observation: &observation,
            legal: &legal,
            candidates: &legal,
        };
        assert_eq!(RolloutPolicy::Optimal(vec![1]).preferred(&point), ActionId::new(4));
        assert_eq!(RolloutPolicy::Optimal(vec![9]).preferred(&point), ActionId::new(5));

        let later = DecisionPoint { index: 3, ..point };
        assert_eq!(RolloutPolicy::Optimal(vec![2]).preferred(&later), ActionId::new(2));
    }

    #[test]
    fn preferred_skips_excluded_action() {
        let observation = Observation::new(vec![0.0]);
        let legal = ids(&[0, 1, 2]);
        let candidates = ids(&[0, 2]);
        let point = DecisionPoint {
            index: 0,
            observation: &observation,
            legal: &legal,
            candidates: &candidates,
        };
        assert_eq!(RolloutPolicy::Optimal(vec![1]).preferred(&point), ActionId::new(0));
    }

    #[test]
    fn forced_points_draw_no_random_numbers() {
        let observation = Observation::new(vec![0.0]);
        let legal = ids(&[3]);
        let point = DecisionPoint {
            index: 0,
            observation: &observation,
            legal: &legal,
            candidates: &legal,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut untouched = StdRng::seed_from_u64(1);
        let chosen = RolloutPolicy::Uniform.select(&point, &mut rng).unwrap();
        assert_eq!(chosen, ActionId::new(3));
        assert_eq!(rng.random::<u64>(), untouched.random::<u64>());
    }

    #[test]
    fn uniform_only_returns_candidates() {
        let observation = Observation::new(vec![0.0]);
        let legal = ids(&[0, 1, 2, 3]);
        let candidates = ids(&[1, 3]);
        let point = DecisionPoint {
            index: 0,
            observation: &observation,
            legal: &legal,
            candidates: &candidates,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut policy = RolloutPolicy::Biased(vec![0]);
        for _ in 0..100 {
            let action = policy.select(&point, &mut rng).unwrap();
            assert!(candidates.contains(&action));
        }
    }
}
