//! Policy-optimization adapters
//!
//! Small tabular learners behind the [`crate::ports::PolicyOptimizer`] port,
//! the pipeline that trains them on an environment, and the frozen
//! [`LearnedPolicy`] they export.
//!
//! | Algorithm | Update | Exploration |
//! |-----------|--------|-------------|
//! | A2C | one-step TD advantage on softmax preferences | softmax sampling |
//! | Q-learning | `r + γ max Q(s',·)` | ε-greedy |
//! | SARSA | `r + γ Q(s',a')` for the chosen `a'` | ε-greedy |

pub mod actor_critic;
pub mod algorithm;
pub mod observers;
pub mod policy;
pub mod q_table;
pub mod td;
pub mod trainer;

pub use actor_critic::{A2cHyperparameters, A2cOptimizer};
pub use algorithm::LearningAlgorithm;
pub use observers::{MetricsObserver, MetricsSummary, ProgressObserver, TracingObserver};
pub use policy::{LearnedParameters, LearnedPolicy};
pub use q_table::QTable;
pub use td::{QLearningOptimizer, SarsaOptimizer, TdHyperparameters};
pub use trainer::{TrainingConfig, TrainingPipeline, TrainingResult};
