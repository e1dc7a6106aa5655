//! Ports (trait boundaries) for external dependencies.
//!
//! These traits are owned by the domain and implemented by adapters: the
//! decision engine, policy-optimization algorithms, training observers and
//! policy storage.

pub mod engine;
pub mod observer;
pub mod optimizer;
pub mod repository;

pub use engine::{Applied, EngineLoader, EngineSession, OutcomeOption, ProgramInfo, Snapshot};
pub use observer::TrainingObserver;
pub use optimizer::{PolicyOptimizer, Transition};
pub use repository::PolicyRepository;
