//! Program files and their descriptors.

pub mod descriptor;
pub mod table;

pub use descriptor::{Acceptance, ProgramDescriptor, TrialKind};
pub use table::{OutcomeSpec, StateSpec, TableProgram};
