//! In-process engine for tabular decision programs.

use std::path::Path;

use tracing::debug;

use crate::{
    Error, Result,
    ports::{Applied, EngineLoader, EngineSession, OutcomeOption, ProgramInfo, Snapshot},
    program::{StateSpec, TableProgram},
    types::{ActionId, Observation},
};

/// Engine session over a [`TableProgram`].
///
/// # Examples
///
/// ```no_run
/// use gmenv::adapters::TableEngine;
/// use gmenv::ports::EngineSession;
/// use std::path::Path;
///
/// let mut session = TableEngine::open(Path::new("demos/three_build.json"))?;
/// session.reset()?;
/// let snapshot = session.snapshot()?;
/// assert!(!snapshot.legal_actions.is_empty());
/// # Ok::<(), gmenv::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TableEngine {
    program: TableProgram,
    current: String,
    closed: bool,
}

impl TableEngine {
    pub fn new(program: TableProgram) -> Self {
        let current = program.start.clone();
        Self {
            program,
            current,
            closed: false,
        }
    }

    /// Load and validate a program file.
    pub fn open(path: &Path) -> Result<Self> {
        TableProgram::load(path).map(Self::new)
    }

    pub fn program(&self) -> &TableProgram {
        &self.program
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.closed {
            return Err(Error::EngineRejected {
                operation: operation.to_string(),
                message: "session is closed".to_string(),
            });
        }
        Ok(())
    }

    fn current_state(&self, operation: &str) -> Result<&StateSpec> {
        self.program
            .state(&self.current)
            .ok_or_else(|| Error::EngineRejected {
                operation: operation.to_string(),
                message: format!("unknown configuration '{}'", self.current),
            })
    }

    fn action_name(&self, action: ActionId, operation: &str) -> Result<&str> {
        self.program
            .actions
            .get(action.index())
            .map(String::as_str)
            .ok_or_else(|| Error::EngineRejected {
                operation: operation.to_string(),
                message: format!("unknown action {action}"),
            })
    }

    fn legal_in(&self, state: &StateSpec) -> Vec<ActionId> {
        if state.terminal {
            return Vec::new();
        }
        let mut legal: Vec<ActionId> = state
            .actions
            .keys()
            .filter_map(|name| self.program.action_index(name))
            .map(ActionId::new)
            .collect();
        legal.sort();
        legal
    }
}

impl EngineSession for TableEngine {
    fn describe(&mut self) -> Result<ProgramInfo> {
        self.ensure_open("describe")?;
        Ok(ProgramInfo {
            actions: self.program.actions.clone(),
            observation_len: self.program.observation_len(),
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.ensure_open("reset")?;
        self.current = self.program.start.clone();
        Ok(())
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        self.ensure_open("snapshot")?;
        let state = self.current_state("snapshot")?;
        Ok(Snapshot {
            observation: Observation::new(state.features.clone()),
            legal_actions: self.legal_in(state),
            terminal: state.terminal,
        })
    }

    fn legal_actions(&mut self) -> Result<Vec<ActionId>> {
        self.ensure_open("legal_actions")?;
        let state = self.current_state("legal_actions")?;
        Ok(self.legal_in(state))
    }

    fn outcomes(&mut self, action: ActionId) -> Result<Vec<OutcomeOption>> {
        self.ensure_open("outcomes")?;
        let name = self.action_name(action, "outcomes")?;
        let state = self.current_state("outcomes")?;
        let outcomes = state.actions.get(name).ok_or_else(|| Error::EngineRejected {
            operation: "outcomes".to_string(),
            message: format!("action '{name}' is not legal in '{}'", self.current),
        })?;
        Ok(outcomes
            .iter()
            .map(|o| OutcomeOption {
                id: o.outcome.clone(),
                probability: o.probability,
            })
            .collect())
    }

    fn apply(&mut self, action: ActionId, outcome: &str) -> Result<Applied> {
        self.ensure_open("apply")?;
        let name = self.action_name(action, "apply")?;
        let state = self.current_state("apply")?;
        let spec = state
            .actions
            .get(name)
            .and_then(|outcomes| outcomes.iter().find(|o| o.outcome == outcome))
            .ok_or_else(|| Error::EngineRejected {
                operation: "apply".to_string(),
                message: format!(
                    "outcome '{outcome}' of '{name}' is not defined in '{}'",
                    self.current
                ),
            })?;

        if spec.infeasible {
            return Ok(Applied::Infeasible);
        }
        let reward = spec.reward;
        let next = spec.next.clone().ok_or_else(|| Error::EngineRejected {
            operation: "apply".to_string(),
            message: format!("outcome '{outcome}' of '{name}' has no successor"),
        })?;
        self.current = next;
        Ok(Applied::Transition { reward })
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            debug!(program = %self.program.name, "closing table engine");
            self.closed = true;
        }
        Ok(())
    }
}

/// Loader that starts [`TableEngine`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableEngineLoader;

impl TableEngineLoader {
    pub fn new() -> Self {
        Self
    }
}

impl EngineLoader for TableEngineLoader {
    fn load(&self, program: &Path) -> Result<Box<dyn EngineSession>> {
        Ok(Box::new(TableEngine::open(program)?))
    }

    fn name(&self) -> &str {
        "table"
    }
}
