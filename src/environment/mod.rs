//! Decision-process environment.
//!
//! [`Environment`] presents one engine session as a resettable, steppable
//! MDP. It owns the session outright: every operation takes `&mut self`, so
//! two episodes can never interleave on the same engine configuration. The
//! session is released by [`Environment::close`] or on drop.
//!
//! ```text
//! Ready ──reset──▶ Running ──step (done)──▶ Done ──reset──▶ Running ...
//!   │                 │ end_episode ─────────▲
//!   └──────── close (from any phase) ──────────────▶ Closed
//! ```

pub mod settings;
pub mod step;

use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

pub use settings::{DEFAULT_MAX_STEPS, EnvironmentSettings};
pub use step::{Phase, ResetOutcome, Step, StepInfo, StepStatus};

use crate::{
    Error, Result,
    ports::{Applied, EngineLoader, EngineSession, OutcomeOption, ProgramInfo, Snapshot},
    types::ActionId,
};

const PROBABILITY_TOLERANCE: f64 = 1e-6;

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// A single engine session exposed as an MDP.
pub struct Environment {
    session: Option<Box<dyn EngineSession>>,
    program: PathBuf,
    info: ProgramInfo,
    rng: StdRng,
    seed: Option<u64>,
    debug: bool,
    max_steps: usize,
    phase: Phase,
    steps: usize,
}

impl Environment {
    /// Load `program` through `loader` into a fresh engine session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineLoad`] if the program is missing or
    /// unparsable, or if the session fails to start or describe itself.
    pub fn open(
        loader: &dyn EngineLoader,
        program: &Path,
        settings: EnvironmentSettings,
    ) -> Result<Self> {
        debug!(loader = loader.name(), program = %program.display(), "opening environment");
        let session = loader
            .load(program)
            .map_err(|e| as_load_error(program, e))?;
        Self::from_session(session, program, settings)
    }

    /// Wrap an already started session.
    pub fn from_session(
        mut session: Box<dyn EngineSession>,
        program: impl Into<PathBuf>,
        settings: EnvironmentSettings,
    ) -> Result<Self> {
        let program = program.into();
        let info = match session.describe() {
            Ok(info) if !info.actions.is_empty() => info,
            Ok(_) => {
                release_failed_session(session.as_mut());
                return Err(Error::EngineLoad {
                    program,
                    reason: "program declares no actions".to_string(),
                });
            }
            Err(e) => {
                release_failed_session(session.as_mut());
                return Err(as_load_error(&program, e));
            }
        };
        if settings.max_steps == 0 {
            release_failed_session(session.as_mut());
            return Err(Error::invalid_config("max_steps must be positive"));
        }

        if settings.debug {
            debug!(
                target: "gmenv::engine",
                program = %program.display(),
                actions = ?info.actions,
                observation_len = info.observation_len,
                "describe"
            );
        }

        Ok(Self {
            session: Some(session),
            program,
            info,
            rng: build_rng(settings.seed),
            seed: settings.seed,
            debug: settings.debug,
            max_steps: settings.max_steps,
            phase: Phase::Ready,
            steps: 0,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase == Phase::Closed {
            Err(Error::ClosedEnvironment)
        } else {
            Ok(())
        }
    }

    /// Fix the random stream used for outcome sampling and randomized
    /// rollout policies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] while an episode is running.
    pub fn set_seed(&mut self, seed: u64) -> Result<()> {
        self.ensure_open()?;
        if self.phase == Phase::Running {
            return Err(Error::usage("cannot reseed while an episode is running"));
        }
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        Ok(())
    }

    /// Toggle tracing of every engine query and response.
    pub fn set_debug(&mut self, debug: bool) -> Result<()> {
        self.ensure_open()?;
        self.debug = debug;
        Ok(())
    }

    /// Change the horizon safety bound.
    pub fn set_max_steps(&mut self, max_steps: usize) -> Result<()> {
        self.ensure_open()?;
        if max_steps == 0 {
            return Err(Error::invalid_config("max_steps must be positive"));
        }
        if self.phase == Phase::Running {
            return Err(Error::usage("cannot change the horizon while an episode is running"));
        }
        self.max_steps = max_steps;
        Ok(())
    }

    /// Restart the program and begin a new episode.
    ///
    /// The random stream is not rewound, so successive episodes sample
    /// different outcomes under a fixed seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] while an episode is running,
    /// [`Error::ClosedEnvironment`] after close, and engine errors as-is.
    pub fn reset(&mut self) -> Result<ResetOutcome> {
        self.ensure_open()?;
        if self.phase == Phase::Running {
            return Err(Error::usage(
                "reset called while an episode is running; finish it or call end_episode",
            ));
        }

        let debug = self.debug;
        let session = self.session.as_deref_mut().ok_or(Error::ClosedEnvironment)?;
        session.reset()?;
        let snapshot = session.snapshot()?;
        validate_snapshot(&self.info, &snapshot, "reset")?;
        if debug {
            trace_snapshot("reset", &snapshot);
        }

        self.steps = 0;
        self.phase = if snapshot.terminal {
            Phase::Done
        } else {
            Phase::Running
        };

        let legal_actions = if snapshot.terminal {
            Vec::new()
        } else {
            snapshot.legal_actions
        };
        Ok(ResetOutcome {
            observation: snapshot.observation,
            legal_actions,
            terminal: snapshot.terminal,
        })
    }

    /// Take `action` in the current configuration.
    ///
    /// An outcome is sampled from the engine's distribution with the
    /// environment's random stream and applied. An infeasible outcome leaves
    /// the configuration unchanged and is reported through
    /// [`StepStatus::Infeasible`] with zero reward; it still counts against
    /// the horizon.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalAction`] if `action` is not currently legal,
    /// [`Error::Usage`] outside a running episode, and engine errors as-is.
    pub fn step(&mut self, action: ActionId) -> Result<Step> {
        self.ensure_open()?;
        if self.phase != Phase::Running {
            return Err(Error::usage(format!(
                "step called outside a running episode (phase {:?})",
                self.phase
            )));
        }

        let debug = self.debug;
        let session = self.session.as_deref_mut().ok_or(Error::ClosedEnvironment)?;

        let legal = session.legal_actions()?;
        if !legal.contains(&action) {
            return Err(Error::IllegalAction {
                action: action.index(),
                legal: legal.iter().map(|a| a.index()).collect(),
            });
        }

        let outcomes = session.outcomes(action)?;
        let outcome = sample_outcome(&mut self.rng, &outcomes)?;
        let applied = session.apply(action, &outcome)?;
        let snapshot = session.snapshot()?;
        validate_snapshot(&self.info, &snapshot, "step")?;

        self.steps += 1;
        let (reward, status) = match applied {
            Applied::Transition { reward } => (reward, StepStatus::Transition { outcome }),
            Applied::Infeasible => (0.0, StepStatus::Infeasible { outcome }),
        };
        let terminated = snapshot.terminal;
        let truncated = !terminated && self.steps >= self.max_steps;
        let done = terminated || truncated;
        if done {
            self.phase = Phase::Done;
        }

        if debug {
            debug!(
                target: "gmenv::engine",
                action = %self.info.actions[action.index()],
                ?status,
                reward,
                terminated,
                truncated,
                steps = self.steps,
                "step"
            );
            trace_snapshot("step", &snapshot);
        }

        Ok(Step {
            observation: snapshot.observation,
            reward,
            done,
            info: StepInfo {
                status,
                terminated,
                truncated,
                steps: self.steps,
                legal_actions: if terminated {
                    Vec::new()
                } else {
                    snapshot.legal_actions
                },
            },
        })
    }

    /// End the running episode as a truncation without stepping.
    ///
    /// Used when no feasible action remains at a decision point. Does
    /// nothing outside a running episode.
    pub fn end_episode(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.phase == Phase::Running {
            if self.debug {
                debug!(target: "gmenv::engine", steps = self.steps, "episode ended early");
            }
            self.phase = Phase::Done;
        }
        Ok(())
    }

    /// Legal actions of the current configuration, queried from the engine.
    pub fn legal_actions(&mut self) -> Result<Vec<ActionId>> {
        self.ensure_open()?;
        let session = self.session.as_deref_mut().ok_or(Error::ClosedEnvironment)?;
        let legal = session.legal_actions()?;
        if let Some(bad) = legal.iter().find(|a| a.index() >= self.info.actions.len()) {
            return Err(Error::EngineProtocol {
                operation: "legal_actions".to_string(),
                message: format!("action {bad} is outside the vocabulary"),
            });
        }
        Ok(legal)
    }

    /// Release the engine session. Idempotent; afterwards every other
    /// operation fails with [`Error::ClosedEnvironment`].
    pub fn close(&mut self) -> Result<()> {
        self.phase = Phase::Closed;
        match self.session.take() {
            Some(mut session) => {
                debug!(program = %self.program.display(), "closing environment");
                session.close()
            }
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Names of the action vocabulary, indexed by [`ActionId`].
    pub fn action_names(&self) -> &[String] {
        &self.info.actions
    }

    pub fn action_name(&self, action: ActionId) -> Option<&str> {
        self.info.actions.get(action.index()).map(String::as_str)
    }

    /// Size of the discrete action space.
    pub fn action_count(&self) -> usize {
        self.info.actions.len()
    }

    pub fn observation_len(&self) -> usize {
        self.info.observation_len
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Steps taken in the current (or last) episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The environment's random stream, shared with randomized rollout
    /// policies so a single seed reproduces a whole simulation.
    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close engine session");
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("program", &self.program)
            .field("phase", &self.phase)
            .field("steps", &self.steps)
            .field("max_steps", &self.max_steps)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

fn release_failed_session(session: &mut dyn EngineSession) {
    if let Err(e) = session.close() {
        warn!(error = %e, "failed to close engine after load error");
    }
}

fn as_load_error(program: &Path, error: Error) -> Error {
    match error {
        Error::EngineLoad { .. } => error,
        other => Error::EngineLoad {
            program: program.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn validate_snapshot(info: &ProgramInfo, snapshot: &Snapshot, operation: &str) -> Result<()> {
    if snapshot.observation.len() != info.observation_len {
        return Err(Error::EngineProtocol {
            operation: operation.to_string(),
            message: format!(
                "observation has {} components, expected {}",
                snapshot.observation.len(),
                info.observation_len
            ),
        });
    }
    if let Some(bad) = snapshot
        .legal_actions
        .iter()
        .find(|a| a.index() >= info.actions.len())
    {
        return Err(Error::EngineProtocol {
            operation: operation.to_string(),
            message: format!("action {bad} is outside the vocabulary"),
        });
    }
    if !snapshot.terminal && snapshot.legal_actions.is_empty() {
        return Err(Error::NoActionsAvailable {
            observation: snapshot.observation.values().to_vec(),
        });
    }
    Ok(())
}

fn trace_snapshot(operation: &str, snapshot: &Snapshot) {
    debug!(
        target: "gmenv::engine",
        operation,
        observation = %snapshot.observation,
        legal = ?snapshot.legal_actions,
        terminal = snapshot.terminal,
        "snapshot"
    );
}

/// Draw one outcome id from the engine's distribution.
fn sample_outcome(rng: &mut StdRng, outcomes: &[OutcomeOption]) -> Result<String> {
    let protocol_error = |message: String| Error::EngineProtocol {
        operation: "outcomes".to_string(),
        message,
    };
    if outcomes.is_empty() {
        return Err(protocol_error("empty outcome distribution".to_string()));
    }
    if let Some(bad) = outcomes
        .iter()
        .find(|o| !(o.probability >= 0.0 && o.probability.is_finite()))
    {
        return Err(protocol_error(format!(
            "outcome '{}' has probability {}",
            bad.id, bad.probability
        )));
    }
    let total: f64 = outcomes.iter().map(|o| o.probability).sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(protocol_error(format!("probabilities sum to {total}")));
    }

    let ticket = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for outcome in outcomes {
        cumulative += outcome.probability;
        if ticket < cumulative {
            return Ok(outcome.id.clone());
        }
    }
    // Rounding can leave the ticket just past the last bucket.
    let last = outcomes
        .iter()
        .rev()
        .find(|o| o.probability > 0.0)
        .unwrap_or(&outcomes[outcomes.len() - 1]);
    Ok(last.id.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    /// Session that describes itself as configured and refuses to close.
    struct StubbornSession {
        info: Option<ProgramInfo>,
        close_calls: Arc<AtomicUsize>,
    }

    impl StubbornSession {
        fn boxed(info: Option<ProgramInfo>, close_calls: &Arc<AtomicUsize>) -> Box<dyn EngineSession> {
            Box::new(Self {
                info,
                close_calls: Arc::clone(close_calls),
            })
        }
    }

    fn unsupported<T>(operation: &str) -> Result<T> {
        Err(Error::EngineRejected {
            operation: operation.to_string(),
            message: "not supported".to_string(),
        })
    }

    impl EngineSession for StubbornSession {
        fn describe(&mut self) -> Result<ProgramInfo> {
            self.info.clone().ok_or_else(|| Error::EngineCrash {
                operation: "describe".to_string(),
                message: "engine died".to_string(),
            })
        }

        fn reset(&mut self) -> Result<()> {
            unsupported("reset")
        }

        fn snapshot(&mut self) -> Result<Snapshot> {
            unsupported("snapshot")
        }

        fn legal_actions(&mut self) -> Result<Vec<ActionId>> {
            unsupported("legal_actions")
        }

        fn outcomes(&mut self, _action: ActionId) -> Result<Vec<OutcomeOption>> {
            unsupported("outcomes")
        }

        fn apply(&mut self, _action: ActionId, _outcome: &str) -> Result<Applied> {
            unsupported("apply")
        }

        fn close(&mut self) -> Result<()> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            unsupported("close")
        }
    }

    fn info(actions: &[&str]) -> ProgramInfo {
        ProgramInfo {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            observation_len: 1,
        }
    }

    #[test]
    fn failed_open_closes_session_even_when_close_fails() {
        let cases = [
            (None, EnvironmentSettings::new()),
            (Some(info(&[])), EnvironmentSettings::new()),
            (Some(info(&["go"])), EnvironmentSettings::new().with_max_steps(0)),
        ];
        for (described, settings) in cases {
            let close_calls = Arc::new(AtomicUsize::new(0));
            let session = StubbornSession::boxed(described, &close_calls);
            let err = Environment::from_session(session, "stub", settings).unwrap_err();
            assert!(
                matches!(err, Error::EngineLoad { .. } | Error::InvalidConfiguration { .. }),
                "got {err:?}"
            );
            assert_eq!(close_calls.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn sampling_follows_cumulative_distribution() {
        let outcomes = vec![
            OutcomeOption {
                id: "never".to_string(),
                probability: 0.0,
            },
            OutcomeOption {
                id: "always".to_string(),
                probability: 1.0,
            },
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(sample_outcome(&mut rng, &outcomes).unwrap(), "always");
        }
    }

    #[test]
    fn malformed_distribution_is_protocol_error() {
        let outcomes = vec![OutcomeOption {
            id: "half".to_string(),
            probability: 0.5,
        }];
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            sample_outcome(&mut rng, &outcomes),
            Err(Error::EngineProtocol { .. })
        ));
        assert!(sample_outcome(&mut rng, &[]).is_err());
    }

    #[test]
    fn sampling_is_reproducible_for_a_seed() {
        let outcomes: Vec<OutcomeOption> = (0..4)
            .map(|i| OutcomeOption {
                id: format!("o{i}"),
                probability: 0.25,
            })
            .collect();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| sample_outcome(&mut rng, &outcomes).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(11), draw(11));
    }
}
