//! Engine session backed by an external engine process.
//!
//! The process is started as `command [args...] <program>` and speaks the
//! bridge protocol on stdin/stdout. Every round-trip is bounded by a
//! timeout; stderr is forwarded to tracing.

use std::{
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::protocol::{Reply, Request, decode_reply, encode};
use crate::{
    Error, Result,
    ports::{Applied, EngineLoader, EngineSession, OutcomeOption, ProgramInfo, Snapshot},
    types::ActionId,
};

/// Default bound on a single engine round-trip.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(30);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Session talking to an engine process over stdio.
pub struct ProcessEngine {
    program: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    replies: Receiver<std::io::Result<String>>,
    timeout: Duration,
    /// Set after a timeout; a late reply would desynchronise the stream.
    unresponsive: bool,
    closed: bool,
}

impl ProcessEngine {
    /// Spawn `command args... program`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineLoad`] if the program file is missing or the
    /// process cannot be spawned.
    pub fn spawn(command: &str, args: &[String], program: &Path, timeout: Duration) -> Result<Self> {
        let load_error = |reason: String| Error::EngineLoad {
            program: program.to_path_buf(),
            reason,
        };
        if !program.is_file() {
            return Err(load_error("program file not found".to_string()));
        }

        let mut child = Command::new(command)
            .args(args)
            .arg(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| load_error(format!("failed to spawn '{command}': {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| load_error("stdout was not piped".to_string()))?;
        let stderr = child.stderr.take();

        let (tx, replies) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        if let Some(stderr) = stderr {
            let program_name = program.display().to_string();
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                    debug!(target: "gmenv::engine", program = %program_name, "{line}");
                }
            });
        }

        debug!(command, program = %program.display(), "engine process started");
        Ok(Self {
            program: program.to_path_buf(),
            child,
            stdin,
            replies,
            timeout,
            unresponsive: false,
            closed: false,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn crash(&mut self, operation: &str, message: String) -> Error {
        let status = match self.child.try_wait() {
            Ok(Some(status)) => format!(" (process exited with {status})"),
            _ => String::new(),
        };
        Error::EngineCrash {
            operation: operation.to_string(),
            message: format!("{message}{status}"),
        }
    }

    fn round_trip(&mut self, request: &Request) -> Result<Reply> {
        let operation = request.operation();
        if self.closed {
            return Err(Error::EngineRejected {
                operation: operation.to_string(),
                message: "session is closed".to_string(),
            });
        }
        if self.unresponsive {
            return Err(Error::EngineCrash {
                operation: operation.to_string(),
                message: "engine stopped responding earlier in this session".to_string(),
            });
        }

        let line = encode(request)?;
        let written = match self.stdin.as_mut() {
            Some(stdin) => writeln!(stdin, "{line}").and_then(|()| stdin.flush()),
            None => Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe)),
        };
        if let Err(e) = written {
            return Err(self.crash(operation, format!("write failed: {e}")));
        }

        match self.replies.recv_timeout(self.timeout) {
            Ok(Ok(reply)) => decode_reply(&reply, operation)?.into_result(operation),
            Ok(Err(e)) => Err(self.crash(operation, format!("read failed: {e}"))),
            Err(RecvTimeoutError::Timeout) => {
                self.unresponsive = true;
                Err(Error::EngineTimeout {
                    operation: operation.to_string(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(self.crash(operation, "engine closed its output".to_string()))
            }
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        // Dropping stdin signals end of input to engines that ignore `close`.
        self.stdin = None;
        match self.child.wait_timeout(SHUTDOWN_GRACE) {
            Ok(Some(status)) => {
                debug!(%status, "engine process exited");
                Ok(())
            }
            Ok(None) => {
                warn!(program = %self.program.display(), "engine did not exit, killing");
                self.child.kill()?;
                self.child.wait()?;
                Ok(())
            }
            Err(source) => Err(Error::Io {
                operation: "wait for engine process".to_string(),
                source,
            }),
        }
    }
}

impl EngineSession for ProcessEngine {
    fn describe(&mut self) -> Result<ProgramInfo> {
        self.round_trip(&Request::Describe)?.require_info("describe")
    }

    fn reset(&mut self) -> Result<()> {
        self.round_trip(&Request::Reset).map(|_| ())
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        self.round_trip(&Request::Snapshot)?
            .require_snapshot("snapshot")
    }

    fn legal_actions(&mut self) -> Result<Vec<ActionId>> {
        self.round_trip(&Request::LegalActions)?
            .require_legal("legal_actions")
    }

    fn outcomes(&mut self, action: ActionId) -> Result<Vec<OutcomeOption>> {
        self.round_trip(&Request::Outcomes {
            action: action.index(),
        })?
        .require_outcomes("outcomes")
    }

    fn apply(&mut self, action: ActionId, outcome: &str) -> Result<Applied> {
        let reply = self.round_trip(&Request::Apply {
            action: action.index(),
            outcome: outcome.to_string(),
        })?;
        if reply.infeasible.unwrap_or(false) {
            return Ok(Applied::Infeasible);
        }
        match reply.reward {
            Some(reward) => Ok(Applied::Transition { reward }),
            None => Err(Error::EngineProtocol {
                operation: "apply".to_string(),
                message: "reply has neither 'reward' nor 'infeasible'".to_string(),
            }),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if let Err(e) = self.round_trip(&Request::Close) {
            debug!(error = %e, "engine did not acknowledge close");
        }
        self.closed = true;
        self.shutdown()
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close engine process");
        }
    }
}

/// Loader that spawns [`ProcessEngine`] sessions.
#[derive(Debug, Clone)]
pub struct ProcessEngineLoader {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessEngineLoader {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl EngineLoader for ProcessEngineLoader {
    fn load(&self, program: &Path) -> Result<Box<dyn EngineSession>> {
        Ok(Box::new(ProcessEngine::spawn(
            &self.command,
            &self.args,
            program,
            self.timeout,
        )?))
    }

    fn name(&self) -> &str {
        &self.command
    }
}
