//! Line-delimited JSON bridge protocol between gmenv and an engine process.
//!
//! Each request and each reply is one JSON object on its own line. Replies
//! carry `"ok": true` with operation-specific fields, or `"ok": false` with
//! an `error` message.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{OutcomeOption, ProgramInfo, Snapshot},
    types::{ActionId, Observation},
};

/// Requests sent to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Describe,
    Reset,
    Snapshot,
    LegalActions,
    Outcomes { action: usize },
    Apply { action: usize, outcome: String },
    Close,
}

impl Request {
    pub fn operation(&self) -> &'static str {
        match self {
            Request::Describe => "describe",
            Request::Reset => "reset",
            Request::Snapshot => "snapshot",
            Request::LegalActions => "legal_actions",
            Request::Outcomes { .. } => "outcomes",
            Request::Apply { .. } => "apply",
            Request::Close => "close",
        }
    }
}

/// Reply from the engine. Only the fields relevant to the request are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<Vec<OutcomeOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infeasible: Option<bool>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn described(info: ProgramInfo) -> Self {
        Self {
            actions: Some(info.actions),
            observation_len: Some(info.observation_len),
            ..Self::ok()
        }
    }

    pub fn snapshot(snapshot: Snapshot) -> Self {
        Self {
            observation: Some(snapshot.observation.into_inner()),
            legal: Some(snapshot.legal_actions.into_iter().map(usize::from).collect()),
            terminal: Some(snapshot.terminal),
            ..Self::ok()
        }
    }

    pub fn legal(actions: Vec<ActionId>) -> Self {
        Self {
            legal: Some(actions.into_iter().map(usize::from).collect()),
            ..Self::ok()
        }
    }

    /// Turn an `ok: false` reply into [`Error::EngineRejected`].
    pub fn into_result(self, operation: &str) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(Error::EngineRejected {
                operation: operation.to_string(),
                message: self
                    .error
                    .unwrap_or_else(|| "no error message".to_string()),
            })
        }
    }

    pub fn require_info(self, operation: &str) -> Result<ProgramInfo> {
        let actions = require(self.actions, operation, "actions")?;
        let observation_len = require(self.observation_len, operation, "observation_len")?;
        Ok(ProgramInfo {
            actions,
            observation_len,
        })
    }

    pub fn require_snapshot(self, operation: &str) -> Result<Snapshot> {
        let observation = require(self.observation, operation, "observation")?;
        let legal = require(self.legal, operation, "legal")?;
        let terminal = require(self.terminal, operation, "terminal")?;
        Ok(Snapshot {
            observation: Observation::new(observation),
            legal_actions: legal.into_iter().map(ActionId::new).collect(),
            terminal,
        })
    }

    pub fn require_legal(self, operation: &str) -> Result<Vec<ActionId>> {
        let legal = require(self.legal, operation, "legal")?;
        Ok(legal.into_iter().map(ActionId::new).collect())
    }

    pub fn require_outcomes(self, operation: &str) -> Result<Vec<OutcomeOption>> {
        require(self.outcomes, operation, "outcomes")
    }
}

fn require<T>(field: Option<T>, operation: &str, name: &str) -> Result<T> {
    field.ok_or_else(|| Error::EngineProtocol {
        operation: operation.to_string(),
        message: format!("reply is missing '{name}'"),
    })
}

/// Encode a message as a single protocol line (without the newline).
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decode one protocol line.
pub fn decode_reply(line: &str, operation: &str) -> Result<Reply> {
    serde_json::from_str(line.trim()).map_err(|e| Error::EngineProtocol {
        operation: operation.to_string(),
        message: format!("{e}: {line}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_tagged_by_op() {
        let line = encode(&Request::Apply {
            action: 2,
            outcome: "on_time".to_string(),
        })
        .unwrap();
        assert_eq!(line, r#"{"op":"apply","action":2,"outcome":"on_time"}"#);
        assert_eq!(encode(&Request::LegalActions).unwrap(), r#"{"op":"legal_actions"}"#);
    }

    #[test]
    fn failure_reply_becomes_rejection() {
        let reply = decode_reply(r#"{"ok": false, "error": "no such action"}"#, "apply").unwrap();
        let err = reply.into_result("apply").unwrap_err();
        assert!(matches!(err, Error::EngineRejected { ref message, .. } if message == "no such action"));
    }

    #[test]
    fn missing_field_is_protocol_error() {
        let reply = decode_reply(r#"{"ok": true, "legal": [0]}"#, "snapshot").unwrap();
        assert!(matches!(
            reply.require_snapshot("snapshot"),
            Err(Error::EngineProtocol { .. })
        ));
    }

    #[test]
    fn garbage_line_is_protocol_error() {
        assert!(matches!(
            decode_reply("hello", "describe"),
            Err(Error::EngineProtocol { .. })
        ));
    }
}
