//! Serve any [`EngineSession`] over the bridge protocol.

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use super::protocol::{Reply, Request, encode};
use crate::{
    Error, Result,
    ports::{Applied, EngineSession},
    types::ActionId,
};

/// Answer protocol requests from `input` until `close` or end of input.
///
/// Engine errors are reported to the client as `ok: false` replies and do
/// not stop the server. Only I/O failures on the streams are returned.
pub fn serve<R, W>(session: &mut dyn EngineSession, input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.map_err(|source| Error::Io {
            operation: "read engine request".to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let (reply, done) = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!(op = request.operation(), "engine request");
                let done = request == Request::Close;
                (handle(session, request), done)
            }
            Err(e) => {
                warn!(error = %e, "unparsable engine request");
                (Reply::failure(format!("bad request: {e}")), false)
            }
        };

        writeln!(output, "{}", encode(&reply)?).map_err(|source| Error::Io {
            operation: "write engine reply".to_string(),
            source,
        })?;
        output.flush()?;

        if done {
            return Ok(());
        }
    }
    session.close()
}

fn handle(session: &mut dyn EngineSession, request: Request) -> Reply {
    let result = match request {
        Request::Describe => session.describe().map(Reply::described),
        Request::Reset => session.reset().map(|()| Reply::ok()),
        Request::Snapshot => session.snapshot().map(Reply::snapshot),
        Request::LegalActions => session.legal_actions().map(Reply::legal),
        Request::Outcomes { action } => session.outcomes(ActionId::new(action)).map(|outcomes| {
            Reply {
                outcomes: Some(outcomes),
                ..Reply::ok()
            }
        }),
        Request::Apply { action, outcome } => session
            .apply(ActionId::new(action), &outcome)
            .map(|applied| match applied {
                Applied::Transition { reward } => Reply {
                    reward: Some(reward),
                    ..Reply::ok()
                },
                Applied::Infeasible => Reply {
                    infeasible: Some(true),
                    ..Reply::ok()
                },
            }),
        Request::Close => session.close().map(|()| Reply::ok()),
    };
    result.unwrap_or_else(|e| Reply::failure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{adapters::TableEngine, program::TableProgram};

    fn engine() -> TableEngine {
        let program: TableProgram = serde_json::from_value(serde_json::json!({
            "name": "one-step",
            "start": "a",
            "actions": ["go"],
            "states": {
                "a": {
                    "features": [0.0, 1.0],
                    "actions": { "go": [{ "outcome": "done", "probability": 1.0, "next": "b", "reward": 2.0 }] }
                },
                "b": { "features": [1.0, 1.0], "terminal": true }
            }
        }))
        .unwrap();
        TableEngine::new(program)
    }

    fn replies(output: Vec<u8>) -> Vec<Reply> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn answers_requests_in_order() {
        let input = concat!(
            r#"{"op":"describe"}"#,
            "\n",
            r#"{"op":"outcomes","action":0}"#,
            "\n",
            r#"{"op":"apply","action":0,"outcome":"done"}"#,
            "\n",
            r#"{"op":"snapshot"}"#,
            "\n",
            r#"{"op":"close"}"#,
            "\n",
        );
        let mut session = engine();
        let mut output = Vec::new();
        serve(&mut session, Cursor::new(input), &mut output).unwrap();

        let replies = replies(output);
        assert_eq!(replies.len(), 5);
        assert_eq!(replies[0].actions.as_deref(), Some(&["go".to_string()][..]));
        assert_eq!(replies[1].outcomes.as_ref().unwrap()[0].id, "done");
        assert_eq!(replies[2].reward, Some(2.0));
        assert_eq!(replies[3].terminal, Some(true));
        assert!(replies[4].ok);
    }

    #[test]
    fn engine_errors_do_not_stop_the_server() {
        let input = "{\"op\":\"outcomes\",\"action\":9}\nnot json\n{\"op\":\"reset\"}\n";
        let mut session = engine();
        let mut output = Vec::new();
        serve(&mut session, Cursor::new(input), &mut output).unwrap();

        let replies = replies(output);
        assert_eq!(replies.len(), 3);
        assert!(!replies[0].ok);
        assert!(!replies[1].ok);
        assert!(replies[2].ok);
    }
}
