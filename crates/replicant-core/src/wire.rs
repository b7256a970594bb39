//! Wire messages and the positional argument codec.
//!
//! The transport carries named messages with positional argument lists; an
//! optional trailing acknowledgement is invoked exactly once by the receiver
//! with reply values. This module defines the typed message enums for both
//! directions plus the `(name, args)` encoding:
//!
//! | message            | direction | arguments                      | ack reply                  |
//! |--------------------|-----------|--------------------------------|----------------------------|
//! | `replicantRegister`| C→S       | `(name)`                       | `()`                       |
//! | `replicantGet`     | C→S       | `(name)`                       | `(revisionHistory, value)` |
//! | `replicantSet`     | C→S       | `(name, revisionHistory, value)` | `(success)`              |
//! | `replicantChanged` | C→S       | `(name, revisionHistory, changes)` | `(success)`            |
//! | `replicantSet`     | S→room    | `(name, revisionHistory, value)` | —                        |
//! | `replicantChanged` | S→room    | `(name, revisionHistory, changes)` | —                      |
//!
//! An absent state value in the `replicantGet` reply is encoded by omitting
//! the trailing argument, keeping it distinct from an explicit `null` value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::change::Change;

pub const MSG_REGISTER: &str = "replicantRegister";
pub const MSG_GET: &str = "replicantGet";
pub const MSG_SET: &str = "replicantSet";
pub const MSG_CHANGED: &str = "replicantChanged";

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("unknown message {0:?}")]
    UnknownMessage(String),
    #[error("{0}: wrong number of arguments")]
    Arity(&'static str),
    #[error("{0}: malformed argument at position {1}")]
    Argument(&'static str, usize),
}

// ── Client → server ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Register {
        name: String,
    },
    Get {
        name: String,
    },
    Set {
        name: String,
        revision_history: Vec<String>,
        value: Value,
    },
    Changed {
        name: String,
        revision_history: Vec<String>,
        changes: Vec<Change>,
    },
}

impl ClientMessage {
    pub fn message_name(&self) -> &'static str {
        match self {
            ClientMessage::Register { .. } => MSG_REGISTER,
            ClientMessage::Get { .. } => MSG_GET,
            ClientMessage::Set { .. } => MSG_SET,
            ClientMessage::Changed { .. } => MSG_CHANGED,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ClientMessage::Register { name }
            | ClientMessage::Get { name }
            | ClientMessage::Set { name, .. }
            | ClientMessage::Changed { name, .. } => name,
        }
    }

    /// Encodes to the positional `(message, args)` wire form.
    pub fn encode(&self) -> (&'static str, Vec<Value>) {
        match self {
            ClientMessage::Register { name } | ClientMessage::Get { name } => {
                (self.message_name(), vec![Value::String(name.clone())])
            }
            ClientMessage::Set {
                name,
                revision_history,
                value,
            } => (
                MSG_SET,
                vec![
                    Value::String(name.clone()),
                    encode_history(revision_history),
                    value.clone(),
                ],
            ),
            ClientMessage::Changed {
                name,
                revision_history,
                changes,
            } => (
                MSG_CHANGED,
                vec![
                    Value::String(name.clone()),
                    encode_history(revision_history),
                    serde_json::to_value(changes).unwrap_or_default(),
                ],
            ),
        }
    }

    /// Decodes the positional wire form back into a typed message.
    pub fn decode(message: &str, args: &[Value]) -> Result<Self, WireError> {
        match message {
            MSG_REGISTER => Ok(ClientMessage::Register {
                name: decode_name(MSG_REGISTER, args)?,
            }),
            MSG_GET => Ok(ClientMessage::Get {
                name: decode_name(MSG_GET, args)?,
            }),
            MSG_SET => {
                if args.len() != 3 {
                    return Err(WireError::Arity(MSG_SET));
                }
                Ok(ClientMessage::Set {
                    name: string_arg(MSG_SET, args, 0)?,
                    revision_history: decode_history(MSG_SET, &args[1])?,
                    value: args[2].clone(),
                })
            }
            MSG_CHANGED => {
                if args.len() != 3 {
                    return Err(WireError::Arity(MSG_CHANGED));
                }
                Ok(ClientMessage::Changed {
                    name: string_arg(MSG_CHANGED, args, 0)?,
                    revision_history: decode_history(MSG_CHANGED, &args[1])?,
                    changes: serde_json::from_value(args[2].clone())
                        .map_err(|_| WireError::Argument(MSG_CHANGED, 2))?,
                })
            }
            other => Err(WireError::UnknownMessage(other.to_owned())),
        }
    }
}

// ── Acknowledgements ──────────────────────────────────────────────────────

/// Reply values carried by a message acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerReply {
    /// Ack of `replicantRegister`.
    Registered,
    /// Ack of `replicantGet`: the current authoritative state.
    State {
        revision_history: Vec<String>,
        value: Option<Value>,
    },
    /// Ack of `replicantSet` / `replicantChanged`.
    Accepted(bool),
}

impl ServerReply {
    /// Encodes the reply as positional ack arguments.
    pub fn encode(&self) -> Vec<Value> {
        match self {
            ServerReply::Registered => Vec::new(),
            ServerReply::State {
                revision_history,
                value,
            } => {
                let mut args = vec![encode_history(revision_history)];
                if let Some(v) = value {
                    args.push(v.clone());
                }
                args
            }
            ServerReply::Accepted(ok) => vec![Value::Bool(*ok)],
        }
    }

    /// Decodes ack arguments for the given request message.
    pub fn decode(request: &str, args: &[Value]) -> Result<Self, WireError> {
        match request {
            MSG_REGISTER => {
                if !args.is_empty() {
                    return Err(WireError::Arity(MSG_REGISTER));
                }
                Ok(ServerReply::Registered)
            }
            MSG_GET => match args {
                [history] => Ok(ServerReply::State {
                    revision_history: decode_history(MSG_GET, history)?,
                    value: None,
                }),
                [history, value] => Ok(ServerReply::State {
                    revision_history: decode_history(MSG_GET, history)?,
                    value: Some(value.clone()),
                }),
                _ => Err(WireError::Arity(MSG_GET)),
            },
            MSG_SET | MSG_CHANGED => {
                let message = if request == MSG_SET { MSG_SET } else { MSG_CHANGED };
                match args {
                    [Value::Bool(ok)] => Ok(ServerReply::Accepted(*ok)),
                    [_] => Err(WireError::Argument(message, 0)),
                    _ => Err(WireError::Arity(message)),
                }
            }
            other => Err(WireError::UnknownMessage(other.to_owned())),
        }
    }
}

// ── Server → room multicast ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerEvent {
    Set {
        name: String,
        revision_history: Vec<String>,
        value: Value,
    },
    Changed {
        name: String,
        revision_history: Vec<String>,
        changes: Vec<Change>,
    },
}

impl ServerEvent {
    pub fn message_name(&self) -> &'static str {
        match self {
            ServerEvent::Set { .. } => MSG_SET,
            ServerEvent::Changed { .. } => MSG_CHANGED,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ServerEvent::Set { name, .. } | ServerEvent::Changed { name, .. } => name,
        }
    }

    pub fn encode(&self) -> (&'static str, Vec<Value>) {
        match self {
            ServerEvent::Set {
                name,
                revision_history,
                value,
            } => (
                MSG_SET,
                vec![
                    Value::String(name.clone()),
                    encode_history(revision_history),
                    value.clone(),
                ],
            ),
            ServerEvent::Changed {
                name,
                revision_history,
                changes,
            } => (
                MSG_CHANGED,
                vec![
                    Value::String(name.clone()),
                    encode_history(revision_history),
                    serde_json::to_value(changes).unwrap_or_default(),
                ],
            ),
        }
    }

    pub fn decode(message: &str, args: &[Value]) -> Result<Self, WireError> {
        match ClientMessage::decode(message, args)? {
            ClientMessage::Set {
                name,
                revision_history,
                value,
            } => Ok(ServerEvent::Set {
                name,
                revision_history,
                value,
            }),
            ClientMessage::Changed {
                name,
                revision_history,
                changes,
            } => Ok(ServerEvent::Changed {
                name,
                revision_history,
                changes,
            }),
            _ => Err(WireError::UnknownMessage(message.to_owned())),
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────

fn encode_history(history: &[String]) -> Value {
    Value::Array(history.iter().map(|l| Value::String(l.clone())).collect())
}

fn decode_history(message: &'static str, arg: &Value) -> Result<Vec<String>, WireError> {
    let Value::Array(items) = arg else {
        return Err(WireError::Argument(message, 1));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or(WireError::Argument(message, 1))
        })
        .collect()
}

fn decode_name(message: &'static str, args: &[Value]) -> Result<String, WireError> {
    if args.len() != 1 {
        return Err(WireError::Arity(message));
    }
    string_arg(message, args, 0)
}

fn string_arg(message: &'static str, args: &[Value], index: usize) -> Result<String, WireError> {
    args[index]
        .as_str()
        .map(str::to_owned)
        .ok_or(WireError::Argument(message, index))
}
