//! Datagram tags and framing.
//!
//! Every message fits in one datagram. Control messages are short ASCII tags,
//! optionally followed by a payload:
//!
//! ```text
//! client -> server                 server -> client
//! ----------------                 ----------------
//! join_game[...]                   OK | game_already_started
//! controls:<ControlState blob>     (no reply)
//! get_frame                        waiting | SEQ frame | game_over: frame
//! echo                             echo
//! anything else                    unknown
//!
//! SEQ frame:       "SEQ" | sequence (u64 BE) | snapshot payload
//! game_over frame: "game_over:" | winner image reference (UTF-8, empty on a draw)
//! ```

use crate::codec::{DecodeError, EncodeError, SnapshotCodec};
use crate::controls::ControlState;
use crate::snapshot::Snapshot;
use crate::MAX_DATAGRAM;

pub const OK: &[u8] = b"OK";
pub const UNKNOWN: &[u8] = b"unknown";
pub const ECHO: &[u8] = b"echo";
pub const JOIN_GAME: &[u8] = b"join_game";
pub const GET_FRAME: &[u8] = b"get_frame";
pub const SEND_CONTROLS: &[u8] = b"controls:";
pub const WAITING: &[u8] = b"waiting";
pub const GAME_ALREADY_STARTED: &[u8] = b"game_already_started";
pub const GAME_OVER: &[u8] = b"game_over:";
pub const SEQ: &[u8] = b"SEQ";

const SEQ_HEADER_LEN: usize = 3 + 8;

/// A datagram received by the server, classified by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// `join_game`, possibly followed by bytes the server ignores.
    Join,
    /// Raw control blob following the `controls:` prefix.
    Controls(&'a [u8]),
    GetFrame,
    Echo,
    Unknown,
}

impl<'a> Request<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        if data.starts_with(JOIN_GAME) {
            Request::Join
        } else if let Some(payload) = data.strip_prefix(SEND_CONTROLS) {
            Request::Controls(payload)
        } else if data == GET_FRAME {
            Request::GetFrame
        } else if data == ECHO {
            Request::Echo
        } else {
            Request::Unknown
        }
    }
}

/// A broadcast world state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedMessage {
    pub sequence: u64,
    pub snapshot: Snapshot,
}

/// A datagram received by a client, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Ok,
    GameAlreadyStarted,
    Waiting,
    Unknown,
    Echo,
    /// Match ended; `None` when nobody survived.
    GameOver(Option<String>),
    Sequenced(SequencedMessage),
}

impl Frame {
    pub fn parse(data: &[u8], codec: &SnapshotCodec) -> Result<Self, DecodeError> {
        if data == OK {
            return Ok(Frame::Ok);
        } else if data == GAME_ALREADY_STARTED {
            return Ok(Frame::GameAlreadyStarted);
        } else if data == WAITING {
            return Ok(Frame::Waiting);
        } else if data == UNKNOWN {
            return Ok(Frame::Unknown);
        } else if data == ECHO {
            return Ok(Frame::Echo);
        }

        if let Some(winner) = data.strip_prefix(GAME_OVER) {
            let winner = std::str::from_utf8(winner).map_err(|_| DecodeError::InvalidUtf8)?;
            let winner = (!winner.is_empty()).then(|| winner.to_string());
            return Ok(Frame::GameOver(winner));
        }

        if data.starts_with(SEQ) {
            if data.len() < SEQ_HEADER_LEN {
                return Err(DecodeError::Truncated {
                    needed: SEQ_HEADER_LEN,
                    got: data.len(),
                });
            }
            let mut sequence = [0u8; 8];
            sequence.copy_from_slice(&data[3..SEQ_HEADER_LEN]);
            let snapshot = codec.decode(&data[SEQ_HEADER_LEN..])?;
            return Ok(Frame::Sequenced(SequencedMessage {
                sequence: u64::from_be_bytes(sequence),
                snapshot,
            }));
        }

        Err(DecodeError::Malformed(format!(
            "unrecognised frame of {} bytes",
            data.len()
        )))
    }
}

/// Builds a `controls:` message.
pub fn controls_message(controls: &ControlState) -> Result<Vec<u8>, EncodeError> {
    let blob = controls.encode()?;
    let mut message = Vec::with_capacity(SEND_CONTROLS.len() + blob.len());
    message.extend_from_slice(SEND_CONTROLS);
    message.extend(blob);
    Ok(message)
}

/// Builds a SEQ frame, refusing anything that would not fit a datagram.
pub fn sequenced_frame(
    sequence: u64,
    snapshot: &Snapshot,
    codec: &SnapshotCodec,
) -> Result<Vec<u8>, EncodeError> {
    let payload = codec.encode(snapshot)?;
    let mut frame = Vec::with_capacity(SEQ_HEADER_LEN + payload.len());
    frame.extend_from_slice(SEQ);
    frame.extend_from_slice(&sequence.to_be_bytes());
    frame.extend(payload);

    if frame.len() > MAX_DATAGRAM {
        return Err(EncodeError::Oversized { len: frame.len() });
    }
    Ok(frame)
}

/// Builds a `game_over:` frame naming the winner's image, if any.
pub fn game_over_frame(winner: Option<&str>) -> Vec<u8> {
    let winner = winner.unwrap_or_default();
    let mut frame = Vec::with_capacity(GAME_OVER.len() + winner.len());
    frame.extend_from_slice(GAME_OVER);
    frame.extend_from_slice(winner.as_bytes());
    frame
}
