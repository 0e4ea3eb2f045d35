//! Membership Wire Protocol
//!
//! Fixed-layout binary codec for the three gossip message kinds. Every
//! message is `[kind: 1 tag byte][payload]`, all integers big-endian:
//!
//! - `JOIN_REQUEST`: `[PeerId: 6][heartbeat: u64]`
//! - `JOIN_REPLY` / `HEARTBEAT`: `[count: u32][count × (PeerId: 6, heartbeat: u64, timestamp: u64)]`
//!
//! A join reply and a heartbeat share one snapshot layout and differ only in
//! the tag, so a freshly admitted node receives the entire known table in a
//! single message instead of one entry at a time.
//!
//! Decoding validates the declared entry count against the remaining payload
//! length; anything that does not fit is rejected as [`WireError::Malformed`]
//! with no state touched.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use super::types::PeerId;

/// Serialized width of a [`PeerId`]: u32 host + u16 port.
const PEER_ID_LEN: usize = 6;
/// Serialized width of one snapshot record: PeerId + heartbeat + timestamp.
const DIGEST_LEN: usize = PEER_ID_LEN + 8 + 8;
/// Serialized width of a join request payload: PeerId + heartbeat.
const JOIN_REQUEST_LEN: usize = PEER_ID_LEN + 8;

/// Wire tag of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// Reserved placeholder tag. Never valid on the wire; decoders treat it
    /// as unrecognized.
    Untyped = 0,
    JoinRequest = 1,
    JoinReply = 2,
    Heartbeat = 3,
}

impl MessageKind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::JoinRequest),
            2 => Some(Self::JoinReply),
            3 => Some(Self::Heartbeat),
            _ => None,
        }
    }
}

/// One membership row as carried in a snapshot payload.
///
/// The timestamp is the sender's local clock and is informational only:
/// receivers stamp merged entries with their own clock, never the sender's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerDigest {
    pub id: PeerId,
    pub heartbeat: u64,
    pub timestamp: u64,
}

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    JoinRequest { from: PeerId, heartbeat: u64 },
    JoinReply { members: Vec<PeerDigest> },
    Heartbeat { members: Vec<PeerDigest> },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::JoinRequest { .. } => MessageKind::JoinRequest,
            Message::JoinReply { .. } => MessageKind::JoinReply,
            Message::Heartbeat { .. } => MessageKind::Heartbeat,
        }
    }

    pub fn encode(&self) -> Bytes {
        match self {
            Message::JoinRequest { from, heartbeat } => encode_join_request(*from, *heartbeat),
            Message::JoinReply { members } => encode_snapshot(MessageKind::JoinReply, members),
            Message::Heartbeat { members } => encode_snapshot(MessageKind::Heartbeat, members),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unrecognized message kind tag {tag}")]
    UnknownKind { tag: u8 },
    #[error("malformed {kind:?} message: {reason}")]
    Malformed {
        kind: MessageKind,
        reason: &'static str,
    },
}

/// Encodes the one-shot message a joiner sends to the rendezvous member.
pub fn encode_join_request(from: PeerId, heartbeat: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + JOIN_REQUEST_LEN);
    buf.put_u8(MessageKind::JoinRequest as u8);
    put_peer_id(&mut buf, from);
    buf.put_u64(heartbeat);
    buf.freeze()
}

/// Encodes a full-table snapshot under the given tag.
///
/// `kind` must be [`MessageKind::JoinReply`] or [`MessageKind::Heartbeat`];
/// the payload shape is identical for both.
pub fn encode_snapshot(kind: MessageKind, members: &[PeerDigest]) -> Bytes {
    debug_assert!(matches!(
        kind,
        MessageKind::JoinReply | MessageKind::Heartbeat
    ));

    let mut buf = BytesMut::with_capacity(1 + 4 + members.len() * DIGEST_LEN);
    buf.put_u8(kind as u8);
    buf.put_u32(members.len() as u32);
    for member in members {
        put_peer_id(&mut buf, member.id);
        buf.put_u64(member.heartbeat);
        buf.put_u64(member.timestamp);
    }
    buf.freeze()
}

/// Decodes a raw datagram into a typed message.
pub fn decode(bytes: &[u8]) -> Result<Message, WireError> {
    let mut buf = bytes;
    if !buf.has_remaining() {
        return Err(WireError::Malformed {
            kind: MessageKind::Untyped,
            reason: "missing kind tag",
        });
    }

    let tag = buf.get_u8();
    let kind = MessageKind::from_tag(tag).ok_or(WireError::UnknownKind { tag })?;

    match kind {
        MessageKind::JoinRequest => {
            if buf.remaining() != JOIN_REQUEST_LEN {
                return Err(WireError::Malformed {
                    kind,
                    reason: "join request payload has the wrong length",
                });
            }
            let from = get_peer_id(&mut buf);
            let heartbeat = buf.get_u64();
            Ok(Message::JoinRequest { from, heartbeat })
        }
        MessageKind::JoinReply | MessageKind::Heartbeat => {
            if buf.remaining() < 4 {
                return Err(WireError::Malformed {
                    kind,
                    reason: "snapshot payload shorter than its entry count",
                });
            }
            let count = buf.get_u32() as usize;
            if buf.remaining() != count * DIGEST_LEN {
                return Err(WireError::Malformed {
                    kind,
                    reason: "entry count does not match payload length",
                });
            }

            let mut members = Vec::with_capacity(count);
            for _ in 0..count {
                let id = get_peer_id(&mut buf);
                let heartbeat = buf.get_u64();
                let timestamp = buf.get_u64();
                members.push(PeerDigest {
                    id,
                    heartbeat,
                    timestamp,
                });
            }

            Ok(match kind {
                MessageKind::JoinReply => Message::JoinReply { members },
                _ => Message::Heartbeat { members },
            })
        }
        // from_tag never produces Untyped; keep the match exhaustive.
        MessageKind::Untyped => Err(WireError::UnknownKind { tag }),
    }
}

fn put_peer_id(buf: &mut BytesMut, id: PeerId) {
    buf.put_u32(id.host);
    buf.put_u16(id.port);
}

fn get_peer_id(buf: &mut impl Buf) -> PeerId {
    let host = buf.get_u32();
    let port = buf.get_u16();
    PeerId::new(host, port)
}
