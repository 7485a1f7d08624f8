//! Fixed, versioned, little-endian frames for the PE-to-PE protocol.
//!
//! A frame is an 8-byte [`WireHdr`] followed by the `bincode` encoding of a
//! [`PeMessage`]. The header lets a receiver reject frames from an
//! incompatible build, or of an unexpected size, before decoding the body.

use crate::mesh_error::MeshReorderError;
use bytemuck::{Pod, Zeroable};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::collections::BTreeMap;
use std::mem::size_of;

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// All multi-byte integers in the header are **little-endian** on the wire.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,
    pub kind_le: u16,
    pub body_len_le: u32,
}

const_assert_eq!(size_of::<WireHdr>(), 8);

impl WireHdr {
    pub fn new(kind: u16, body_len: u32) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            body_len_le: body_len.to_le(),
        }
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn body_len(&self) -> usize {
        u32::from_le(self.body_len_le) as usize
    }
}

/// Chare id → node ids (4 per element).
pub type ChareNodes = BTreeMap<usize, Vec<u64>>;

/// Messages exchanged between PEs. `pe`/`from` is always the sender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PeMessage {
    /// Number of elements the sender read.
    Load { pe: usize, nelem: u64 },
    /// Node lists of chares owned by the receiver.
    Add { from: usize, chares: ChareNodes },
    /// Receipt of an `Add`.
    Ack { from: usize },
    /// The sender's exports are all acknowledged.
    Distributed { pe: usize },
    /// Which of these nodes do you hold?
    Query { pe: usize, nodes: Vec<u64> },
    /// Queried nodes the sender holds, with its chares referencing each.
    Mask {
        pe: usize,
        nodes: BTreeMap<u64, Vec<usize>>,
    },
    /// Number of node ids the sender assigns itself.
    Offset { pe: usize, count: u64 },
    /// New ids requested from their assigning PE.
    Request { pe: usize, nodes: Vec<u64> },
    /// Answer to a `Request`: old id → new id.
    NewOrder { pe: usize, ids: BTreeMap<u64, u64> },
    /// Lower row bound of the receiver (the sender's upper bound).
    Lower { pe: usize, lower: u64 },
    /// Communication cost of the sender.
    Cost { pe: usize, cost: f64 },
    /// Squared deviation of the sender's cost from the mean.
    CostVariance { pe: usize, var: f64 },
    /// The sender hit a fatal error.
    Abort { pe: usize, reason: String },
}

impl PeMessage {
    /// Wire discriminant stored in the frame header.
    pub fn kind(&self) -> u16 {
        match self {
            PeMessage::Load { .. } => 1,
            PeMessage::Add { .. } => 2,
            PeMessage::Ack { .. } => 3,
            PeMessage::Distributed { .. } => 4,
            PeMessage::Query { .. } => 5,
            PeMessage::Mask { .. } => 6,
            PeMessage::Offset { .. } => 7,
            PeMessage::Request { .. } => 8,
            PeMessage::NewOrder { .. } => 9,
            PeMessage::Lower { .. } => 10,
            PeMessage::Cost { .. } => 11,
            PeMessage::CostVariance { .. } => 12,
            PeMessage::Abort { .. } => 13,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PeMessage::Load { .. } => "load",
            PeMessage::Add { .. } => "add",
            PeMessage::Ack { .. } => "ack",
            PeMessage::Distributed { .. } => "distributed",
            PeMessage::Query { .. } => "query",
            PeMessage::Mask { .. } => "mask",
            PeMessage::Offset { .. } => "offset",
            PeMessage::Request { .. } => "request",
            PeMessage::NewOrder { .. } => "neworder",
            PeMessage::Lower { .. } => "lower",
            PeMessage::Cost { .. } => "cost",
            PeMessage::CostVariance { .. } => "costvariance",
            PeMessage::Abort { .. } => "abort",
        }
    }

    /// The PE that sent this message.
    pub fn sender(&self) -> usize {
        match *self {
            PeMessage::Load { pe, .. }
            | PeMessage::Distributed { pe }
            | PeMessage::Query { pe, .. }
            | PeMessage::Mask { pe, .. }
            | PeMessage::Offset { pe, .. }
            | PeMessage::Request { pe, .. }
            | PeMessage::NewOrder { pe, .. }
            | PeMessage::Lower { pe, .. }
            | PeMessage::Cost { pe, .. }
            | PeMessage::CostVariance { pe, .. }
            | PeMessage::Abort { pe, .. } => pe,
            PeMessage::Add { from, .. } | PeMessage::Ack { from } => from,
        }
    }
}

/// Encode a message into a frame.
pub fn encode(msg: &PeMessage) -> Result<Bytes, MeshReorderError> {
    let body = bincode::serialize(msg)?;
    let body_len = u32::try_from(body.len())
        .map_err(|_| MeshReorderError::Wire(format!("body of {} bytes too large", body.len())))?;
    let hdr = WireHdr::new(msg.kind(), body_len);
    let mut buf = BytesMut::with_capacity(size_of::<WireHdr>() + body.len());
    buf.put_slice(bytemuck::bytes_of(&hdr));
    buf.put_slice(&body);
    Ok(buf.freeze())
}

/// Decode a frame, rejecting bad versions, truncation and frames above `limit` bytes.
pub fn decode(frame: &[u8], limit: Option<usize>) -> Result<PeMessage, MeshReorderError> {
    if let Some(limit) = limit {
        if frame.len() > limit {
            return Err(MeshReorderError::Wire(format!(
                "frame of {} bytes exceeds limit of {limit}",
                frame.len()
            )));
        }
    }
    let hsize = size_of::<WireHdr>();
    if frame.len() < hsize {
        return Err(MeshReorderError::Wire(format!(
            "frame of {} bytes is shorter than its header",
            frame.len()
        )));
    }
    let hdr: WireHdr = bytemuck::pod_read_unaligned(&frame[..hsize]);
    if hdr.version() != WIRE_VERSION {
        return Err(MeshReorderError::Wire(format!(
            "wire version {} (expected {WIRE_VERSION})",
            hdr.version()
        )));
    }
    let body = &frame[hsize..];
    if body.len() != hdr.body_len() {
        return Err(MeshReorderError::Wire(format!(
            "expected {} body bytes, got {}",
            hdr.body_len(),
            body.len()
        )));
    }
    let msg: PeMessage = bincode::deserialize(body)?;
    if msg.kind() != hdr.kind() {
        return Err(MeshReorderError::Wire(format!(
            "header kind {} does not match `{}` body",
            hdr.kind(),
            msg.name()
        )));
    }
    Ok(msg)
}
