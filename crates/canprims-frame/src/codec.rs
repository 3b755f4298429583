use std::fmt;

use bytes::{BufMut, BytesMut};
use canprims_transport::{EFF_FLAG, EFF_MASK, SFF_MASK};

use crate::error::{FrameError, InvalidFrame, Result};

/// Bytes before the payload: can_id (4) + len (1) + flags (1) + reserved (2).
pub const HEADER_SIZE: usize = 8;

/// Payload capacity of a classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;

/// Payload capacity of a CAN FD frame.
pub const CANFD_MAX_DLEN: usize = 64;

/// Wire size of `struct can_frame`.
pub const CAN_MTU: usize = HEADER_SIZE + CAN_MAX_DLEN;

/// Wire size of `struct canfd_frame`.
pub const CANFD_MTU: usize = HEADER_SIZE + CANFD_MAX_DLEN;

/// Bit rate switch.
pub const CANFD_BRS: u8 = 0x01;
/// Error state indicator.
pub const CANFD_ESI: u8 = 0x02;
/// Marks a frame as FD even when the socket does not.
pub const CANFD_FDF: u8 = 0x04;

/// Classic CAN or CAN FD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Classic,
    Fd,
}

impl FrameKind {
    /// The frame kind an endpoint produces by default.
    pub fn for_endpoint(fd_frames: bool) -> Self {
        if fd_frames {
            Self::Fd
        } else {
            Self::Classic
        }
    }

    /// Maximum payload bytes.
    pub fn capacity(self) -> usize {
        match self {
            Self::Classic => CAN_MAX_DLEN,
            Self::Fd => CANFD_MAX_DLEN,
        }
    }

    /// Size of one frame on the wire.
    pub fn wire_size(self) -> usize {
        match self {
            Self::Classic => CAN_MTU,
            Self::Fd => CANFD_MTU,
        }
    }

    /// Map a complete transfer size back to a frame kind.
    pub fn from_wire_len(len: usize) -> Option<Self> {
        match len {
            CAN_MTU => Some(Self::Classic),
            CANFD_MTU => Some(Self::Fd),
            _ => None,
        }
    }

    /// Whether an endpoint of this kind can send `other` frames.
    ///
    /// FD endpoints accept both sizes; classic endpoints only classic.
    pub fn carries(self, other: FrameKind) -> bool {
        self == Self::Fd || other == Self::Classic
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => f.write_str("classic"),
            Self::Fd => f.write_str("CAN FD"),
        }
    }
}

/// One CAN or CAN FD frame.
///
/// Only constructible through validating constructors, so the payload
/// length never exceeds the kind's capacity and identifiers always fit
/// their id format.
#[derive(Clone)]
pub struct Frame {
    kind: FrameKind,
    identifier: u32,
    extended: bool,
    flags: u8,
    len: u8,
    data: [u8; CANFD_MAX_DLEN],
}

impl Frame {
    /// Create a frame. Identifiers above `0x7FF` use the extended format.
    pub fn new(
        kind: FrameKind,
        identifier: u32,
        flags: u8,
        payload: &[u8],
    ) -> std::result::Result<Self, InvalidFrame> {
        Self::build(kind, identifier, identifier > SFF_MASK, flags, payload)
    }

    /// Create a frame that always uses the 29-bit identifier format.
    pub fn with_extended_id(
        kind: FrameKind,
        identifier: u32,
        flags: u8,
        payload: &[u8],
    ) -> std::result::Result<Self, InvalidFrame> {
        Self::build(kind, identifier, true, flags, payload)
    }

    /// Shorthand for a CAN FD frame.
    pub fn fd(identifier: u32, flags: u8, payload: &[u8]) -> std::result::Result<Self, InvalidFrame> {
        Self::new(FrameKind::Fd, identifier, flags, payload)
    }

    /// Shorthand for a classic frame.
    pub fn classic(identifier: u32, payload: &[u8]) -> std::result::Result<Self, InvalidFrame> {
        Self::new(FrameKind::Classic, identifier, 0, payload)
    }

    fn build(
        kind: FrameKind,
        identifier: u32,
        extended: bool,
        flags: u8,
        payload: &[u8],
    ) -> std::result::Result<Self, InvalidFrame> {
        let max_id = if extended { EFF_MASK } else { SFF_MASK };
        if identifier > max_id {
            return Err(InvalidFrame::IdentifierOutOfRange {
                id: identifier,
                max: max_id,
            });
        }
        if payload.len() > kind.capacity() {
            return Err(InvalidFrame::PayloadTooLong {
                kind,
                len: payload.len(),
                max: kind.capacity(),
            });
        }
        if kind == FrameKind::Classic && flags != 0 {
            return Err(InvalidFrame::ClassicFlags(flags));
        }

        let mut data = [0u8; CANFD_MAX_DLEN];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            kind,
            identifier,
            extended,
            flags,
            len: payload.len() as u8,
            data,
        })
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Identifier without format flag bits.
    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Raw FD flag bits.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Number of meaningful payload bytes.
    pub fn payload_len(&self) -> usize {
        self.len as usize
    }

    /// The meaningful payload bytes; padding is never included.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// The kernel `can_id` word, including the extended flag.
    pub fn can_id(&self) -> u32 {
        if self.extended {
            self.identifier | EFF_FLAG
        } else {
            self.identifier
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.kind.wire_size()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.identifier == other.identifier
            && self.extended == other.extended
            && self.flags == other.flags
            && self.payload() == other.payload()
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.kind)
            .field("identifier", &format_args!("{:#x}", self.identifier))
            .field("extended", &self.extended)
            .field("flags", &format_args!("{:#04x}", self.flags))
            .field("payload", &self.payload())
            .finish()
    }
}

/// Encode a frame in the kernel layout.
///
/// Wire format (`struct canfd_frame`; `struct can_frame` is the same with
/// an 8-byte payload area):
/// ```text
/// ┌──────────────┬────────┬─────────┬──────────┬──────────────────────┐
/// │ can_id (4B)  │ len    │ flags   │ reserved │ payload              │
/// │ host order   │ (1B)   │ (1B)    │ (2B, 0)  │ (64B FD / 8B classic) │
/// └──────────────┴────────┴─────────┴──────────┴──────────────────────┘
/// ```
/// Payload bytes past `len` are written as zero.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    let capacity = frame.kind.capacity();
    dst.reserve(frame.wire_size());
    dst.put_u32_ne(frame.can_id());
    dst.put_u8(frame.len);
    dst.put_u8(frame.flags);
    dst.put_u8(0);
    dst.put_u8(0);
    dst.put_slice(&frame.data[..capacity]);
}

/// Decode exactly one frame of `kind` from `src`.
///
/// Fewer bytes than the wire size is a truncated transfer; no partial frame
/// is returned.
pub fn decode_frame(src: &[u8], kind: FrameKind) -> Result<Frame> {
    let expected = kind.wire_size();
    if src.len() < expected {
        return Err(FrameError::Truncated {
            expected,
            actual: src.len(),
        });
    }
    if src.len() > expected {
        return Err(InvalidFrame::WireLength {
            expected,
            actual: src.len(),
        }
        .into());
    }

    let can_id = u32::from_ne_bytes([src[0], src[1], src[2], src[3]]);
    let extended = can_id & EFF_FLAG != 0;
    let identifier = if extended {
        can_id & EFF_MASK
    } else {
        can_id & SFF_MASK
    };

    let len = src[4] as usize;
    if len > kind.capacity() {
        return Err(InvalidFrame::PayloadTooLong {
            kind,
            len,
            max: kind.capacity(),
        }
        .into());
    }
    let flags = match kind {
        FrameKind::Fd => src[5],
        FrameKind::Classic => 0,
    };
    let payload = &src[HEADER_SIZE..HEADER_SIZE + len];

    Ok(Frame::build(kind, identifier, extended, flags, payload)?)
}
