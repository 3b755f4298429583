use crate::codec::FrameKind;

/// Reasons a frame fails the structural checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFrame {
    /// Payload does not fit the frame kind.
    #[error("payload length {len} exceeds {kind} capacity of {max} bytes")]
    PayloadTooLong {
        kind: FrameKind,
        len: usize,
        max: usize,
    },

    /// Identifier does not fit in the id format.
    #[error("identifier {id:#x} out of range (max {max:#x})")]
    IdentifierOutOfRange { id: u32, max: u32 },

    /// Classic frames have no flags byte.
    #[error("classic frames carry no flags (got {0:#04x})")]
    ClassicFlags(u8),

    /// The endpoint cannot carry this kind of frame.
    #[error("{frame} frame cannot be sent on a {endpoint} endpoint")]
    KindMismatch {
        frame: FrameKind,
        endpoint: FrameKind,
    },

    /// More bytes than one frame were supplied to the decoder.
    #[error("expected {expected} bytes for one frame, got {actual}")]
    WireLength { expected: usize, actual: usize },
}

/// Errors that can occur while encoding, decoding or transferring frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The transport moved fewer bytes than a whole frame.
    #[error("truncated transfer ({actual} of {expected} bytes)")]
    Truncated { expected: usize, actual: usize },

    /// The underlying read or write failed.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// The frame violates the frame invariants.
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] InvalidFrame),
}

pub type Result<T> = std::result::Result<T, FrameError>;
