//! Fixed-layout CAN and CAN FD frames over a raw SocketCAN endpoint.
//!
//! Frames use the kernel's `struct can_frame` / `struct canfd_frame`
//! layout bit-for-bit:
//! - a 4-byte `can_id` word (host byte order, extended flag in bit 31)
//! - a 1-byte payload length and a 1-byte FD flags field
//! - 2 reserved bytes, then an 8-byte (classic) or 64-byte (FD) payload area
//!
//! One frame per read, one frame per write. Short transfers are reported,
//! never retried or stitched together.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameKind, CANFD_BRS, CANFD_ESI, CANFD_FDF, CANFD_MAX_DLEN,
    CANFD_MTU, CAN_MAX_DLEN, CAN_MTU, HEADER_SIZE,
};
pub use error::{FrameError, InvalidFrame, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
