//! Raw SocketCAN endpoint.
//!
//! Opens a `PF_CAN` raw socket, enables CAN FD frames, installs an optional
//! acceptance filter and binds to a named interface. This is the lowest
//! layer of canprims; the frame codec and reader/writer build on the
//! [`CanSocket`] type provided here.
//!
//! Linux only. Interfaces (including `vcan`) must already exist.

pub mod config;
pub mod error;

#[cfg(target_os = "linux")]
pub mod socket;

pub use config::{
    accepts, EndpointConfig, FilterRule, DEFAULT_FILTER_ID, DEFAULT_INTERFACE, EFF_FLAG, EFF_MASK,
    FILTER_ID_BITS, SFF_MASK,
};
pub use error::{Result, TransportError};

#[cfg(target_os = "linux")]
pub use socket::{resolve_interface, CanSocket};
