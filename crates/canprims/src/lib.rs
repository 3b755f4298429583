//! Minimal SocketCAN / CAN FD endpoint.
//!
//! canprims binds a raw CAN socket to one interface, optionally filters
//! identifiers, and reads or writes fixed-layout CAN and CAN FD frames.
//!
//! # Crate Structure
//!
//! - [`transport`]: Raw socket endpoint, configuration and acceptance filters
//! - [`frame`]: Frame codec plus one-frame-per-call reader and writer
//!
//! The `canprims` binary (behind the default `cli` feature) adds the
//! interactive frame builder and the read/write dispatch loop.

/// Re-export transport types.
pub mod transport {
    pub use canprims_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use canprims_frame::*;
}
