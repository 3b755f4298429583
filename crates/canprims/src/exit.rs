use std::fmt;
use std::io;

use canprims_frame::FrameError;
use canprims_transport::TransportError;

use crate::builder::BuildError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Endpoint setup failures, reported as `<step>: <cause>`.
pub fn transport_error(err: TransportError) -> CliError {
    if let TransportError::InvalidFilter { .. } = err {
        return CliError::new(DATA_INVALID, format!("{}: {err}", err.step()));
    }
    let denied = match &err {
        TransportError::Open(source)
        | TransportError::Io(source)
        | TransportError::Resolution { source, .. }
        | TransportError::Capability { source, .. }
        | TransportError::Bind { source, .. } => {
            source.kind() == io::ErrorKind::PermissionDenied
        }
        TransportError::InvalidFilter { .. } => false,
    };
    let code = if denied {
        PERMISSION_DENIED
    } else {
        TRANSPORT_ERROR
    };
    CliError::new(code, format!("{}: {err}", err.step()))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(source) => io_error(context, source),
        FrameError::InvalidFrame(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::Truncated { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn build_error(context: &str, err: BuildError) -> CliError {
    match err {
        BuildError::Input(source) => io_error(context, source),
        BuildError::Eof => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
