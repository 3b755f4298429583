/// Errors that can occur while opening or using a CAN endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The kernel refused to create a raw CAN socket.
    #[error("failed to open raw CAN socket: {0}")]
    Open(std::io::Error),

    /// The interface name does not map to an interface index.
    #[error("failed to resolve interface {interface}: {source}")]
    Resolution {
        interface: String,
        source: std::io::Error,
    },

    /// The socket rejected a mode or option (FD frames, filters).
    #[error("socket does not support {option}: {source}")]
    Capability {
        option: &'static str,
        source: std::io::Error,
    },

    /// The filter id carries bits the kernel reads as rule modifiers.
    #[error("filter id {id:#x} has bits outside the identifier and extended flag")]
    InvalidFilter { id: u32 },

    /// Failed to bind the socket to the resolved interface.
    #[error("failed to bind to {interface}: {source}")]
    Bind {
        interface: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on an open endpoint.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Short name of the setup step that failed, for diagnostics.
    pub fn step(&self) -> &'static str {
        match self {
            TransportError::Open(_) => "socket",
            TransportError::Resolution { .. } => "resolve",
            TransportError::Capability { .. } => "capability",
            TransportError::InvalidFilter { .. } => "filter",
            TransportError::Bind { .. } => "bind",
            TransportError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
