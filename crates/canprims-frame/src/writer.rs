use std::io::{ErrorKind, Write};

use bytes::BytesMut;
#[cfg(target_os = "linux")]
use canprims_transport::CanSocket;
use tracing::trace;

use crate::codec::{encode_frame, Frame, FrameKind, CANFD_MTU};
use crate::error::{FrameError, InvalidFrame, Result};

/// Writes one frame per call to a datagram-style `Write` sink.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    kind: FrameKind,
}

impl<T: Write> FrameWriter<T> {
    /// Create a writer for an FD endpoint.
    pub fn new(inner: T) -> Self {
        Self::with_kind(inner, FrameKind::Fd)
    }

    /// Create a writer for an endpoint of `kind`.
    pub fn with_kind(inner: T, kind: FrameKind) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(CANFD_MTU),
            kind,
        }
    }

    /// Encode and send one frame (blocking).
    ///
    /// Returns the number of bytes written, which is always the frame's
    /// wire size. A frame the endpoint cannot carry is rejected before
    /// anything is sent; a short write is reported as truncated.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        if !self.kind.carries(frame.kind()) {
            return Err(InvalidFrame::KindMismatch {
                frame: frame.kind(),
                endpoint: self.kind,
            }
            .into());
        }

        self.buf.clear();
        encode_frame(frame, &mut self.buf);

        let written = loop {
            match self.inner.write(&self.buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Transport(err)),
            }
        };
        if written < self.buf.len() {
            return Err(FrameError::Truncated {
                expected: self.buf.len(),
                actual: written,
            });
        }

        self.flush()?;
        trace!(
            id = format_args!("{:#x}", frame.identifier()),
            bytes = written,
            "frame sent"
        );
        Ok(written)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Transport(err)),
            }
        }
    }

    /// Frame kind of the endpoint this writer sends to.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(target_os = "linux")]
impl FrameWriter<CanSocket> {
    /// Create a writer whose frame kind follows the socket's FD setting.
    pub fn for_socket(socket: CanSocket) -> Self {
        let kind = FrameKind::for_endpoint(socket.fd_frames());
        Self::with_kind(socket, kind)
    }
}
