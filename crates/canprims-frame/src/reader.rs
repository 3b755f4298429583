use std::io::{ErrorKind, Read};

#[cfg(target_os = "linux")]
use canprims_transport::CanSocket;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameKind, CANFD_MTU};
use crate::error::{FrameError, Result};

/// Reads one frame per call from a datagram-style `Read` source.
///
/// Each [`read_frame`](Self::read_frame) issues a single `read`; a short
/// count is reported as [`FrameError::Truncated`], never stitched together
/// with the next read.
pub struct FrameReader<T> {
    inner: T,
    buf: [u8; CANFD_MTU],
    kind: FrameKind,
}

impl<T: Read> FrameReader<T> {
    /// Create a reader for an FD endpoint.
    pub fn new(inner: T) -> Self {
        Self::with_kind(inner, FrameKind::Fd)
    }

    /// Create a reader expecting frames of `kind`.
    pub fn with_kind(inner: T, kind: FrameKind) -> Self {
        Self {
            inner,
            buf: [0u8; CANFD_MTU],
            kind,
        }
    }

    /// Read the next frame (blocking).
    ///
    /// On an FD endpoint a complete classic frame (`CAN_MTU` bytes) is
    /// decoded as [`FrameKind::Classic`]; any other short count is truncated.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let expected = self.kind.wire_size();
        let read = loop {
            match self.inner.read(&mut self.buf[..expected]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Transport(err)),
            }
        };

        let kind = match FrameKind::from_wire_len(read) {
            Some(FrameKind::Classic) if self.kind == FrameKind::Fd => FrameKind::Classic,
            _ => self.kind,
        };
        let frame = decode_frame(&self.buf[..read], kind)?;
        trace!(
            id = format_args!("{:#x}", frame.identifier()),
            len = frame.payload_len(),
            "frame received"
        );
        Ok(frame)
    }

    /// Frame kind this reader expects.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(target_os = "linux")]
impl FrameReader<CanSocket> {
    /// Create a reader whose frame kind follows the socket's FD setting.
    pub fn for_socket(socket: CanSocket) -> Self {
        let kind = FrameKind::for_endpoint(socket.fd_frames());
        Self::with_kind(socket, kind)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Cursor};

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_frame, CAN_MTU};
    use crate::error::InvalidFrame;

    fn wire(frame: &Frame) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(frame, &mut buf);
        buf.to_vec()
    }

    /// Hands out one scripted datagram per `read` call.
    struct Datagrams {
        queue: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Datagrams {
        fn new(items: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                queue: items.into(),
            }
        }
    }

    impl Read for Datagrams {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.queue.pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(Err(err)) => Err(err),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn read_single_frame() {
        let frame = Frame::fd(5, 0, b"hello").unwrap();
        let mut reader = FrameReader::new(Cursor::new(wire(&frame)));

        let got = reader.read_frame().unwrap();
        assert_eq!(got, frame);
        assert_eq!(got.payload(), b"hello");
    }

    #[test]
    fn read_frames_in_sequence() {
        let frames = [
            Frame::fd(1, 0, b"one").unwrap(),
            Frame::fd(0x805, 1, b"two").unwrap(),
            Frame::fd(3, 0, b"").unwrap(),
        ];
        let source = Datagrams::new(frames.iter().map(|f| Ok(wire(f))).collect());
        let mut reader = FrameReader::new(source);

        for expected in &frames {
            assert_eq!(&reader.read_frame().unwrap(), expected);
        }
    }

    #[test]
    fn short_read_is_truncated() {
        let bytes = wire(&Frame::fd(1, 0, b"abc").unwrap());
        let source = Datagrams::new(vec![Ok(bytes[..40].to_vec())]);
        let mut reader = FrameReader::new(source);

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: CANFD_MTU,
                actual: 40
            }
        ));
    }

    #[test]
    fn empty_read_is_truncated() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { actual: 0, .. }));
    }

    #[test]
    fn transport_failure_is_distinct_from_truncation() {
        let source = Datagrams::new(vec![Err(io::Error::from(ErrorKind::ConnectionReset))]);
        let mut reader = FrameReader::new(source);

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Transport(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn reader_recovers_after_errors() {
        let good = Frame::fd(9, 0, b"ok").unwrap();
        let source = Datagrams::new(vec![
            Err(io::Error::from(ErrorKind::WouldBlock)),
            Ok(vec![0u8; 3]),
            Ok(wire(&good)),
        ]);
        let mut reader = FrameReader::new(source);

        assert!(matches!(reader.read_frame(), Err(FrameError::Transport(_))));
        assert!(matches!(reader.read_frame(), Err(FrameError::Truncated { .. })));
        assert_eq!(reader.read_frame().unwrap(), good);
    }

    #[test]
    fn interrupted_read_retries() {
        let frame = Frame::fd(8, 0, b"ok").unwrap();
        let source = Datagrams::new(vec![
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(wire(&frame)),
        ]);
        let mut reader = FrameReader::new(source);

        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn classic_frame_on_fd_endpoint() {
        let frame = Frame::classic(0x42, b"8bytes!!").unwrap();
        let bytes = wire(&frame);
        assert_eq!(bytes.len(), CAN_MTU);

        let mut reader = FrameReader::new(Datagrams::new(vec![Ok(bytes)]));
        let got = reader.read_frame().unwrap();
        assert_eq!(got.kind(), FrameKind::Classic);
        assert_eq!(got, frame);
    }

    #[test]
    fn classic_reader_only_reads_classic_size() {
        let frame = Frame::classic(0x42, b"abc").unwrap();
        let mut reader =
            FrameReader::with_kind(Datagrams::new(vec![Ok(wire(&frame))]), FrameKind::Classic);
        assert_eq!(reader.kind(), FrameKind::Classic);
        assert_eq!(reader.read_frame().unwrap(), frame);
    }

    #[test]
    fn corrupt_length_field_is_invalid() {
        let mut bytes = wire(&Frame::fd(1, 0, b"").unwrap());
        bytes[4] = 65;
        let mut reader = FrameReader::new(Datagrams::new(vec![Ok(bytes)]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidFrame(InvalidFrame::PayloadTooLong { .. })
        ));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[cfg(target_os = "linux")]
    mod vcan {
        use std::time::Duration;

        use canprims_transport::{EndpointConfig, FilterRule};

        use super::*;
        use crate::writer::FrameWriter;

        fn open(config: EndpointConfig) -> CanSocket {
            CanSocket::open(config).expect("vcan0 should be up")
        }

        fn drain_ids(reader: &mut FrameReader<CanSocket>) -> Vec<u32> {
            let mut ids = Vec::new();
            while let Ok(frame) = reader.read_frame() {
                ids.push(frame.identifier());
            }
            ids
        }

        #[test]
        #[ignore = "needs a vcan0 interface"]
        fn filter_applies_on_live_bus() {
            let reader_config = EndpointConfig::new("vcan0").with_filter(Some(FilterRule::standard(5)));
            let rx = open(reader_config);
            let tx = open(EndpointConfig::new("vcan0"));
            rx.set_read_timeout(Some(Duration::from_millis(200))).unwrap();

            let mut reader = FrameReader::for_socket(rx);
            let mut writer = FrameWriter::for_socket(tx);
            for id in [5u32, 6, 0x805] {
                writer.write_frame(&Frame::fd(id, 0, b"scenario").unwrap()).unwrap();
            }

            let ids = drain_ids(&mut reader);
            assert!(ids.contains(&5));
            assert!(ids.contains(&0x805));
            assert!(!ids.contains(&6));
        }

        #[test]
        #[ignore = "needs a vcan0 interface"]
        fn unfiltered_reader_sees_everything() {
            let rx = open(EndpointConfig::new("vcan0"));
            let tx = open(EndpointConfig::new("vcan0"));
            rx.set_read_timeout(Some(Duration::from_millis(200))).unwrap();

            let mut reader = FrameReader::for_socket(rx);
            let mut writer = FrameWriter::for_socket(tx);
            for id in [0x101u32, 0x102] {
                writer.write_frame(&Frame::fd(id, 0, b"all").unwrap()).unwrap();
            }

            let ids = drain_ids(&mut reader);
            assert!(ids.contains(&0x101));
            assert!(ids.contains(&0x102));
        }
    }
}
