//! The read/write loop run against an open endpoint.

use std::io::{BufRead, Read, Write};

use canprims_frame::{Frame, FrameError, FrameKind, FrameReader, FrameWriter};
use tracing::debug;

use crate::builder::{BuildError, FrameBuilder};

/// Which operation the loop repeats. Fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// Receives every outcome of the loop.
pub trait Reporter {
    /// A frame was received.
    fn frame(&mut self, frame: &Frame);
    /// A frame was sent; `bytes` is what the transport accepted.
    fn sent(&mut self, frame: &Frame, bytes: usize);
    /// One attempt failed; the loop carries on.
    fn error(&mut self, context: &str, err: &dyn std::error::Error);
}

/// Counters returned when a loop stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub frames: usize,
    pub errors: usize,
}

/// Run `mode` on `endpoint` until `count` frames were handled or, in write
/// mode, the operator input ends. Without a count, read mode never returns.
pub fn run<S, I, P, R>(
    mode: Mode,
    endpoint: S,
    kind: FrameKind,
    input: I,
    prompt: P,
    reporter: &mut R,
    count: Option<usize>,
) -> Summary
where
    S: Read + Write,
    I: BufRead,
    P: Write,
    R: Reporter,
{
    debug!(?mode, %kind, ?count, "starting dispatch loop");
    match mode {
        Mode::Read => read_loop(&mut FrameReader::with_kind(endpoint, kind), reporter, count),
        Mode::Write => write_loop(
            &mut FrameWriter::with_kind(endpoint, kind),
            &mut FrameBuilder::new(input, prompt, kind),
            reporter,
            count,
        ),
    }
}

/// Receive frames and hand each one, or each error, to the reporter.
pub fn read_loop<T: Read, R: Reporter>(
    reader: &mut FrameReader<T>,
    reporter: &mut R,
    count: Option<usize>,
) -> Summary {
    let mut summary = Summary::default();
    while !reached(count, summary.frames) {
        match reader.read_frame() {
            Ok(frame) => {
                reporter.frame(&frame);
                summary.frames += 1;
            }
            Err(err) => {
                reporter.error(read_context(&err), &err);
                summary.errors += 1;
            }
        }
    }
    summary
}

/// Build frames from operator input and send each one.
pub fn write_loop<T, I, P, R>(
    writer: &mut FrameWriter<T>,
    builder: &mut FrameBuilder<I, P>,
    reporter: &mut R,
    count: Option<usize>,
) -> Summary
where
    T: Write,
    I: BufRead,
    P: Write,
    R: Reporter,
{
    let mut summary = Summary::default();
    while !reached(count, summary.frames) {
        let frame = match builder.build() {
            Ok(frame) => frame,
            Err(err) if err.ends_session() => {
                if !matches!(err, BuildError::Eof) {
                    reporter.error("input failed", &err);
                    summary.errors += 1;
                }
                debug!(kind = %builder.kind(), "operator input finished");
                break;
            }
            Err(err) => {
                reporter.error("invalid frame", &err);
                summary.errors += 1;
                continue;
            }
        };

        match writer.write_frame(&frame) {
            Ok(bytes) => {
                reporter.sent(&frame, bytes);
                summary.frames += 1;
            }
            Err(err) => {
                reporter.error("send failed", &err);
                summary.errors += 1;
            }
        }
    }
    summary
}

fn reached(count: Option<usize>, frames: usize) -> bool {
    count.is_some_and(|limit| frames >= limit)
}

fn read_context(err: &FrameError) -> &'static str {
    match err {
        FrameError::Truncated { .. } => "incomplete frame",
        FrameError::Transport(_) => "receive failed",
        FrameError::InvalidFrame(_) => "invalid frame",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Cursor, ErrorKind};

    use bytes::BytesMut;
    use canprims_frame::{decode_frame, encode_frame, CANFD_MTU};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Frame>,
        sent: Vec<(Frame, usize)>,
        errors: Vec<String>,
    }

    impl Reporter for Recorder {
        fn frame(&mut self, frame: &Frame) {
            self.frames.push(frame.clone());
        }

        fn sent(&mut self, frame: &Frame, bytes: usize) {
            self.sent.push((frame.clone(), bytes));
        }

        fn error(&mut self, context: &str, err: &dyn std::error::Error) {
            self.errors.push(format!("{context}: {err}"));
        }
    }

    /// One scripted result per read; writes are captured.
    struct ScriptedBus {
        reads: VecDeque<io::Result<Vec<u8>>>,
        writes: Vec<Vec<u8>>,
        fail_writes: bool,
    }

    impl ScriptedBus {
        fn with_reads(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                writes: Vec::new(),
                fail_writes: false,
            }
        }
    }

    impl Read for ScriptedBus {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(err)) => Err(err),
                None => Err(io::Error::from(ErrorKind::WouldBlock)),
            }
        }
    }

    impl Write for ScriptedBus {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::from(ErrorKind::NetworkDown));
            }
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn wire(frame: &Frame) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(frame, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn read_mode_reports_errors_and_continues() {
        let first = Frame::fd(5, 0, b"one").unwrap();
        let second = Frame::fd(0x805, 0, b"two").unwrap();
        let mut bus = ScriptedBus::with_reads(vec![
            Err(io::Error::from(ErrorKind::ConnectionReset)),
            Ok(wire(&first)),
            Ok(vec![0u8; 20]),
            Ok(wire(&second)),
        ]);
        let mut recorder = Recorder::default();

        let summary = run(
            Mode::Read,
            &mut bus,
            FrameKind::Fd,
            io::empty(),
            io::sink(),
            &mut recorder,
            Some(2),
        );

        assert_eq!(summary, Summary { frames: 2, errors: 2 });
        assert_eq!(recorder.frames, vec![first, second]);
        assert!(recorder.errors[0].starts_with("receive failed"));
        assert!(recorder.errors[1].starts_with("incomplete frame"));
    }

    #[test]
    fn write_mode_sends_operator_frame() {
        let mut bus = ScriptedBus::with_reads(Vec::new());
        let mut recorder = Recorder::default();
        let mut prompt = Vec::new();

        let summary = run(
            Mode::Write,
            &mut bus,
            FrameKind::Fd,
            Cursor::new(b"100\n3\nhello\n".to_vec()),
            &mut prompt,
            &mut recorder,
            None,
        );

        assert_eq!(summary, Summary { frames: 1, errors: 0 });
        let (frame, bytes) = &recorder.sent[0];
        assert_eq!(*bytes, CANFD_MTU);
        assert_eq!(frame.identifier(), 100);
        assert_eq!(frame.flags(), 3);
        assert_eq!(frame.payload(), b"hello");

        assert_eq!(bus.writes.len(), 1);
        let on_wire = decode_frame(&bus.writes[0], FrameKind::Fd).unwrap();
        assert_eq!(&on_wire, frame);
    }

    #[test]
    fn write_mode_continues_after_validation_error() {
        let mut bus = ScriptedBus::with_reads(Vec::new());
        let mut recorder = Recorder::default();
        let too_long = "x".repeat(65);
        let input = format!("nope\n1\n0\n{too_long}\n2\n0\nok\n");

        let summary = run(
            Mode::Write,
            &mut bus,
            FrameKind::Fd,
            Cursor::new(input.into_bytes()),
            io::sink(),
            &mut recorder,
            None,
        );

        assert_eq!(summary, Summary { frames: 1, errors: 2 });
        assert_eq!(recorder.sent[0].0.identifier(), 2);
        assert!(recorder.errors.iter().all(|e| e.starts_with("invalid frame")));
    }

    #[test]
    fn write_mode_reports_transport_failure() {
        let mut bus = ScriptedBus::with_reads(Vec::new());
        bus.fail_writes = true;
        let mut recorder = Recorder::default();

        let summary = run(
            Mode::Write,
            &mut bus,
            FrameKind::Fd,
            Cursor::new(b"1\n0\na\n2\n0\nb\n".to_vec()),
            io::sink(),
            &mut recorder,
            None,
        );

        assert_eq!(summary, Summary { frames: 0, errors: 2 });
        assert!(recorder.errors.iter().all(|e| e.starts_with("send failed")));
    }

    #[test]
    fn write_mode_honours_count() {
        let mut bus = ScriptedBus::with_reads(Vec::new());
        let mut recorder = Recorder::default();

        let summary = run(
            Mode::Write,
            &mut bus,
            FrameKind::Fd,
            Cursor::new(b"1\n0\na\n2\n0\nb\n".to_vec()),
            io::sink(),
            &mut recorder,
            Some(1),
        );

        assert_eq!(summary.frames, 1);
        assert_eq!(bus.writes.len(), 1);
    }

    #[test]
    fn classic_endpoint_round_trip() {
        let frame = Frame::classic(0x10, b"abc").unwrap();
        let mut bus = ScriptedBus::with_reads(vec![Ok(wire(&frame))]);
        let mut recorder = Recorder::default();

        run(
            Mode::Read,
            &mut bus,
            FrameKind::Classic,
            io::empty(),
            io::sink(),
            &mut recorder,
            Some(1),
        );
        assert_eq!(recorder.frames, vec![frame]);
    }

    #[test]
    fn zero_count_does_nothing() {
        let mut bus = ScriptedBus::with_reads(Vec::new());
        let mut recorder = Recorder::default();
        let summary = run(
            Mode::Read,
            &mut bus,
            FrameKind::Fd,
            io::empty(),
            io::sink(),
            &mut recorder,
            Some(0),
        );
        assert_eq!(summary, Summary::default());
    }
}
