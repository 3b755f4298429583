//! Interactive frame construction from line-oriented operator input.

use std::io::{self, BufRead, Write};

use canprims_frame::{Frame, FrameKind, InvalidFrame};
use canprims_transport::EFF_MASK;

use crate::config::{parse_flags, parse_number, MAX_FLAGS};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid identifier {input:?} (expected 0 to {max:#x})", max = EFF_MASK)]
    Identifier { input: String },

    #[error("invalid flags {value} (expected 0 to {max})", max = MAX_FLAGS)]
    Flags { value: u8 },

    #[error("payload too long ({len} bytes, max {max})")]
    PayloadTooLong { len: usize, max: usize },

    #[error("invalid frame: {0}")]
    Frame(#[from] InvalidFrame),

    #[error("input error: {0}")]
    Input(#[from] io::Error),

    #[error("end of input")]
    Eof,
}

impl BuildError {
    /// Whether the input source is finished and no further frame can be built.
    pub fn ends_session(&self) -> bool {
        match self {
            BuildError::Eof => true,
            BuildError::Input(err) => err.kind() != io::ErrorKind::InvalidData,
            _ => false,
        }
    }
}

/// Validate already-collected field values into a frame of `kind`.
pub fn frame_from_parts(
    kind: FrameKind,
    identifier: u32,
    flags: u8,
    payload: &[u8],
) -> Result<Frame, BuildError> {
    if flags > MAX_FLAGS {
        return Err(BuildError::Flags { value: flags });
    }
    if payload.len() > kind.capacity() {
        return Err(BuildError::PayloadTooLong {
            len: payload.len(),
            max: kind.capacity(),
        });
    }
    Ok(Frame::new(kind, identifier, flags, payload)?)
}

/// Prompts for identifier, flags and payload, one line each.
///
/// Every answer is read as a whole line, so the terminator after a numeric
/// answer never leaks into the payload.
pub struct FrameBuilder<I, P> {
    input: I,
    prompt: P,
    kind: FrameKind,
    line: String,
}

impl<I: BufRead, P: Write> FrameBuilder<I, P> {
    pub fn new(input: I, prompt: P, kind: FrameKind) -> Self {
        Self {
            input,
            prompt,
            kind,
            line: String::new(),
        }
    }

    /// Collect one frame from the operator.
    ///
    /// Flags are asked again until a value in `0..=15` is given. Classic
    /// frames skip the flags prompt.
    pub fn build(&mut self) -> Result<Frame, BuildError> {
        let identifier = self.read_identifier()?;
        let flags = match self.kind {
            FrameKind::Fd => self.read_flags()?,
            FrameKind::Classic => 0,
        };
        let payload = self.ask(&format!(
            "Please enter CAN data (up to {} bytes): ",
            self.kind.capacity()
        ))?;
        frame_from_parts(self.kind, identifier, flags, payload.as_bytes())
    }

    fn read_identifier(&mut self) -> Result<u32, BuildError> {
        let answer = self.ask(&format!("Please enter a CAN ID (0 to {EFF_MASK:#x}): "))?;
        parse_number(&answer)
            .filter(|id| *id <= u64::from(EFF_MASK))
            .map(|id| id as u32)
            .ok_or(BuildError::Identifier { input: answer })
    }

    fn read_flags(&mut self) -> Result<u8, BuildError> {
        loop {
            let answer = self.ask(&format!(
                "Please enter CAN flags (number from 0-{MAX_FLAGS}): "
            ))?;
            if let Some(flags) = parse_flags(&answer) {
                return Ok(flags);
            }
            writeln!(
                self.prompt,
                "flags must be a number from 0 to {MAX_FLAGS}, got {answer:?}"
            )?;
        }
    }

    /// Show `prompt` and read one line without its terminator.
    fn ask(&mut self, prompt: &str) -> Result<String, BuildError> {
        write!(self.prompt, "{prompt}")?;
        self.prompt.flush()?;

        self.line.clear();
        if self.input.read_line(&mut self.line)? == 0 {
            return Err(BuildError::Eof);
        }
        let text = self.line.strip_suffix('\n').unwrap_or(&self.line);
        let text = text.strip_suffix('\r').unwrap_or(text);
        Ok(text.to_string())
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }
}
