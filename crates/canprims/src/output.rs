use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use canprims_frame::{Frame, FrameKind};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::dispatch::Reporter;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
    Cansend,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    event: &'a str,
    kind: &'a str,
    id: u32,
    extended: bool,
    flags: u8,
    len: usize,
    data: String,
    data_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
}

impl<'a> FrameOutput<'a> {
    fn new(event: &'a str, frame: &Frame, bytes: Option<usize>) -> Self {
        Self {
            event,
            kind: kind_name(frame.kind()),
            id: frame.identifier(),
            extended: frame.is_extended(),
            flags: frame.flags(),
            len: frame.payload_len(),
            data: payload_text(frame.payload()),
            data_hex: hex(frame.payload()),
            bytes,
        }
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FrameOutput::new("received", frame, None)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "KIND", "FLAGS", "LEN", "DATA"])
                .add_row(vec![
                    format_id(frame),
                    kind_name(frame.kind()).to_string(),
                    format!("{:#04x}", frame.flags()),
                    frame.payload_len().to_string(),
                    payload_text(frame.payload()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("CAN ID: {}", frame.identifier());
            println!("data length: {}", frame.payload_len());
            println!("Received frame data: {}", payload_text(frame.payload()));
        }
        OutputFormat::Raw => print_raw(frame.payload()),
        OutputFormat::Cansend => println!("{}", cansend_line(frame)),
    }
}

pub fn print_sent(frame: &Frame, bytes: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FrameOutput::new("sent", frame, Some(bytes))),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "sent id={} len={} ({bytes} bytes on the wire)",
                format_id(frame),
                frame.payload_len()
            );
        }
        OutputFormat::Raw => {}
        OutputFormat::Cansend => println!("{}", cansend_line(frame)),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Payload as text: UTF-8 when valid, escaped bytes otherwise.
///
/// Only the bytes given are rendered; callers pass `Frame::payload()`.
pub fn payload_text(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => payload.escape_ascii().to_string(),
    }
}

/// Render a frame as the argument `cansend(1)` takes.
///
/// Classic frames are `<id>#<data>`; FD frames are `<id>##<flags><data>`
/// with the flags as a single hex digit. Ids are 3 hex digits, or 8 for
/// extended ids.
pub fn cansend_line(frame: &Frame) -> String {
    let mut line = format_id_hex(frame);
    match frame.kind() {
        FrameKind::Classic => line.push('#'),
        FrameKind::Fd => {
            let _ = write!(line, "##{:X}", frame.flags() & 0x0F);
        }
    }
    line.push_str(&hex(frame.payload()));
    line
}

fn format_id(frame: &Frame) -> String {
    format!("0x{}", format_id_hex(frame))
}

fn format_id_hex(frame: &Frame) -> String {
    if frame.is_extended() {
        format!("{:08X}", frame.identifier())
    } else {
        format!("{:03X}", frame.identifier())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn kind_name(kind: FrameKind) -> &'static str {
    match kind {
        FrameKind::Classic => "classic",
        FrameKind::Fd => "fd",
    }
}

/// Prints dispatch loop events to stdout and diagnostics to stderr.
pub struct ConsoleReporter {
    format: OutputFormat,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Reporter for ConsoleReporter {
    fn frame(&mut self, frame: &Frame) {
        print_frame(frame, self.format);
    }

    fn sent(&mut self, frame: &Frame, bytes: usize) {
        print_sent(frame, bytes, self.format);
    }

    fn error(&mut self, context: &str, err: &dyn std::error::Error) {
        tracing::debug!(context, error = %err, "dispatch attempt failed");
        eprintln!("error: {context}: {err}");
    }
}
