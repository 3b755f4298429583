use std::io;

use canprims_frame::FrameKind;
use canprims_transport::CanSocket;
use tracing::info;

use crate::cmd::WriteArgs;
use crate::dispatch::{self, Mode};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{ConsoleReporter, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let socket = CanSocket::open(args.endpoint.to_config()).map_err(transport_error)?;
    let kind = FrameKind::for_endpoint(socket.fd_frames());
    info!(interface = socket.interface(), %kind, "writing frames from stdin");

    // Prompts on stderr; stdout carries only sent-frame reports.
    let mut reporter = ConsoleReporter::new(format);
    let summary = dispatch::run(
        Mode::Write,
        socket,
        kind,
        io::stdin().lock(),
        io::stderr(),
        &mut reporter,
        args.count,
    );

    info!(frames = summary.frames, errors = summary.errors, "write finished");
    Ok(SUCCESS)
}
