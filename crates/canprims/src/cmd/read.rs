use std::io;

use canprims_frame::FrameKind;
use canprims_transport::CanSocket;
use tracing::info;

use crate::cmd::ReadArgs;
use crate::dispatch::{self, Mode};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{ConsoleReporter, OutputFormat};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let socket = CanSocket::open(args.endpoint.to_config()).map_err(transport_error)?;
    let kind = FrameKind::for_endpoint(socket.fd_frames());
    info!(interface = socket.interface(), filter = ?socket.filter(), "reading frames");

    let mut reporter = ConsoleReporter::new(format);
    let summary = dispatch::run(
        Mode::Read,
        socket,
        kind,
        io::empty(),
        io::sink(),
        &mut reporter,
        args.count,
    );

    info!(frames = summary.frames, errors = summary.errors, "read finished");
    Ok(SUCCESS)
}
