use canprims_frame::{FrameKind, FrameWriter};
use canprims_transport::CanSocket;
use tracing::debug;

use crate::builder::frame_from_parts;
use crate::cmd::SendArgs;
use crate::exit::{build_error, frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let kind = FrameKind::for_endpoint(!args.endpoint.classic);
    let frame = frame_from_parts(kind, args.id, args.flags, args.data.as_bytes())
        .map_err(|err| build_error("build frame", err))?;

    let socket = CanSocket::open(args.endpoint.to_config()).map_err(transport_error)?;
    let mut writer = FrameWriter::for_socket(socket);
    let bytes = writer
        .write_frame(&frame)
        .map_err(|err| frame_error("send frame", err))?;
    debug!(bytes, id = frame.identifier(), "frame sent");

    print_sent(&frame, bytes, format);
    Ok(SUCCESS)
}
