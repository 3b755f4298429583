use canprims_frame::FrameKind;

use crate::builder::frame_from_parts;
use crate::cmd::CansendArgs;
use crate::exit::{build_error, CliResult, SUCCESS};
use crate::output::cansend_line;

pub fn run(args: CansendArgs) -> CliResult<i32> {
    let kind = FrameKind::for_endpoint(!args.classic);
    let frame = frame_from_parts(kind, args.id, args.flags, args.text.as_bytes())
        .map_err(|err| build_error("build frame", err))?;

    println!("{}", cansend_line(&frame));
    Ok(SUCCESS)
}
