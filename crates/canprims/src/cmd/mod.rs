use clap::{Args, Subcommand};

use crate::config::{parse_flags_arg, parse_u32, EndpointArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod cansend;
pub mod doctor;
pub mod read;
pub mod send;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive frames and print each one.
    Read(ReadArgs),
    /// Build frames interactively from stdin and send them.
    Write(WriteArgs),
    /// Send a single frame built from arguments.
    Send(SendArgs),
    /// Print the cansend(1) argument for a frame without touching the bus.
    Cansend(CansendArgs),
    /// Probe each endpoint setup step.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Cansend(args) => cansend::run(args),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Exit after sending N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// CAN identifier (decimal or 0x hex).
    #[arg(long, value_parser = parse_u32)]
    pub id: u32,
    /// FD flags, 0 to 15.
    #[arg(long, default_value = "0", value_parser = parse_flags_arg)]
    pub flags: u8,
    /// Payload text.
    #[arg(long, default_value = "")]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct CansendArgs {
    /// CAN identifier (decimal or 0x hex).
    #[arg(long, value_parser = parse_u32)]
    pub id: u32,
    /// FD flags, 0 to 15.
    #[arg(long, default_value = "0", value_parser = parse_flags_arg)]
    pub flags: u8,
    /// Build a classic frame (`<id>#<data>`) instead of CAN FD.
    #[arg(long)]
    pub classic: bool,
    /// Payload text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
