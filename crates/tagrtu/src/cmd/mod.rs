use clap::{Args, Subcommand};

use crate::config::FrameArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod build;
pub mod checksum;
pub mod inspect;
pub mod request;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wrap a hex body in a frame.
    Build(BuildArgs),
    /// Split a received frame into its sections and decode its registers.
    Inspect(InspectArgs),
    /// XOR checksum of hex bytes.
    Checksum(ChecksumArgs),
    /// Send a custom request to a device over TCP and print the response.
    Request(RequestArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Build(args) => build::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Checksum(args) => checksum::run(args, format),
        Command::Request(args) => request::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Body bytes as hex.
    pub body: String,
    #[command(flatten)]
    pub frame: FrameArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Received bytes as hex, possibly with garbage before the header.
    pub frame_hex: String,
    #[command(flatten)]
    pub frame: FrameArgs,
}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Bytes as hex.
    pub data: String,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Device address (host:port).
    pub addr: String,
    /// Request body as hex, sent verbatim between tag and checksum.
    pub body: String,
    /// Response deadline (e.g. 5s, 500ms). Overrides the config file.
    #[arg(long)]
    pub timeout: Option<String>,
    #[command(flatten)]
    pub frame: FrameArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
