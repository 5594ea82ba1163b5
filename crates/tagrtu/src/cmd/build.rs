use serde::Serialize;
use tagrtu_frame::{build_frame, xor};

use crate::cmd::BuildArgs;
use crate::config::parse_hex;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{hex_or_dash, print_report, OutputFormat, Report};

#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub body: String,
    pub checksum: String,
    pub frame: String,
    pub len: usize,
}

impl Report for BuildReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("body", self.body.clone()),
            ("checksum", self.checksum.clone()),
            ("frame", self.frame.clone()),
            ("len", self.len.to_string()),
        ]
    }
}

pub fn run(args: BuildArgs, format: OutputFormat) -> CliResult<i32> {
    let body = parse_hex(&args.body)?;
    let config = args.frame.resolve()?.frame;
    let frame = build_frame(&config, &body);

    print_report(
        &BuildReport {
            body: hex_or_dash(&body),
            checksum: format!("{:02X}", xor(&body)),
            frame: hex::encode_upper(&frame),
            len: frame.len(),
        },
        format,
    );
    Ok(SUCCESS)
}
