use serde::Serialize;
use tagrtu_frame::xor;

use crate::cmd::ChecksumArgs;
use crate::config::parse_hex;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{hex_or_dash, print_report, OutputFormat, Report};

#[derive(Debug, Serialize)]
pub struct ChecksumReport {
    pub data: String,
    pub checksum: String,
}

impl Report for ChecksumReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("data", self.data.clone()),
            ("checksum", self.checksum.clone()),
        ]
    }
}

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let data = parse_hex(&args.data)?;
    print_report(
        &ChecksumReport {
            data: hex_or_dash(&data),
            checksum: format!("{:02X}", xor(&data)),
        },
        format,
    );
    Ok(SUCCESS)
}
