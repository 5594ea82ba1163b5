use serde::Serialize;
use tagrtu_frame::{
    decode_frame, locate_header, strip_leading_garbage, verify_checksum, xor, FrameConfig,
    FrameParts,
};
use tagrtu_message::{LenientRegisterCollection, RegisterCollection};

use crate::cmd::InspectArgs;
use crate::config::parse_hex;
use crate::exit::{frame_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{hex_or_dash, print_report, OutputFormat, Report};

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub received_len: usize,
    pub header_index: Option<usize>,
    pub header: String,
    pub origin_tag: String,
    pub body: String,
    pub checksum: String,
    pub expected_checksum: String,
    pub checksum_ok: bool,
    pub trailer: String,
    pub registers: Option<Vec<i16>>,
    pub registers_error: Option<String>,
    pub lenient_registers: Vec<i16>,
}

impl Report for InspectReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let header_index = match self.header_index {
            Some(index) => index.to_string(),
            None => "not found".to_string(),
        };
        let registers = match (&self.registers, &self.registers_error) {
            (Some(values), _) => RegisterCollection::new(values.clone()).to_string(),
            (None, Some(err)) => format!("({err})"),
            (None, None) => "-".to_string(),
        };
        vec![
            ("received_len", self.received_len.to_string()),
            ("header_index", header_index),
            ("header", self.header.clone()),
            ("origin_tag", self.origin_tag.clone()),
            ("body", self.body.clone()),
            ("checksum", self.checksum.clone()),
            ("expected_checksum", self.expected_checksum.clone()),
            ("checksum_ok", self.checksum_ok.to_string()),
            ("trailer", self.trailer.clone()),
            ("registers", registers),
            (
                "lenient_registers",
                LenientRegisterCollection::new(self.lenient_registers.clone()).to_string(),
            ),
        ]
    }
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let received = parse_hex(&args.frame_hex)?;
    let config = args.frame.resolve()?.frame;

    let (report, parts) = inspect(&config, received)?;
    print_report(&report, format);

    match verify_checksum(&config, &parts) {
        Ok(()) => Ok(SUCCESS),
        Err(err) => {
            eprintln!("error: {err}");
            Ok(DATA_INVALID)
        }
    }
}

pub fn inspect(config: &FrameConfig, received: Vec<u8>) -> CliResult<(InspectReport, FrameParts)> {
    let received_len = received.len();
    let header_index = locate_header(config.header(), &received);
    let stripped = strip_leading_garbage(config.header(), received.into());
    let parts = decode_frame(config, &stripped)
        .map_err(|err| frame_error("cannot split frame", err))?;

    let (registers, registers_error) = match RegisterCollection::from_network_bytes(&parts.body) {
        Ok(regs) => (Some(regs.into_vec()), None),
        Err(err) => (None, Some(err.to_string())),
    };
    let lenient = LenientRegisterCollection::from_network_bytes(&parts.body)
        .map(LenientRegisterCollection::into_vec)
        .unwrap_or_default();

    let report = InspectReport {
        received_len,
        header_index,
        header: hex_or_dash(&parts.header),
        origin_tag: format!("{:02X}", parts.origin_tag),
        body: hex_or_dash(&parts.body),
        checksum: format!("{:02X}", parts.checksum),
        expected_checksum: format!("{:02X}", xor(&parts.body)),
        checksum_ok: parts.checksum_matches(),
        trailer: hex_or_dash(&parts.trailer),
        registers,
        registers_error,
        lenient_registers: lenient,
    };
    Ok((report, parts))
}
