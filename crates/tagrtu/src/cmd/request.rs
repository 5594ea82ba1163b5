use std::net::TcpStream;

use serde::Serialize;
use tagrtu_message::{
    ByteCollection, LenientRegisterCollection, ReadCustomRequest, ReadCustomResponse,
};
use tagrtu_stream::ByteStream;
use tagrtu_transport::{Transport, TransportConfig, DEFAULT_RESPONSE_TIMEOUT};
use tracing::debug;

use crate::cmd::RequestArgs;
use crate::config::{parse_duration, parse_hex};
use crate::exit::{io_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

#[derive(Debug, Serialize)]
pub struct RequestReport {
    pub addr: String,
    pub request: String,
    pub byte_count: usize,
    pub registers: Vec<i16>,
}

impl Report for RequestReport {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("addr", self.addr.clone()),
            ("request", self.request.clone()),
            ("byte_count", self.byte_count.to_string()),
            (
                "registers",
                LenientRegisterCollection::new(self.registers.clone()).to_string(),
            ),
        ]
    }
}

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let body = parse_hex(&args.body)?;
    let resolved = args.frame.resolve()?;
    let timeout = match &args.timeout {
        Some(input) => parse_duration(input)?,
        None => resolved.response_timeout.unwrap_or(DEFAULT_RESPONSE_TIMEOUT),
    };

    let stream = TcpStream::connect(&args.addr)
        .map_err(|err| io_error(&format!("connect to {} failed", args.addr), err))?;
    // The transport takes its response deadline from the stream's write timeout.
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|err| io_error("failed setting timeout", err))?;
    debug!(addr = %args.addr, ?timeout, "connected");

    let mut transport =
        Transport::from_stream(ByteStream::from(stream), TransportConfig::new(resolved.frame))
            .map_err(|err| transport_error("transport setup failed", err))?;

    let request = ReadCustomRequest::new(ByteCollection::new(body));
    let frame = transport.build_message_frame(&request);
    let response: ReadCustomResponse = transport
        .unicast(&request)
        .map_err(|err| transport_error("request failed", err))?;

    print_report(
        &RequestReport {
            addr: args.addr,
            request: hex::encode_upper(&frame),
            byte_count: response.byte_count(),
            registers: response.data().as_slice().to_vec(),
        },
        format,
    );
    Ok(SUCCESS)
}
