//! Frame settings from flags and an optional JSON file.
//!
//! Flags win over the file; the file wins over the built-in defaults
//! (`5A5B` header, `CC` tag, `0D0A` trailer, trailer scanning).

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;
use tagrtu_frame::{
    ChecksumPolicy, FrameConfig, DEFAULT_HEADER, DEFAULT_ORIGIN_TAG, DEFAULT_TRAILER,
};

use crate::exit::{frame_error, io_error, CliError, CliResult};

#[derive(Args, Debug, Default, Clone)]
pub struct FrameArgs {
    /// JSON file with frame settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Frame header as hex (default 5A5B).
    #[arg(long, value_name = "HEX")]
    pub header: Option<String>,
    /// Origin tag byte as hex (default CC).
    #[arg(long, value_name = "HEX")]
    pub tag: Option<String>,
    /// Frame trailer as hex (default 0D0A).
    #[arg(long, value_name = "HEX")]
    pub trailer: Option<String>,
    /// Responses are exactly this many bytes instead of ending at the trailer.
    #[arg(long, value_name = "BYTES")]
    pub fixed_count: Option<usize>,
    /// Reject frames whose checksum does not match.
    #[arg(long)]
    pub verify_checksum: bool,
}

/// Contents of a `--config` file. Byte fields are hex strings.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub header: Option<String>,
    pub origin_tag: Option<String>,
    pub trailer: Option<String>,
    pub fixed_read_count: Option<usize>,
    pub verify_checksum: Option<bool>,
    pub response_timeout: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> CliResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| CliError::usage(format!("invalid config file: {err}")))
    }
}

/// Settings after merging flags, file and defaults.
#[derive(Debug)]
pub struct Resolved {
    pub frame: FrameConfig,
    pub response_timeout: Option<Duration>,
}

impl FrameArgs {
    pub fn resolve(&self) -> CliResult<Resolved> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        self.merge(file)
    }

    fn merge(&self, file: ConfigFile) -> CliResult<Resolved> {
        let header = match self.header.as_deref().or(file.header.as_deref()) {
            Some(hex) => parse_hex(hex)?,
            None => DEFAULT_HEADER.to_vec(),
        };
        let tag = match self.tag.as_deref().or(file.origin_tag.as_deref()) {
            Some(hex) => parse_byte(hex)?,
            None => DEFAULT_ORIGIN_TAG,
        };
        let trailer = match self.trailer.as_deref().or(file.trailer.as_deref()) {
            Some(hex) => parse_hex(hex)?,
            None => DEFAULT_TRAILER.to_vec(),
        };
        let verify = self.verify_checksum || file.verify_checksum.unwrap_or(false);

        let frame = match self.fixed_count.or(file.fixed_read_count) {
            Some(count) => FrameConfig::fixed_count(header, tag, count)
                .and_then(|config| config.with_trailer(trailer)),
            None => FrameConfig::trailer_scan(header, tag, trailer),
        }
        .map_err(|err| frame_error("invalid frame settings", err))?;

        let frame = if verify {
            frame.with_checksum_policy(ChecksumPolicy::Verify)
        } else {
            frame
        };

        let response_timeout = file
            .response_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        Ok(Resolved {
            frame,
            response_timeout,
        })
    }
}

/// Decode hex, ignoring whitespace, `-`/`:` separators and a `0x` prefix.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|err| CliError::usage(format!("invalid hex '{input}': {err}")))
}

pub fn parse_byte(input: &str) -> CliResult<u8> {
    match parse_hex(input)?.as_slice() {
        [byte] => Ok(*byte),
        _ => Err(CliError::usage(format!(
            "expected exactly one hex byte, got '{input}'"
        ))),
    }
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use tagrtu_frame::ReadMode;

    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn defaults_without_flags_or_file() {
        let resolved = FrameArgs::default().resolve().unwrap();
        assert_eq!(resolved.frame, FrameConfig::default());
        assert!(resolved.response_timeout.is_none());
    }

    #[test]
    fn flags_override_file() {
        let file = ConfigFile::parse(
            r#"{"header": "AA", "origin_tag": "01", "trailer": "FF", "response_timeout": "250ms"}"#,
        )
        .unwrap();
        let args = FrameArgs {
            tag: Some("02".to_string()),
            ..FrameArgs::default()
        };

        let resolved = args.merge(file).unwrap();
        assert_eq!(resolved.frame.header(), &[0xAA]);
        assert_eq!(resolved.frame.origin_tag(), 0x02);
        assert_eq!(resolved.frame.trailer(), &[0xFF]);
        assert_eq!(resolved.response_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn fixed_count_from_file_allows_empty_trailer() {
        let file = ConfigFile::parse(r#"{"fixed_read_count": 9, "trailer": ""}"#).unwrap();
        let resolved = FrameArgs::default().merge(file).unwrap();
        assert_eq!(resolved.frame.read_mode(), ReadMode::FixedCount(9));
        assert!(resolved.frame.trailer().is_empty());
    }

    #[test]
    fn empty_trailer_rejected_in_trailer_scan_mode() {
        let args = FrameArgs {
            trailer: Some(String::new()),
            ..FrameArgs::default()
        };
        let err = args.resolve().unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn verify_flag_sets_policy() {
        let args = FrameArgs {
            verify_checksum: true,
            ..FrameArgs::default()
        };
        let resolved = args.resolve().unwrap();
        assert_eq!(resolved.frame.checksum_policy(), ChecksumPolicy::Verify);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let err = ConfigFile::parse(r#"{"heder": "5A5B"}"#).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn hex_accepts_common_separators() {
        assert_eq!(parse_hex("5A 5B-CC:01").unwrap(), vec![0x5A, 0x5B, 0xCC, 0x01]);
        assert_eq!(parse_hex("0x0d0a").unwrap(), vec![0x0D, 0x0A]);
        assert!(parse_hex("5").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn tag_must_be_one_byte() {
        assert_eq!(parse_byte("cc").unwrap(), 0xCC);
        assert!(parse_byte("CCDD").is_err());
        assert!(parse_byte("").is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
