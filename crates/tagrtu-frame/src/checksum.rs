//! Single-byte XOR checksum.

use crate::error::{FrameError, Result};

/// Fold every byte with XOR, starting from zero.
pub fn xor(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Whether a received checksum is checked against the frame body.
///
/// The checksum is always sent. Received frames are accepted regardless of
/// their checksum byte unless `Verify` is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Accept every frame without looking at the checksum byte.
    #[default]
    Ignore,
    /// Reject frames whose checksum differs from `xor(body)`.
    Verify,
}

impl ChecksumPolicy {
    /// Apply the policy to a received body and checksum byte.
    pub fn check(self, body: &[u8], received: u8) -> Result<()> {
        match self {
            ChecksumPolicy::Ignore => Ok(()),
            ChecksumPolicy::Verify => {
                let expected = xor(body);
                if expected == received {
                    Ok(())
                } else {
                    Err(FrameError::ChecksumMismatch { expected, received })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(xor(&[]), 0);
    }

    #[test]
    fn xor_of_two_bytes() {
        assert_eq!(xor(&[0x01, 0x02]), 0x03);
        assert_eq!(xor(&[0xFF, 0x0F, 0xF0]), 0x00);
    }

    #[test]
    fn appending_checksum_cancels_out() {
        let cases: [&[u8]; 4] = [
            &[],
            &[0x42],
            &[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A],
            &[0x5A, 0x5B, 0xCC, 0x0D, 0x0A, 0x80, 0x7F],
        ];
        for bytes in cases {
            let mut extended = bytes.to_vec();
            extended.push(xor(bytes));
            assert_eq!(xor(&extended), 0, "bytes: {bytes:02X?}");
        }
    }

    #[test]
    fn ignore_accepts_any_checksum() {
        assert!(ChecksumPolicy::Ignore.check(&[0x01, 0x02], 0xEE).is_ok());
        assert_eq!(ChecksumPolicy::default(), ChecksumPolicy::Ignore);
    }

    #[test]
    fn verify_rejects_mismatch() {
        assert!(ChecksumPolicy::Verify.check(&[0x01, 0x02], 0x03).is_ok());

        let err = ChecksumPolicy::Verify.check(&[0x01, 0x02], 0x04).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ChecksumMismatch {
                expected: 0x03,
                received: 0x04
            }
        ));
    }
}
