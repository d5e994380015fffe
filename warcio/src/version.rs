use std::str::{self, FromStr};

use crate::HeaderParseError;

/// The version of a WARC record.
///
/// Versions 0.9, 1.0 and 1.1 are all well-known, corresponding to the IIPC draft
/// WARC specification, ISO 28500:2009 and ISO 28500:2017, respectively. Those well-known
/// versions can be conveniently referred to with associated constants like
/// [`WARC1_0`](Self::WARC1_0) and [`WARC1_1`](Self::WARC1_1).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct Version {
    /// The integer part of the version number.
    ///
    /// In '12.345', this is 12.
    pub major: u32,
    /// The fractional part of the version number.
    ///
    /// In '12.345', this is 345.
    pub minor: u32,
}

/// Longest prefix of rejected input quoted back in an [`InvalidSignature`] error.
///
/// [`InvalidSignature`]: HeaderParseError::InvalidSignature
const SIGNATURE_CONTEXT: usize = 12;

impl Version {
    /// WARC 1.0, as specified by ISO 28500:2009.
    pub const WARC1_0: Self = Version { major: 1, minor: 0 };
    /// WARC 1.1, as specified by ISO 28500:2017.
    pub const WARC1_1: Self = Version { major: 1, minor: 1 };

    /// Parse the version line of a record from a buffer, returning the number of bytes
    /// consumed and the parsed version.
    ///
    /// Input that is too short to contain a complete version line is reported as
    /// [`Truncated`](HeaderParseError::Truncated) only if it could still turn out to be a valid
    /// signature; anything else is an invalid signature.
    ///
    /// ```
    /// # use warcio::Version;
    /// let buf = b"WARC/1.0\r\n\
    ///             <more here>";
    /// assert_eq!(
    ///     Version::parse(&buf[..]),
    ///     Ok((10, Version::WARC1_0))
    /// );
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<(usize, Version), HeaderParseError> {
        fn context(bytes: &[u8]) -> &[u8] {
            &bytes[..bytes.len().min(SIGNATURE_CONTEXT)]
        }
        fn bytes_to_u32(bytes: &[u8], all: &[u8]) -> Result<u32, HeaderParseError> {
            if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
                return Err(HeaderParseError::invalid_signature(context(all)));
            }
            match str::from_utf8(bytes).map(u32::from_str) {
                Ok(Ok(x)) => Ok(x),
                Err(_) | Ok(Err(_)) => Err(HeaderParseError::invalid_signature(context(all))),
            }
        }

        const MAGIC: &[u8] = b"WARC/";
        if bytes.len() < MAGIC.len() {
            return if MAGIC.starts_with(bytes) {
                Err(HeaderParseError::Truncated)
            } else {
                Err(HeaderParseError::invalid_signature(bytes))
            };
        }
        if !bytes.starts_with(MAGIC) {
            return Err(HeaderParseError::invalid_signature(context(bytes)));
        }

        let line_end = match bytes.windows(2).position(|x| x == b"\r\n") {
            Some(i) => i,
            None if bytes.len() > 32 => {
                return Err(HeaderParseError::invalid_signature(context(bytes)))
            }
            None => return Err(HeaderParseError::Truncated),
        };
        let number = &bytes[MAGIC.len()..line_end];
        let dot = match number.iter().position(|&x| x == b'.') {
            Some(i) => i,
            None => return Err(HeaderParseError::invalid_signature(context(bytes))),
        };

        let major = bytes_to_u32(&number[..dot], bytes)?;
        let minor = bytes_to_u32(&number[dot + 1..], bytes)?;

        Ok((line_end + 2, Version { major, minor }))
    }
}

/// Construct a Version with parts from a tuple of integers.
impl From<(u32, u32)> for Version {
    fn from((major, minor): (u32, u32)) -> Self {
        Version { major, minor }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "WARC/{}.{}", self.major, self.minor)
    }
}
