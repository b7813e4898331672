//! Reverse the escaping applied by [`crate::escape`].

use crate::escape::{folds, CASE_MARKER, ESCAPE};
use crate::{KeyOptions, NameError};

/// Recover the logical name from an escaped body.
///
/// # Examples
///
/// ```
/// use keynames::unescape;
///
/// assert_eq!(unescape("A_acute").unwrap(), "Aacute");
/// assert_eq!(unescape("%2Enotdef").unwrap(), ".notdef");
/// ```
pub fn unescape(body: &str) -> Result<String, NameError> {
    let not_decodable = |reason: &'static str| NameError::NotDecodable {
        key: body.to_string(),
        reason,
    };

    let mut bytes: Vec<u8> = Vec::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            let hi = chars.next().and_then(|h| h.to_digit(16));
            let lo = chars.next().and_then(|l| l.to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => bytes.push((hi * 16 + lo) as u8),
                _ => return Err(not_decodable("truncated escape sequence")),
            }
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            if folds(c) && chars.next() != Some(CASE_MARKER) {
                return Err(not_decodable("missing case marker"));
            }
        }
    }

    String::from_utf8(bytes).map_err(|_| not_decodable("escapes do not form UTF-8"))
}

/// Recover the logical name from a full key produced by [`crate::assign`].
///
/// Only keys that were neither clamped nor disambiguated decode to their
/// original name; callers that need the exact mapping persist it.
pub fn decode(key: &str, options: &KeyOptions) -> Result<String, NameError> {
    let body = key
        .strip_prefix(options.prefix.as_str())
        .and_then(|rest| rest.strip_suffix(options.suffix.as_str()))
        .ok_or_else(|| NameError::NotDecodable {
            key: key.to_string(),
            reason: "prefix or suffix does not match",
        })?;

    if body.is_empty() {
        return Err(NameError::NotDecodable {
            key: key.to_string(),
            reason: "empty body",
        });
    }

    unescape(body)
}
