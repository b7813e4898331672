//! Keynames: derive storage keys from logical font names.
//!
//! Glyph and layer names are arbitrary Unicode strings, but they end up as
//! file names, archive entry names or database keys. Keynames maps a name to
//! a key that is safe on every common file system, stays distinct from the
//! keys already in use even on case-insensitive volumes, and fits a length
//! limit.
//!
//! # Key Properties
//!
//! - Deterministic: the same name and the same existing set give the same key
//! - Never returns a key that is already taken (compared case-insensitively)
//! - `A` and `a` map to different keys (`A_` and `a`)
//! - Unclamped, undisambiguated keys decode back to their name
//!
//! # Examples
//!
//! ```
//! use keynames::{assign, decode, KeyOptions};
//!
//! let options = KeyOptions::default().with_suffix(".glif");
//!
//! assert_eq!(assign("A", [], &options).unwrap(), "A_.glif");
//! assert_eq!(assign("a", ["A_.glif"], &options).unwrap(), "a.glif");
//! assert_eq!(assign(".notdef", [], &options).unwrap(), "%2Enotdef.glif");
//!
//! // A taken key gets a counter
//! assert_eq!(assign("a", ["a.glif"], &options).unwrap(), "a1.glif");
//!
//! assert_eq!(decode("A_.glif", &options).unwrap(), "A");
//! ```

mod clamp;
mod decode;
mod escape;

use std::collections::HashSet;

pub use clamp::{name_hash, HASH_LENGTH, HASH_SEPARATOR};
pub use decode::{decode, unescape};
pub use escape::{escape, CASE_MARKER, ESCAPE};

/// Default upper bound on a full key, in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 255;

/// Errors that can occur while assigning or decoding keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The logical name is empty.
    Empty,
    /// The prefix and suffix leave no room for a body.
    TooLong { max_length: usize },
    /// The key was not produced by this scheme.
    NotDecodable { key: String, reason: &'static str },
}

impl std::fmt::Display for NameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameError::Empty => write!(f, "name is empty"),
            NameError::TooLong { max_length } => {
                write!(f, "no key fits in {} bytes", max_length)
            }
            NameError::NotDecodable { key, reason } => {
                write!(f, "key '{}' cannot be decoded: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for NameError {}

/// Shape of the generated keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOptions {
    /// Literal text put in front of the escaped body.
    pub prefix: String,
    /// Literal text put after the escaped body.
    pub suffix: String,
    /// Maximum length of the full key in bytes.
    pub max_length: usize,
}

impl Default for KeyOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl KeyOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn wrap(&self, body: &str) -> String {
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

/// Assign a storage key to `name` that is not in `existing`.
///
/// `existing` is compared case-insensitively. When the natural key is taken,
/// the decimal counters `1`, `2`, ... are tried in order.
pub fn assign<'a, I>(name: &str, existing: I, options: &KeyOptions) -> Result<String, NameError>
where
    I: IntoIterator<Item = &'a str>,
{
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    let too_long = NameError::TooLong {
        max_length: options.max_length,
    };
    let budget = options
        .max_length
        .checked_sub(options.prefix.len() + options.suffix.len())
        .ok_or_else(|| too_long.clone())?;

    let taken: HashSet<String> = existing.into_iter().map(str::to_lowercase).collect();
    let units = escape::escape_units(name);

    let body = clamp::fit(&units, budget, name).ok_or_else(|| too_long.clone())?;
    let key = options.wrap(&body);
    if !taken.contains(&key.to_lowercase()) {
        return Ok(key);
    }

    // Bounded by the size of `taken`: each round rules out one member.
    for counter in 1..=taken.len() + 1 {
        let digits = counter.to_string();
        let room = budget
            .checked_sub(digits.len())
            .ok_or_else(|| too_long.clone())?;
        let body = clamp::fit(&units, room, name).ok_or_else(|| too_long.clone())?;
        let key = options.wrap(&format!("{}{}", body, digits));
        if !taken.contains(&key.to_lowercase()) {
            return Ok(key);
        }
    }

    Err(too_long)
}
