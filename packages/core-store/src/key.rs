//! Storage keys: validated, `/`-separated physical locations.

use std::fmt;

use crate::Error;

/// A validated storage key.
///
/// Keys are path-like: segments joined by `/`. A valid key has at least one
/// segment, no leading `/`, no empty segment and no `.` or `..` segment.
/// Backends with a native hierarchy map segments to nested names, flat
/// backends store the joined string.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageKey {
    segments: Vec<String>,
}

impl StorageKey {
    /// Parse a key string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fontstore_core_store::StorageKey;
    ///
    /// let key = StorageKey::parse("glyphs/A_.glif").unwrap();
    /// assert_eq!(key.len(), 2);
    /// assert_eq!(key.file_name(), "A_.glif");
    ///
    /// assert!(StorageKey::parse("/glyphs").is_err());
    /// assert!(StorageKey::parse("glyphs//A_.glif").is_err());
    /// assert!(StorageKey::parse("../lib.plist").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.starts_with('/') {
            return Err(invalid(s, "leading '/'"));
        }
        Self::from_segments(s.split('/').map(str::to_string).collect())
            .map_err(|e| match e {
                Error::InvalidKey { message, .. } => invalid(s, &message),
                other => other,
            })
    }

    /// Build a key from individual segments, validating each.
    pub fn from_segments(segments: Vec<String>) -> Result<Self, Error> {
        if segments.is_empty() {
            return Err(invalid("", "empty key"));
        }
        for segment in &segments {
            Self::validate_segment(segment)?;
        }
        Ok(StorageKey { segments })
    }

    /// Single-segment key for a name known to be valid.
    pub(crate) fn well_known(name: &'static str) -> Self {
        StorageKey {
            segments: vec![name.to_string()],
        }
    }

    fn validate_segment(segment: &str) -> Result<(), Error> {
        match segment {
            "" => Err(invalid(segment, "empty segment")),
            "." | ".." => Err(invalid(segment, "relative segment")),
            s if s.contains('/') => Err(invalid(segment, "segment contains '/'")),
            _ => Ok(()),
        }
    }

    /// Append one segment.
    pub fn join(&self, segment: &str) -> Result<StorageKey, Error> {
        Self::validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(StorageKey { segments })
    }

    /// The key without its last segment, if there is more than one.
    pub fn parent(&self) -> Option<StorageKey> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(StorageKey {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The last segment.
    pub fn file_name(&self) -> &str {
        // Non-empty by construction
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Borrow the segments in the shape the LL layer takes.
    pub fn as_ll(&self) -> Vec<&str> {
        self.segments.iter().map(String::as_str).collect()
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::InvalidKey {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl std::str::FromStr for StorageKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageKey::parse(s)
    }
}

/// Macro for storage key literals.
///
/// # Example
///
/// ```rust
/// use fontstore_core_store::key;
///
/// let k = key!("glyphs/contents.plist");
/// assert_eq!(k.len(), 2);
/// ```
#[macro_export]
macro_rules! key {
    ($s:expr) => {
        $crate::StorageKey::parse($s).expect("invalid key literal")
    };
}
