//! Error types for the LL layer.
//!
//! Errors at this level are transport-focused. No semantic errors like
//! "malformed plist" or "unknown glif element" - those belong in higher layers.

/// Errors at the LL (low-level) layer.
#[derive(Debug)]
pub enum LLError {
    /// Generic I/O or transport failure.
    ///
    /// File I/O errors, archive errors, database errors, etc.
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The operation is not supported by this store.
    ///
    /// For example, raw byte access on a store whose native representation
    /// is a single structured document.
    NotSupported,

    /// Resource limit exceeded.
    ResourceExhausted,
}

impl LLError {
    /// Wrap any error as a transport failure.
    pub fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        LLError::Transport(Box::new(e))
    }
}

impl std::fmt::Display for LLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLError::Transport(e) => write!(f, "transport error: {}", e),
            LLError::NotSupported => write!(f, "operation not supported"),
            LLError::ResourceExhausted => write!(f, "resource exhausted"),
        }
    }
}

impl std::error::Error for LLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LLError::Transport(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LLError {
    fn from(e: std::io::Error) -> Self {
        LLError::Transport(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_works() {
        let e = LLError::NotSupported;
        assert_eq!(format!("{}", e), "operation not supported");

        let e = LLError::transport(std::io::Error::other("disk on fire"));
        assert!(format!("{}", e).contains("disk on fire"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ll_err: LLError = io_err.into();
        assert!(matches!(ll_err, LLError::Transport(_)));
        assert!(std::error::Error::source(&ll_err).is_some());
    }
}
