//! Error types for the Core layer.

use fontstore_ll_store::LLError;

/// Errors at the Core layer.
///
/// These cover document structure, glyph validation and model misuse in
/// addition to the transport errors from the LL layer. A missing unit is
/// never an error; reads return `None` for it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The bytes are not a well-formed document of the expected kind.
    #[error("malformed document: {message}")]
    MalformedDocument { message: String },

    /// A property tree of the wrong shape was handed to the encoder.
    #[error("invalid root type: expected {expected}, found {found}")]
    InvalidRootType {
        expected: &'static str,
        found: &'static str,
    },

    /// A logical name cannot be mapped to a storage key.
    #[error("invalid name {name:?}: {message}")]
    InvalidName { name: String, message: String },

    /// A storage key violates the key syntax.
    #[error("invalid key {key:?}: {message}")]
    InvalidKey { key: String, message: String },

    /// An element that is not allowed at this position.
    #[error("unknown element <{tag}> in <{parent}>")]
    UnknownElement { tag: String, parent: String },

    /// An element that may appear only once appeared again.
    #[error("duplicate element <{tag}>")]
    DuplicateElement { tag: String },

    /// A component without a `base` attribute.
    #[error("component is missing its base glyph")]
    MissingBaseGlyph,

    /// A numeric attribute that is neither an integer nor a float.
    #[error("invalid number {text:?}")]
    InvalidNumber { text: String },

    /// A contour that breaks the point sequence rules.
    #[error("invalid contour: {message}")]
    InvalidContour { message: String },

    /// The same identifier was used twice in one glyph.
    #[error("duplicate identifier {identifier:?}")]
    DuplicateIdentifier { identifier: String },

    /// A point or path end without an open path.
    #[error("no open path")]
    NoOpenPath,

    /// A new path or component while a path is still open.
    #[error("path is still open")]
    UnclosedPath,

    #[error("glyph {name:?} not found")]
    GlyphNotFound { name: String },

    #[error("layer {name:?} not found")]
    LayerNotFound { name: String },

    #[error("layer {name:?} already exists")]
    DuplicateLayer { name: String },

    /// A fontinfo attribute outside the allowed set.
    #[error("unknown fontinfo attribute {name:?}")]
    UnknownInfoAttribute { name: String },

    /// The backend has no representation for this operation.
    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    /// Error from the LL layer.
    #[error("ll error: {0}")]
    Ll(#[source] LLError),
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedDocument {
            message: message.into(),
        }
    }

    pub fn invalid_contour(message: impl Into<String>) -> Self {
        Error::InvalidContour {
            message: message.into(),
        }
    }

    pub fn not_supported(operation: impl Into<String>) -> Self {
        Error::NotSupported {
            operation: operation.into(),
        }
    }

    /// Attach the offending name to a key derivation failure.
    pub fn invalid_name(name: &str, error: keynames::NameError) -> Self {
        Error::InvalidName {
            name: name.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<LLError> for Error {
    fn from(e: LLError) -> Self {
        match e {
            LLError::NotSupported => Error::not_supported("raw byte access"),
            other => Error::Ll(other),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Ll(LLError::from(e))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn error_display() {
        let e = Error::malformed("root element must be <plist>");
        assert_eq!(
            e.to_string(),
            "malformed document: root element must be <plist>"
        );

        let e = Error::UnknownElement {
            tag: "blob".to_string(),
            parent: "glyph".to_string(),
        };
        assert_eq!(e.to_string(), "unknown element <blob> in <glyph>");

        let e = Error::InvalidRootType {
            expected: "dict",
            found: "array",
        };
        assert!(e.to_string().contains("expected dict"));
    }

    #[test]
    fn ll_not_supported_surfaces_as_not_supported() {
        let e: Error = LLError::NotSupported.into();
        assert!(matches!(e, Error::NotSupported { .. }));
    }

    #[test]
    fn ll_transport_is_wrapped() {
        let e: Error = LLError::transport(std::io::Error::other("disk on fire")).into();
        assert!(matches!(e, Error::Ll(_)));
        assert!(e.to_string().contains("disk on fire"));
    }

    #[test]
    fn io_errors_are_transport_errors() {
        let e: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(e, Error::Ll(LLError::Transport(_))));
    }

    #[test]
    fn ll_error_source() {
        let e = Error::Ll(LLError::ResourceExhausted);
        assert!(StdError::source(&e).is_some());
        assert!(e.to_string().contains("resource exhausted"));
    }

    #[test]
    fn name_errors_become_invalid_name() {
        let e = Error::invalid_name("", keynames::NameError::Empty);
        assert!(matches!(e, Error::InvalidName { .. }));
        assert!(e.to_string().contains("name is empty"));
    }
}
