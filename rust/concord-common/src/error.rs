use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    /// Numeric classification of the error, stable across the C boundary.
    pub fn code(&self) -> ErrorCode {
        match self.kind() {
            ErrorKind::OutOfRange { .. } => ErrorCode::OutOfRange,
            ErrorKind::NotFound { .. } => ErrorCode::NotFound,
            ErrorKind::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            _ => ErrorCode::Generic,
        }
    }

    pub fn invalid_format(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn not_found(what: impl Into<String>, name: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotFound {
                what: what.into(),
                name: name.into(),
            }
            .into(),
        )
    }

    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Query {
                query: query.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_range(offset: u64, size: u64) -> Error {
        Error(ErrorKind::OutOfRange { offset, size }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("{what} not found: {name}")]
    NotFound { what: String, name: String },

    #[error("query error in '{query}': {message}")]
    Query { query: String, message: String },

    #[error("requested line offset {offset} exceeds concordance size {size}")]
    OutOfRange { offset: u64, size: u64 },

    #[error("invalid format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

/// Error classes a caller can branch on without matching message text.
///
/// `0` is reserved for "no error" on the C side.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Generic = 1,
    OutOfRange = 2,
    NotFound = 3,
    InvalidArgument = 4,
}

impl ErrorCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Error::out_of_range(15, 10).code(), ErrorCode::OutOfRange);
        assert_eq!(
            Error::not_found("structure", "doc").code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            Error::query("[word=", "unterminated").code(),
            ErrorCode::Generic
        );
        assert_ne!(ErrorCode::OutOfRange.as_i32(), ErrorCode::Generic.as_i32());
    }

    #[test]
    fn test_messages() {
        let err = Error::out_of_range(15, 10);
        assert_eq!(
            err.to_string(),
            "requested line offset 15 exceeds concordance size 10"
        );
        let err = Error::not_found("attribute", "lemma");
        assert_eq!(err.to_string(), "attribute not found: lemma");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io("/corpora/susanne", io);
        assert!(err.to_string().starts_with("IO error for '/corpora/susanne'"));
    }
}
