use std::fmt;

/// Error type for tree and store operations, including specific error codes.
///
/// Absence is not an error: a missing key is `Ok(None)` and re-inserting an
/// identical pair is `Ok(())`. Only conditions the caller must act on show up here.
#[derive(Debug)]
pub enum Error {
    /// Local I/O error (e.g., reading a bulk load file).
    /// Error code: 1000
    Io(std::io::Error),
    /// The store is unreachable, failed to initialize, or rejected a call.
    /// Fatal to the whole session.
    /// Error code: 2000
    StoreUnavailable(String),
    /// A referenced parent or child id does not resolve, or the links
    /// between two records disagree. Fatal to the in-flight operation.
    /// Error code: 3000
    TreeCorruption(String),
    /// Record encoding/decoding error.
    /// Error code: 6000
    Serialization(String),
    /// Invalid operation (e.g., malformed command, illegal record id).
    /// Error code: 7000
    InvalidOperation(String),
    /// Invalid configuration.
    /// Error code: 8000
    Config(String),
}

impl Error {
    /// Returns the error code associated with this error variant.
    ///
    /// # Examples
    /// ```
    /// use cloudtree::errors::Error;
    /// let err = Error::TreeCorruption("left child 'x' of 'root' is missing".to_string());
    /// assert_eq!(err.code(), 3000);
    /// ```
    pub fn code(&self) -> u32 {
        match self {
            Error::Io(_) => 1000,
            Error::StoreUnavailable(_) => 2000,
            Error::TreeCorruption(_) => 3000,
            Error::Serialization(_) => 6000,
            Error::InvalidOperation(_) => 7000,
            Error::Config(_) => 8000,
        }
    }

    /// Returns a human-readable error category for this error variant.
    ///
    /// # Examples
    /// ```
    /// use cloudtree::errors::Error;
    /// let err = Error::StoreUnavailable("connection refused".to_string());
    /// assert_eq!(err.category(), "Store Unavailable");
    /// ```
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "I/O",
            Error::StoreUnavailable(_) => "Store Unavailable",
            Error::TreeCorruption(_) => "Tree Corruption",
            Error::Serialization(_) => "Serialization",
            Error::InvalidOperation(_) => "Invalid Operation",
            Error::Config(_) => "Config",
        }
    }

    /// True when the stored tree itself is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::TreeCorruption(_))
    }

    /// True for errors after which no further store call can succeed.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "[{}] I/O Error: {}", self.code(), e),
            Error::StoreUnavailable(msg) => {
                write!(f, "[{}] Store Unavailable: {}", self.code(), msg)
            }
            Error::TreeCorruption(msg) => {
                write!(f, "[{}] Tree Corruption: {}", self.code(), msg)
            }
            Error::Serialization(msg) => {
                write!(f, "[{}] Serialization Error: {}", self.code(), msg)
            }
            Error::InvalidOperation(msg) => {
                write!(f, "[{}] Invalid Operation: {}", self.code(), msg)
            }
            Error::Config(msg) => write!(f, "[{}] Config Error: {}", self.code(), msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(err: bincode::error::EncodeError) -> Self {
        Error::Serialization(format!("Failed to encode record. {}", err))
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(err: bincode::error::DecodeError) -> Self {
        Error::Serialization(format!("Failed to decode record. {}", err))
    }
}

/// Convenience macro to create an `Error` with a formatted message.
///
/// # Examples
/// ```
/// use cloudtree::err;
/// let err = err!(InvalidOperation, "Unknown command");
/// assert_eq!(err.code(), 7000);
/// assert_eq!(err.to_string(), "[7000] Invalid Operation: Unknown command");
///
/// let err = err!(TreeCorruption, "Node '{}' is missing", "root");
/// assert_eq!(err.code(), 3000);
/// assert_eq!(err.to_string(), "[3000] Tree Corruption: Node 'root' is missing");
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident, $msg:expr) => {
        $crate::errors::Error::$variant($msg.to_string())
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::errors::Error::$variant(format!($fmt, $($arg)*))
    };
}
