use backtrace::Backtrace;
use parking_lot::Mutex;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for repository operations.
///
/// Argument validation failures (`InvalidArgument`) are raised before any store
/// interaction, so callers can tell programming errors apart from store
/// failures. Everything a store reports is passed through as the `cause` of an
/// error carrying one of the store kinds.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::errors::{RepoError, ErrorKind, RepoResult};
///
/// fn example() -> RepoResult<()> {
///     Err(RepoError::new("Key must not be empty", ErrorKind::InvalidArgument))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Validation Errors
    /// A key, entity or filter argument is unusable (e.g. an empty key)
    InvalidArgument,

    // Store Errors - surfaced from the underlying document store
    /// The store rejected a write because the key already exists
    DuplicateKey,
    /// Any other store or transport failure
    StoreError,
    /// The store reported a timeout
    Timeout,

    // Async Errors
    /// The operation was cancelled through a cancellation token
    Cancelled,

    // Data Encoding Errors
    /// Error mapping an entity to/from a document
    ObjectMappingError,

    // Query Errors
    /// A filter could not be evaluated
    FilterError,

    // Indexing Errors
    /// Failed to create or validate an index
    IndexingError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::Timeout => write!(f, "Timeout"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type for every fallible repository and store operation.
///
/// `RepoError` carries a message, an [`ErrorKind`] and an optional cause. Store
/// adapters attach the driver's own error as the cause without translating it,
/// so the original failure stays reachable through [`Error::source`].
///
/// The backtrace is captured unresolved and only symbolized when the error is
/// printed with `{:?}`.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::errors::{RepoError, ErrorKind};
///
/// let err = RepoError::new("Collection resolution failed", ErrorKind::StoreError);
///
/// let io = std::io::Error::other("connection reset");
/// let err = RepoError::with_cause("insert failed", ErrorKind::StoreError, io);
/// assert!(std::error::Error::source(&err).is_some());
/// ```
#[derive(Clone)]
pub struct RepoError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Arc<dyn Error + Send + Sync + 'static>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl RepoError {
    /// Creates a new `RepoError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `RepoError` wrapping an underlying error.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the failed operation
    /// * `error_kind` - The category of error
    /// * `cause` - The original error, kept verbatim
    pub fn with_cause<E>(message: &str, error_kind: ErrorKind, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        RepoError {
            message: message.to_string(),
            error_kind,
            cause: Some(Arc::new(cause)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Returns `true` if the error was raised by argument validation.
    pub fn is_invalid_argument(&self) -> bool {
        self.error_kind == ErrorKind::InvalidArgument
    }

    /// Returns `true` if the store rejected a write for a key collision.
    pub fn is_duplicate_key(&self) -> bool {
        self.error_kind == ErrorKind::DuplicateKey
    }

    pub fn is_cancelled(&self) -> bool {
        self.error_kind == ErrorKind::Cancelled
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{} ({})\n{:?}", self.message, self.error_kind, backtrace)
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref() as &(dyn Error + 'static)),
            None => None,
        }
    }
}

/// A result type alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

impl de::Error for RepoError {
    fn custom<T: Display>(msg: T) -> Self {
        RepoError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for RepoError {
    fn custom<T: Display>(msg: T) -> Self {
        RepoError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<bson::ser::Error> for RepoError {
    fn from(err: bson::ser::Error) -> Self {
        RepoError::with_cause(
            &format!("Failed to convert entity to document: {}", err),
            ErrorKind::ObjectMappingError,
            err,
        )
    }
}

impl From<bson::de::Error> for RepoError {
    fn from(err: bson::de::Error) -> Self {
        RepoError::with_cause(
            &format!("Failed to convert document to entity: {}", err),
            ErrorKind::ObjectMappingError,
            err,
        )
    }
}

impl From<regex::Error> for RepoError {
    fn from(err: regex::Error) -> Self {
        RepoError::with_cause(
            &format!("Invalid regex pattern: {}", err),
            ErrorKind::FilterError,
            err,
        )
    }
}

impl From<std::io::Error> for RepoError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            _ => ErrorKind::InternalError,
        };
        RepoError::with_cause(&format!("IO error: {}", err), error_kind, err)
    }
}
