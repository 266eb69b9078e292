use docrepo::errors::{ErrorKind, RepoError};
use mongodb::error::{
    Error, ErrorKind as DriverErrorKind, IndexedWriteError, InsertManyError, WriteFailure,
};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Classifies a driver error and wraps it as the cause of a [`RepoError`].
pub(crate) fn map_error(operation: &str, collection: &str, err: Error) -> RepoError {
    let kind = classify(&err);
    log::error!("MongoDB {} on {} failed: {}", operation, collection, err);
    RepoError::with_cause(
        &format!("MongoDB {} on {} failed: {}", operation, collection, err),
        kind,
        err,
    )
}

fn classify(err: &Error) -> ErrorKind {
    match err.kind.as_ref() {
        DriverErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            ErrorKind::DuplicateKey
        }
        DriverErrorKind::ServerSelection { .. } => ErrorKind::Timeout,
        DriverErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
        DriverErrorKind::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        DriverErrorKind::BsonSerialization(_) | DriverErrorKind::BsonDeserialization(_) => {
            ErrorKind::ObjectMappingError
        }
        DriverErrorKind::InsertMany(InsertManyError {
            write_errors: Some(write_errors),
            ..
        }) if has_duplicate_key(write_errors) => ErrorKind::DuplicateKey,
        _ => ErrorKind::StoreError,
    }
}

fn has_duplicate_key(write_errors: &[IndexedWriteError]) -> bool {
    write_errors
        .iter()
        .any(|write_error| write_error.code == DUPLICATE_KEY_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn indexed_write_error(code: i32) -> IndexedWriteError {
        bson::from_document(doc! {
            "index": 1,
            "code": code,
            "codeName": "DuplicateKey",
            "code_name": "DuplicateKey",
            "errmsg": "E11000 duplicate key error",
            "message": "E11000 duplicate key error",
        })
        .unwrap()
    }

    #[test]
    fn io_timeout_is_timeout() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert_eq!(classify(&err), ErrorKind::Timeout);

        let mapped = map_error("find", "roles", err);
        assert_eq!(mapped.kind(), &ErrorKind::Timeout);
        assert!(mapped.cause().is_some());
    }

    #[test]
    fn other_io_is_store_error() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(classify(&err), ErrorKind::StoreError);
    }

    #[test]
    fn batch_duplicate_is_detected_by_code() {
        assert!(has_duplicate_key(&[indexed_write_error(121), indexed_write_error(11000)]));
        assert!(!has_duplicate_key(&[indexed_write_error(121)]));
        assert!(!has_duplicate_key(&[]));
    }

    #[test]
    fn duplicate_key_text_alone_is_not_a_duplicate() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            "E11000 duplicate key error",
        ));
        assert_eq!(classify(&err), ErrorKind::StoreError);
    }
}
