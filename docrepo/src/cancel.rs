//! Cooperative cancellation of repository operations.
//!
//! Every asynchronous repository operation can be raced against a
//! [`CancellationToken`]. When the token fires first the operation's future is
//! dropped and the caller receives an error of kind
//! [`ErrorKind::Cancelled`]. A write the store already accepted is not rolled
//! back.
//!
//! ```rust,ignore
//! use docrepo::cancel::Cancellable;
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let role = roles.find(&key).with_cancellation(&token).await?;
//! ```

use crate::errors::{ErrorKind, RepoError, RepoResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

pub use tokio_util::sync::CancellationToken;

/// Runs `future` until it completes or `token` is cancelled.
///
/// A token that is already cancelled wins without polling the future.
pub async fn run_cancellable<T, F>(token: &CancellationToken, future: F) -> RepoResult<T>
where
    F: Future<Output = RepoResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            log::debug!("Repository operation cancelled");
            Err(RepoError::new("Operation was cancelled", ErrorKind::Cancelled))
        }
        result = future => result,
    }
}

/// Extension for racing repository futures against a cancellation token.
pub trait Cancellable<T>: Future<Output = RepoResult<T>> + Sized {
    fn with_cancellation<'a>(self, token: &'a CancellationToken) -> BoxFuture<'a, RepoResult<T>>
    where
        Self: Send + 'a,
        T: Send + 'a;
}

impl<T, F> Cancellable<T> for F
where
    F: Future<Output = RepoResult<T>>,
{
    fn with_cancellation<'a>(self, token: &'a CancellationToken) -> BoxFuture<'a, RepoResult<T>>
    where
        Self: Send + 'a,
        T: Send + 'a,
    {
        run_cancellable(token, self).boxed()
    }
}
