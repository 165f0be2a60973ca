//! Submit handlers.
//!
//! The controller does not know how a form reaches its backend. It hands the
//! normalized values to a [`SubmitHandler`] and interprets the error, if any,
//! through the server error classifier.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::values::FormValues;

/// The asynchronous action run on a valid submit.
///
/// Failures are returned as [`anyhow::Error`]. Wrap a
/// [`TransportError`](crate::server_error::TransportError) in it when the
/// failure came from the server and may carry field errors.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: FormValues) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`SubmitHandler`].
///
/// # Examples
///
/// ```
/// use formctl_forms::submit::{FnSubmitHandler, SubmitHandler};
/// use formctl_forms::values::FormValues;
///
/// let handler = FnSubmitHandler::new(|values: FormValues| async move {
///     assert!(values.contains("message"));
///     anyhow::Ok(())
/// });
/// # let _ = handler;
/// ```
pub struct FnSubmitHandler<F> {
    f: F,
}

impl<F> FnSubmitHandler<F> {
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> SubmitHandler for FnSubmitHandler<F>
where
    F: Fn(FormValues) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn submit(&self, values: FormValues) -> anyhow::Result<()> {
        (self.f)(values).await
    }
}

impl<F> fmt::Debug for FnSubmitHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSubmitHandler")
    }
}
