use thiserror::Error;

/// Error returned by [`CartService`](crate::service::CartService).
#[derive(Debug, Error)]
pub enum CartError<E> {
    /// The inner service failed.
    #[error("upstream service failed")]
    Upstream(#[source] E),

    /// The request was cancelled before being sent, typically because an
    /// identical cart mutation is still in flight.
    #[error("cart request to `{path}` was cancelled")]
    Cancelled {
        /// Path of the cancelled request.
        path: String,
    },
}

impl<E> CartError<E> {
    /// Whether the request never left.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CartError::Cancelled { .. })
    }

    /// The inner service error, if that is what this is.
    pub fn into_upstream(self) -> Option<E> {
        match self {
            CartError::Upstream(error) => Some(error),
            CartError::Cancelled { .. } => None,
        }
    }
}
