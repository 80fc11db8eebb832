use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use cartbox::Settlement;
use futures::ready;
use http::Response;
use pin_project::pin_project;

use crate::error::CartError;

/// Settles a forwarded cart mutation exactly once.
///
/// A guard dropped before the response arrived settles the mutation as
/// [`Settlement::Failed`].
pub struct SettleGuard {
    settle: Option<Box<dyn FnOnce(Settlement) + Send>>,
}

impl SettleGuard {
    /// Creates a guard calling `settle` with the outcome.
    pub fn new<F>(settle: F) -> Self
    where
        F: FnOnce(Settlement) + Send + 'static,
    {
        SettleGuard {
            settle: Some(Box::new(settle)),
        }
    }

    fn settle(&mut self, settlement: Settlement) {
        if let Some(settle) = self.settle.take() {
            settle(settlement);
        }
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.settle(Settlement::Failed);
    }
}

impl fmt::Debug for SettleGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettleGuard")
            .field("settled", &self.settle.is_none())
            .finish()
    }
}

/// Future returned by [`CartService`](crate::service::CartService).
#[pin_project(project = CartFutureProj)]
pub enum CartFuture<F> {
    /// The request was handed to the inner service.
    Forwarded {
        #[pin]
        inner: F,
        guard: Option<SettleGuard>,
    },
    /// A listener cancelled the request; it was never sent.
    Cancelled { path: Option<String> },
}

impl<F> CartFuture<F> {
    pub(crate) fn forwarded(inner: F, guard: Option<SettleGuard>) -> Self {
        CartFuture::Forwarded { inner, guard }
    }

    pub(crate) fn cancelled(path: String) -> Self {
        CartFuture::Cancelled { path: Some(path) }
    }
}

impl<F, ResBody, E> Future for CartFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<ResBody>, CartError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            CartFutureProj::Forwarded { inner, guard } => {
                let result = ready!(inner.poll(cx));
                if let Some(mut guard) = guard.take() {
                    let settlement = match &result {
                        Ok(response) if response.status().is_success() => Settlement::Confirmed,
                        _ => Settlement::Failed,
                    };
                    guard.settle(settlement);
                }
                Poll::Ready(result.map_err(CartError::Upstream))
            }
            CartFutureProj::Cancelled { path } => Poll::Ready(Err(CartError::Cancelled {
                path: path.take().unwrap_or_default(),
            })),
        }
    }
}
