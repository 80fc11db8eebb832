use std::sync::Arc;

use cartbox::{Interceptor, Storefront};
use cartbox_core::Document;
use tower::Layer;

use crate::service::CartService;

/// Tower [`Layer`] applying the cart interceptor to outgoing requests.
pub struct Cart<D> {
    storefront: Arc<Storefront<D>>,
}

impl<D> Cart<D>
where
    D: Document + Send + 'static,
{
    /// Wraps `storefront`, initializing it if that was not done yet.
    pub fn new(mut storefront: Storefront<D>) -> Self {
        storefront.initialize();
        Cart {
            storefront: Arc::new(storefront),
        }
    }

    /// Shortcut for a storefront made of `interceptor` and `document`.
    pub fn from_parts(interceptor: Interceptor, document: D) -> Self {
        Self::new(Storefront::new(interceptor, document))
    }

    /// The storefront shared by every service this layer creates.
    pub fn storefront(&self) -> &Arc<Storefront<D>> {
        &self.storefront
    }
}

impl<D> Clone for Cart<D> {
    fn clone(&self) -> Self {
        Cart {
            storefront: Arc::clone(&self.storefront),
        }
    }
}

impl<S, D> Layer<S> for Cart<D> {
    type Service = CartService<S, D>;

    fn layer(&self, upstream: S) -> Self::Service {
        CartService::new(upstream, Arc::clone(&self.storefront))
    }
}
