use std::sync::Arc;
use std::task::{Context, Poll};

use cartbox::{ConfigRequestEvent, Storefront};
use cartbox_core::Document;
use http::uri::PathAndQuery;
use http::{Request, Response, Uri};
use tower::Service;
use tracing::{debug, warn};

use crate::error::CartError;
use crate::future::{CartFuture, SettleGuard};

/// Tower service running the cart interceptor before calling `upstream`.
pub struct CartService<S, D> {
    upstream: S,
    storefront: Arc<Storefront<D>>,
}

impl<S, D> CartService<S, D> {
    /// Wraps `upstream`; requests go through the configuration event of `storefront`.
    pub fn new(upstream: S, storefront: Arc<Storefront<D>>) -> Self {
        CartService {
            upstream,
            storefront,
        }
    }
}

impl<S, D> Clone for CartService<S, D>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            storefront: Arc::clone(&self.storefront),
        }
    }
}

fn with_path(uri: &Uri, path: &str) -> Result<Uri, http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path)?);
    Ok(Uri::from_parts(parts)?)
}

impl<S, D, ReqBody, ResBody> Service<Request<ReqBody>> for CartService<S, D>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    D: Document + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = CartError<S::Error>;
    type Future = CartFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx).map_err(CartError::Upstream)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (mut parts, body) = req.into_parts();
        let original = parts
            .uri
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/")
            .to_string();

        let headers = std::mem::take(&mut parts.headers);
        let mut event = ConfigRequestEvent::new(original.as_str(), headers);
        self.storefront.dispatch(&mut event);
        parts.headers = std::mem::take(event.headers_mut());

        if event.is_cancelled() {
            debug!(path = original.as_str(), "cart request cancelled before sending");
            return CartFuture::cancelled(original);
        }

        if event.path() != original {
            match with_path(&parts.uri, event.path()) {
                Ok(uri) => parts.uri = uri,
                Err(error) => {
                    warn!(
                        path = event.path(),
                        %error,
                        "rewritten cart path is not a valid URI, sending original"
                    );
                }
            }
        }

        let guard = event.take_ticket().map(|ticket| {
            let storefront = Arc::clone(&self.storefront);
            SettleGuard::new(move |settlement| storefront.settle(ticket, settlement))
        });

        CartFuture::forwarded(self.upstream.call(Request::from_parts(parts, body)), guard)
    }
}
