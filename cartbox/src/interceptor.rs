//! The cart mutation interceptor.
//!
//! For every pre-send configuration event the interceptor decides whether
//! the request is a cart mutation and, if so, runs
//!
//! 1. target resolution ([`TargetResolver`])
//! 2. path rewriting ([`rewrite`](crate::rewrite))
//! 3. the optimistic counter update ([`OptimisticCounter`])
//!
//! in that order, synchronously, before the request leaves.
//!
//! The decision itself is a pure function of the event and the page
//! ([`Interceptor::decide`]); [`Interceptor::handle`] is the thin adapter
//! that applies it to the event and the page.

use std::fmt;

use cartbox_core::{
    BoxLookup, CartMutationRequest, ConfigurationLookup, Document, MutationKey, MutationKind,
    PriceLinkLookup, ResolveError,
};
use http::HeaderName;
use smol_str::SmolStr;
use tracing::{debug, debug_span, warn};

use crate::counter::{DEFAULT_COUNTER_ELEMENT, OptimisticCounter};
use crate::event::{ConfigRequestEvent, MutationTicket};
use crate::pending::{InFlightPolicy, PendingMutations};
use crate::resolver::TargetResolver;
use crate::rewriter::rewrite;

/// Default header carrying the id of the element that triggered the request.
pub const DEFAULT_TARGET_HEADER: &str = "hx-target";
/// Default header carrying the URL of the page the request is sent from.
pub const DEFAULT_CURRENT_URL_HEADER: &str = "hx-current-url";
/// Default path segment identifying the cart page.
pub const DEFAULT_CART_VIEW_SEGMENT: &str = "/cart";
/// Default attribute group of configuration controls.
pub const DEFAULT_ATTRIBUTE: &str = "price";

/// A request path that mutates the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRoute {
    path: String,
    kind: MutationKind,
}

impl MutationRoute {
    /// Creates a route. A leading `/` is added and trailing ones are trimmed.
    pub fn new(path: impl AsRef<str>, kind: MutationKind) -> Self {
        let trimmed = path.as_ref().trim_matches('/');
        Self {
            path: format!("/{trimmed}"),
            kind,
        }
    }

    /// The `/cart/add` route.
    pub fn add() -> Self {
        Self::new("/cart/add", MutationKind::Add)
    }

    /// The `/cart/remove` route.
    pub fn remove() -> Self {
        Self::new("/cart/remove", MutationKind::Remove)
    }

    /// Route path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Mutation performed by requests to this route.
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Whether `request_path` targets this route.
    ///
    /// Query string, fragment and trailing slashes are ignored; the route
    /// may be mounted under a prefix (`/shop/cart/add` matches `/cart/add`),
    /// but must match whole segments (`/cart/address` does not).
    pub fn matches(&self, request_path: &str) -> bool {
        let path = request_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        path.ends_with(self.path.as_str())
    }
}

/// Outcome of inspecting one configuration event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteDecision {
    /// Not a cart mutation; the request is left alone.
    Passthrough,
    /// Cart mutation to be sent to `path`.
    Rewrite {
        /// The rewritten request path.
        path: String,
        /// Key of the mutation.
        key: MutationKey,
    },
    /// An identical mutation is still in flight; the request is cancelled.
    Duplicate(MutationKey),
    /// The target could not be resolved; the request is sent unmodified.
    Failed(ResolveError),
}

impl RewriteDecision {
    /// Whether the request path is rewritten.
    pub fn is_rewrite(&self) -> bool {
        matches!(self, RewriteDecision::Rewrite { .. })
    }

    /// Key of the mutation, when one was resolved.
    pub fn key(&self) -> Option<MutationKey> {
        match self {
            RewriteDecision::Rewrite { key, .. } | RewriteDecision::Duplicate(key) => Some(*key),
            RewriteDecision::Passthrough | RewriteDecision::Failed(_) => None,
        }
    }
}

/// Rewrites cart mutation requests and applies their optimistic counter update.
///
/// # Example
///
/// ```
/// use cartbox::{ConfigRequestEvent, Interceptor};
/// use cartbox_core::{ConfigurationControl, MemoryDocument};
/// use http::{HeaderMap, HeaderValue};
///
/// let interceptor = Interceptor::builder().build();
/// let mut page = MemoryDocument::new()
///     .with_control(42, ConfigurationControl::new("price", "/products/42/prices/7").selected())
///     .with_element("cart-counter", "0");
///
/// let mut headers = HeaderMap::new();
/// headers.insert("hx-target", HeaderValue::from_static("product42counter"));
/// headers.insert("hx-current-url", HeaderValue::from_static("https://shop.test/"));
/// let mut event = ConfigRequestEvent::new("/cart/add", headers);
///
/// interceptor.handle(&mut event, &mut page);
/// assert_eq!(event.path(), "/cart/add?configuration_id=7&product_id=42");
/// ```
pub struct Interceptor {
    routes: Vec<MutationRoute>,
    target_header: HeaderName,
    current_url_header: HeaderName,
    cart_view_segment: String,
    resolver: TargetResolver<BoxLookup>,
    counter: OptimisticCounter,
    pending: PendingMutations,
    in_flight: InFlightPolicy,
}

impl Interceptor {
    /// Creates a new [`InterceptorBuilder`] with default settings.
    pub fn builder() -> InterceptorBuilder {
        InterceptorBuilder::new()
    }

    /// First route matching `path`.
    pub fn route_for(&self, path: &str) -> Option<&MutationRoute> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Reads the cart mutation request carried by `event`.
    ///
    /// A missing current-URL header reads as an empty URL, i.e. a listing page.
    pub fn capture(&self, event: &ConfigRequestEvent) -> Result<CartMutationRequest, ResolveError> {
        let target = event
            .header(&self.target_header)
            .ok_or_else(|| ResolveError::MissingHeader {
                header: self.target_header.to_string(),
            })?;
        let current_url = event.header(&self.current_url_header).unwrap_or_default();
        Ok(CartMutationRequest::new(event.path(), target, current_url))
    }

    /// Decides what to do with `event` without modifying anything.
    pub fn decide<D>(&self, event: &ConfigRequestEvent, dom: &D) -> RewriteDecision
    where
        D: Document + ?Sized,
    {
        let Some(route) = self.route_for(event.path()) else {
            return RewriteDecision::Passthrough;
        };
        let span = debug_span!("interceptor.resolving", path = event.path(), kind = %route.kind());
        let _entered = span.enter();

        let resolved = self.capture(event).and_then(|request| {
            let context = request.context(&self.cart_view_segment);
            self.resolver
                .resolve(context, request.target_element_id(), dom)
        });
        let target = match resolved {
            Ok(target) => target,
            Err(error) => return RewriteDecision::Failed(error),
        };

        let key = MutationKey::new(target, route.kind());
        if self.in_flight == InFlightPolicy::Reject && self.pending.is_pending(&key) {
            return RewriteDecision::Duplicate(key);
        }
        RewriteDecision::Rewrite {
            path: rewrite(event.path(), target),
            key,
        }
    }

    /// Decides on `event` and applies the decision.
    ///
    /// - `Rewrite`: sets the path, records the mutation as in flight, updates
    ///   the counter and attaches a [`MutationTicket`] to the event
    /// - `Duplicate`: cancels the event
    /// - `Failed`: logs the error and leaves event and page untouched
    pub fn handle<D>(&self, event: &mut ConfigRequestEvent, dom: &mut D) -> RewriteDecision
    where
        D: Document + ?Sized,
    {
        let decision = self.decide(event, &*dom);
        match &decision {
            RewriteDecision::Passthrough => {}
            RewriteDecision::Failed(error) => {
                warn!(
                    path = event.path(),
                    kind = error.kind(),
                    %error,
                    "cart mutation target not resolved, request left unmodified"
                );
                #[cfg(feature = "metrics")]
                metrics::counter!(*crate::metrics::RESOLVE_FAILURES_COUNTER, "kind" => error.kind())
                    .increment(1);
            }
            RewriteDecision::Duplicate(key) => {
                self.cancel_duplicate(event, key);
            }
            RewriteDecision::Rewrite { path, key } => {
                let Some(sequence) = self.pending.begin(*key, self.in_flight) else {
                    self.cancel_duplicate(event, key);
                    return RewriteDecision::Duplicate(*key);
                };
                event.set_path(path.as_str());
                let delta = match self.counter.apply(key.kind(), dom) {
                    Ok(delta) => Some(delta),
                    Err(error) => {
                        warn!(%key, %error, "optimistic cart counter update skipped");
                        None
                    }
                };
                event.set_ticket(MutationTicket::new(*key, sequence, delta));
                debug!(%key, path = path.as_str(), "cart mutation rewritten");
                #[cfg(feature = "metrics")]
                metrics::counter!(*crate::metrics::REWRITES_COUNTER, "kind" => key.kind().as_str())
                    .increment(1);
            }
        }
        decision
    }

    fn cancel_duplicate(&self, event: &mut ConfigRequestEvent, key: &MutationKey) {
        warn!(%key, "identical cart mutation in flight, request cancelled");
        event.cancel();
        #[cfg(feature = "metrics")]
        metrics::counter!(*crate::metrics::DUPLICATES_COUNTER, "kind" => key.kind().as_str())
            .increment(1);
    }

    /// Mutations rewritten and not yet settled.
    pub fn pending(&self) -> &PendingMutations {
        &self.pending
    }

    /// The optimistic counter.
    pub fn counter(&self) -> &OptimisticCounter {
        &self.counter
    }

    /// Cart routes, in matching order.
    pub fn routes(&self) -> &[MutationRoute] {
        &self.routes
    }

    /// Handling of duplicate in-flight mutations.
    pub fn in_flight_policy(&self) -> InFlightPolicy {
        self.in_flight
    }
}

impl Default for Interceptor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("routes", &self.routes)
            .field("target_header", &self.target_header)
            .field("current_url_header", &self.current_url_header)
            .field("cart_view_segment", &self.cart_view_segment)
            .field("resolver", &self.resolver)
            .field("counter", &self.counter)
            .field("pending", &self.pending.len())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

/// Builder for [`Interceptor`].
///
/// Every setting has a default matching the storefront's markup: routes
/// `/cart/add` and `/cart/remove`, headers `HX-Target` and `HX-Current-URL`,
/// cart page segment `/cart`, counter element `cart-counter`, a single
/// `price` attribute group resolved through [`PriceLinkLookup`], and
/// [`InFlightPolicy::Reject`].
pub struct InterceptorBuilder {
    routes: Vec<MutationRoute>,
    target_header: HeaderName,
    current_url_header: HeaderName,
    cart_view_segment: String,
    counter_element: String,
    attributes: Vec<SmolStr>,
    lookup: BoxLookup,
    in_flight: InFlightPolicy,
}

impl InterceptorBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            routes: vec![MutationRoute::add(), MutationRoute::remove()],
            target_header: HeaderName::from_static(DEFAULT_TARGET_HEADER),
            current_url_header: HeaderName::from_static(DEFAULT_CURRENT_URL_HEADER),
            cart_view_segment: DEFAULT_CART_VIEW_SEGMENT.to_string(),
            counter_element: DEFAULT_COUNTER_ELEMENT.to_string(),
            attributes: vec![SmolStr::new_static(DEFAULT_ATTRIBUTE)],
            lookup: Box::new(PriceLinkLookup::default()),
            in_flight: InFlightPolicy::default(),
        }
    }

    /// Replaces the cart routes.
    pub fn routes(self, routes: impl IntoIterator<Item = MutationRoute>) -> Self {
        InterceptorBuilder {
            routes: routes.into_iter().collect(),
            ..self
        }
    }

    /// Header carrying the triggering element id.
    pub fn target_header(self, header: HeaderName) -> Self {
        InterceptorBuilder {
            target_header: header,
            ..self
        }
    }

    /// Header carrying the current page URL.
    pub fn current_url_header(self, header: HeaderName) -> Self {
        InterceptorBuilder {
            current_url_header: header,
            ..self
        }
    }

    /// Path segment whose presence in the page URL marks the cart page.
    ///
    /// Every URL contains the empty string, so an empty segment is ignored
    /// and the previous one kept.
    pub fn cart_view_segment(self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        if segment.is_empty() {
            return self;
        }
        InterceptorBuilder {
            cart_view_segment: segment,
            ..self
        }
    }

    /// Id of the cart item counter element.
    pub fn counter_element(self, element: impl Into<String>) -> Self {
        InterceptorBuilder {
            counter_element: element.into(),
            ..self
        }
    }

    /// Attribute groups that need exactly one selected control on listing pages.
    pub fn attributes<I>(self, attributes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SmolStr>,
    {
        InterceptorBuilder {
            attributes: attributes.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Lookup mapping a selection to a configuration id.
    pub fn lookup<L>(self, lookup: L) -> Self
    where
        L: ConfigurationLookup + Send + Sync + 'static,
    {
        InterceptorBuilder {
            lookup: Box::new(lookup),
            ..self
        }
    }

    /// Handling of duplicate in-flight mutations.
    pub fn in_flight(self, policy: InFlightPolicy) -> Self {
        InterceptorBuilder {
            in_flight: policy,
            ..self
        }
    }

    /// Builds the interceptor.
    pub fn build(self) -> Interceptor {
        Interceptor {
            routes: self.routes,
            target_header: self.target_header,
            current_url_header: self.current_url_header,
            cart_view_segment: self.cart_view_segment,
            resolver: TargetResolver::new(self.attributes, self.lookup),
            counter: OptimisticCounter::new(self.counter_element),
            pending: PendingMutations::new(),
            in_flight: self.in_flight,
        }
    }
}

impl Default for InterceptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cartbox_core::{ConfigurationControl, MemoryDocument, ResolvedTarget};
    use http::{HeaderMap, HeaderValue};

    use super::*;

    fn event(path: &str, target: &'static str, current_url: &'static str) -> ConfigRequestEvent {
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_TARGET_HEADER, HeaderValue::from_static(target));
        headers.insert(DEFAULT_CURRENT_URL_HEADER, HeaderValue::from_static(current_url));
        ConfigRequestEvent::new(path, headers)
    }

    fn listing_page() -> MemoryDocument {
        MemoryDocument::new()
            .with_control(
                42,
                ConfigurationControl::new("price", "/products/42/prices/7").selected(),
            )
            .with_control(42, ConfigurationControl::new("price", "/products/42/prices/8"))
            .with_element(DEFAULT_COUNTER_ELEMENT, "2")
    }

    #[test]
    fn test_route_matching() {
        let add = MutationRoute::add();
        assert!(add.matches("/cart/add"));
        assert!(add.matches("/cart/add/"));
        assert!(add.matches("/cart/add?ref=banner"));
        assert!(add.matches("https://shop.test/shop/cart/add"));
        assert!(!add.matches("/cart/address"));
        assert!(!add.matches("/cart/add/items"));
        assert!(!add.matches("/cart"));
        assert_eq!(MutationRoute::new("cart/add/", MutationKind::Add), add);
    }

    #[test]
    fn test_decide_is_pure() {
        let interceptor = Interceptor::default();
        let page = listing_page();
        let event = event("/cart/add", "product42counter", "https://shop.test/");

        let decision = interceptor.decide(&event, &page);
        assert_eq!(
            decision,
            RewriteDecision::Rewrite {
                path: "/cart/add?configuration_id=7&product_id=42".to_string(),
                key: MutationKey::new(ResolvedTarget::new(42, 7), MutationKind::Add),
            }
        );
        assert_eq!(event.path(), "/cart/add");
        assert!(interceptor.pending().is_empty());
        assert_eq!(page.text_content(DEFAULT_COUNTER_ELEMENT).as_deref(), Some("2"));
    }

    #[test]
    fn test_non_cart_paths_pass_through() {
        let interceptor = Interceptor::default();
        let mut page = listing_page();
        let mut event = event("/products?page=2", "product42counter", "https://shop.test/");

        assert_eq!(interceptor.handle(&mut event, &mut page), RewriteDecision::Passthrough);
        assert_eq!(event.path(), "/products?page=2");
        assert!(event.ticket().is_none());
    }

    #[test]
    fn test_missing_target_header() {
        let interceptor = Interceptor::default();
        let mut page = listing_page();
        let mut event = ConfigRequestEvent::new("/cart/add", HeaderMap::new());

        let decision = interceptor.handle(&mut event, &mut page);
        assert_eq!(
            decision,
            RewriteDecision::Failed(ResolveError::MissingHeader {
                header: DEFAULT_TARGET_HEADER.to_string(),
            })
        );
        assert_eq!(event.path(), "/cart/add");
        assert_eq!(page.text_content(DEFAULT_COUNTER_ELEMENT).as_deref(), Some("2"));
    }

    #[test]
    fn test_missing_current_url_reads_as_listing() {
        let interceptor = Interceptor::default();
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_TARGET_HEADER, HeaderValue::from_static("product42counter"));
        let event = ConfigRequestEvent::new("/cart/add", headers);

        assert!(interceptor.decide(&event, &listing_page()).is_rewrite());
    }

    #[test]
    fn test_duplicate_is_cancelled_until_settled() {
        let interceptor = Interceptor::default();
        let mut page = listing_page();

        let mut first = event("/cart/add", "product42counter", "https://shop.test/");
        let decision = interceptor.handle(&mut first, &mut page);
        let key = decision.key().unwrap();
        let ticket = first.take_ticket().unwrap();

        let mut second = event("/cart/add", "product42counter", "https://shop.test/");
        assert_eq!(
            interceptor.handle(&mut second, &mut page),
            RewriteDecision::Duplicate(key)
        );
        assert!(second.is_cancelled());
        assert_eq!(second.path(), "/cart/add");
        assert_eq!(page.text_content(DEFAULT_COUNTER_ELEMENT).as_deref(), Some("3"));

        assert!(interceptor.pending().finish(&key, ticket.sequence()));
        let mut third = event("/cart/add", "product42counter", "https://shop.test/");
        assert!(interceptor.handle(&mut third, &mut page).is_rewrite());
        assert_eq!(page.text_content(DEFAULT_COUNTER_ELEMENT).as_deref(), Some("4"));
    }

    #[test]
    fn test_allow_policy_lets_duplicates_through() {
        let interceptor = Interceptor::builder()
            .in_flight(InFlightPolicy::Allow)
            .build();
        let mut page = listing_page();

        for _ in 0..2 {
            let mut event = event("/cart/add", "product42counter", "https://shop.test/");
            assert!(interceptor.handle(&mut event, &mut page).is_rewrite());
            assert!(!event.is_cancelled());
        }
        assert_eq!(page.text_content(DEFAULT_COUNTER_ELEMENT).as_deref(), Some("4"));
    }

    #[test]
    fn test_missing_counter_still_rewrites() {
        let interceptor = Interceptor::default();
        let mut page = MemoryDocument::new();
        let mut event = event("/cart/remove", "product42counter7", "https://shop.test/cart");

        assert!(interceptor.handle(&mut event, &mut page).is_rewrite());
        assert_eq!(event.path(), "/cart/remove?configuration_id=7&product_id=42");
        let ticket = event.ticket().unwrap();
        assert_eq!(ticket.delta(), None);
    }

    #[test]
    fn test_empty_cart_view_segment_keeps_default() {
        let interceptor = Interceptor::builder().cart_view_segment("").build();
        let mut page = listing_page();
        let mut event = event("/cart/add", "product42counter", "https://shop.test/laptops");

        assert!(interceptor.handle(&mut event, &mut page).is_rewrite());
        assert_eq!(event.path(), "/cart/add?configuration_id=7&product_id=42");

        let basket = Interceptor::builder()
            .cart_view_segment("/basket")
            .cart_view_segment("")
            .build();
        let mut line = self::event("/cart/remove", "product42counter9", "https://shop.test/basket");
        assert!(basket.handle(&mut line, &mut page).is_rewrite());
        assert_eq!(line.path(), "/cart/remove?configuration_id=9&product_id=42");
    }

    #[test]
    fn test_custom_headers_and_routes() {
        let interceptor = Interceptor::builder()
            .routes([MutationRoute::new("/basket/put", MutationKind::Add)])
            .target_header(HeaderName::from_static("x-trigger"))
            .current_url_header(HeaderName::from_static("x-page"))
            .cart_view_segment("/basket")
            .counter_element("basket-size")
            .build();
        let mut page = MemoryDocument::new().with_element("basket-size", "0");

        let mut headers = HeaderMap::new();
        headers.insert("x-trigger", HeaderValue::from_static("product5counter11"));
        headers.insert("x-page", HeaderValue::from_static("https://shop.test/basket"));
        let mut event = ConfigRequestEvent::new("/basket/put", headers);

        assert!(interceptor.handle(&mut event, &mut page).is_rewrite());
        assert_eq!(event.path(), "/basket/put?configuration_id=11&product_id=5");
        assert_eq!(page.text_content("basket-size").as_deref(), Some("1"));

        let mut ignored = ConfigRequestEvent::new("/cart/add", HeaderMap::new());
        assert_eq!(
            interceptor.handle(&mut ignored, &mut page),
            RewriteDecision::Passthrough
        );
    }
}
