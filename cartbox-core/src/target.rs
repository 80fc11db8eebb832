//! Identifiers and request types for cart mutations.
//!
//! A cart mutation is captured from the pre-send event as a
//! [`CartMutationRequest`], resolved into a [`ResolvedTarget`], and tracked
//! while in flight by its [`MutationKey`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Product identifier, as rendered in `product<id>counter` element ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Creates a product identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a priced product variant (e.g. one RAM/storage combination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationId(u64);

impl ConfigurationId {
    /// Creates a configuration identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ConfigurationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Product and configuration a cart mutation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedTarget {
    /// The product being added or removed.
    pub product: ProductId,
    /// The configuration of that product.
    pub configuration: ConfigurationId,
}

impl ResolvedTarget {
    /// Creates a resolved target.
    pub fn new(product: impl Into<ProductId>, configuration: impl Into<ConfigurationId>) -> Self {
        Self {
            product: product.into(),
            configuration: configuration.into(),
        }
    }
}

/// Direction of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Add one item to the cart.
    Add,
    /// Remove one item from the cart.
    Remove,
}

impl MutationKind {
    /// Lowercase name, as used in cart routes and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Add => "add",
            MutationKind::Remove => "remove",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page state a cart mutation originates from.
///
/// Decides which resolution strategy applies: on a listing page the cart line
/// does not exist yet and the configuration comes from the selected controls,
/// on the cart page the line's element id already encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageContext {
    /// A page where the cart line does not exist yet.
    ProductListing,
    /// The cart page, where each line encodes both identifiers.
    CartView,
}

impl PageContext {
    /// Classifies `current_url` by whether it contains `cart_segment`.
    ///
    /// ```
    /// use cartbox_core::PageContext;
    ///
    /// let cart = PageContext::from_url("https://shop.test/cart", "/cart");
    /// assert_eq!(cart, PageContext::CartView);
    ///
    /// let listing = PageContext::from_url("https://shop.test/", "/cart");
    /// assert_eq!(listing, PageContext::ProductListing);
    /// ```
    pub fn from_url(current_url: &str, cart_segment: &str) -> Self {
        if current_url.contains(cart_segment) {
            PageContext::CartView
        } else {
            PageContext::ProductListing
        }
    }
}

/// A cart mutation as read from the intercepted event.
///
/// Created once per user click and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartMutationRequest {
    path: String,
    target_element_id: String,
    current_url: String,
}

impl CartMutationRequest {
    /// Captures a cart mutation request.
    pub fn new(
        path: impl Into<String>,
        target_element_id: impl Into<String>,
        current_url: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            target_element_id: target_element_id.into(),
            current_url: current_url.into(),
        }
    }

    /// Outgoing request path, as it was before any rewrite.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Id of the DOM element that triggered the request.
    pub fn target_element_id(&self) -> &str {
        &self.target_element_id
    }

    /// URL of the page the request was sent from.
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Page context of this request, see [`PageContext::from_url`].
    pub fn context(&self, cart_segment: &str) -> PageContext {
        PageContext::from_url(&self.current_url, cart_segment)
    }
}

/// Identity of an in-flight cart mutation.
///
/// Two clicks with the same key before the first request settles are the
/// same user intent sent twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationKey {
    target: ResolvedTarget,
    kind: MutationKind,
}

impl MutationKey {
    /// Creates a key for `kind` applied to `target`.
    pub fn new(target: ResolvedTarget, kind: MutationKind) -> Self {
        Self { target, kind }
    }

    /// The resolved product and configuration.
    pub fn target(&self) -> ResolvedTarget {
        self.target
    }

    /// The mutation direction.
    pub fn kind(&self) -> MutationKind {
        self.kind
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.kind, self.target.product, self.target.configuration
        )
    }
}
