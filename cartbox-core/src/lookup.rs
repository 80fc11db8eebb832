//! Mapping selected configuration controls to a configuration identifier.
//!
//! On a listing page the resolver collects one selected control per
//! attribute group into a [`Selection`] and asks a [`ConfigurationLookup`]
//! which configuration it denotes.
//!
//! Two strategies are provided:
//!
//! - [`PriceLinkLookup`] reads the identifier out of the controls' links
//!   (`/products/42/prices/7` denotes configuration `7`)
//! - [`TableLookup`] maps attribute values through an explicit table
//!   (`ram=16, storage=512` denotes configuration `9`)

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::target::{ConfigurationId, ProductId};

/// Selected value per attribute group, ordered by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<SmolStr, String>);

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `attribute`, returning the previous value.
    pub fn insert(
        &mut self,
        attribute: impl Into<SmolStr>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.0.insert(attribute.into(), value.into())
    }

    /// Value selected for `attribute`.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    /// Iterates over `(attribute, value)` pairs in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(attribute, value)| (attribute.as_str(), value.as_str()))
    }

    /// Iterates over the selected values in attribute order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    /// Number of attribute groups in the selection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the selection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<A, V> FromIterator<(A, V)> for Selection
where
    A: Into<SmolStr>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (A, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(attribute, value)| (attribute.into(), value.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (attribute, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{attribute}={value}")?;
        }
        f.write_str("}")
    }
}

/// Maps a product's selection to its canonical configuration identifier.
///
/// # Blanket Implementations
///
/// This trait is implemented for:
/// - `&T` where `T: ConfigurationLookup`
/// - `Box<T>` where `T: ConfigurationLookup`
/// - `Arc<T>` where `T: ConfigurationLookup`
pub trait ConfigurationLookup {
    /// Returns the configuration denoted by `selection`, or `None` if it has
    /// no mapping.
    fn lookup(&self, product: ProductId, selection: &Selection) -> Option<ConfigurationId>;
}

/// Boxed lookup for dynamic dispatch.
pub type BoxLookup = Box<dyn ConfigurationLookup + Send + Sync>;

impl<T> ConfigurationLookup for &T
where
    T: ConfigurationLookup + ?Sized,
{
    fn lookup(&self, product: ProductId, selection: &Selection) -> Option<ConfigurationId> {
        (**self).lookup(product, selection)
    }
}

impl<T> ConfigurationLookup for Box<T>
where
    T: ConfigurationLookup + ?Sized,
{
    fn lookup(&self, product: ProductId, selection: &Selection) -> Option<ConfigurationId> {
        self.as_ref().lookup(product, selection)
    }
}

impl<T> ConfigurationLookup for Arc<T>
where
    T: ConfigurationLookup + ?Sized,
{
    fn lookup(&self, product: ProductId, selection: &Selection) -> Option<ConfigurationId> {
        self.as_ref().lookup(product, selection)
    }
}

/// Default link segment preceding the configuration id.
pub const DEFAULT_PRICE_SEGMENT: &str = "prices";

/// Reads the configuration id from the selected controls' links.
///
/// A link denotes configuration `N` when it ends in `/<segment>/N`; query
/// string, fragment and a trailing slash are ignored. When several attribute
/// groups are selected they must all denote the same configuration.
///
/// ```
/// use cartbox_core::{ConfigurationId, ConfigurationLookup, PriceLinkLookup, ProductId, Selection};
///
/// let lookup = PriceLinkLookup::default();
/// let selection = Selection::from_iter([("price", "/products/42/prices/7")]);
/// assert_eq!(lookup.lookup(ProductId::new(42), &selection), Some(ConfigurationId::new(7)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLinkLookup {
    segment: SmolStr,
}

impl PriceLinkLookup {
    /// Creates a lookup reading ids that follow `/<segment>/`.
    pub fn new(segment: impl Into<SmolStr>) -> Self {
        Self {
            segment: segment.into(),
        }
    }

    /// Segment preceding the configuration id.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Parses the configuration id out of a single link.
    pub fn parse_link(&self, link: &str) -> Option<ConfigurationId> {
        let path = link.split(['?', '#']).next().unwrap_or_default();
        let mut segments = path.trim_end_matches('/').rsplit('/');
        let id = segments.next()?.parse::<u64>().ok()?;
        (segments.next()? == self.segment).then_some(ConfigurationId::new(id))
    }
}

impl Default for PriceLinkLookup {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_SEGMENT)
    }
}

impl ConfigurationLookup for PriceLinkLookup {
    fn lookup(&self, _product: ProductId, selection: &Selection) -> Option<ConfigurationId> {
        let mut ids = selection.values().map(|link| self.parse_link(link));
        let first = ids.next()??;
        ids.all(|id| id == Some(first)).then_some(first)
    }
}

/// Explicit table from attribute values to configuration ids.
///
/// Entries scoped to a product take precedence over product-agnostic ones.
///
/// ```
/// use cartbox_core::{ConfigurationId, ConfigurationLookup, ProductId, Selection, TableLookup};
///
/// let table = TableLookup::new()
///     .with_entry(Selection::from_iter([("ram", "16"), ("storage", "512")]), 9)
///     .with_product_entry(3, Selection::from_iter([("ram", "16"), ("storage", "512")]), 31);
///
/// let selection = Selection::from_iter([("storage", "512"), ("ram", "16")]);
/// assert_eq!(table.lookup(ProductId::new(1), &selection), Some(ConfigurationId::new(9)));
/// assert_eq!(table.lookup(ProductId::new(3), &selection), Some(ConfigurationId::new(31)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableLookup {
    entries: HashMap<(Option<ProductId>, Selection), ConfigurationId>,
}

impl TableLookup {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product-agnostic entry.
    pub fn with_entry(
        mut self,
        selection: Selection,
        configuration: impl Into<ConfigurationId>,
    ) -> Self {
        self.insert(None, selection, configuration);
        self
    }

    /// Adds an entry that only applies to `product`.
    pub fn with_product_entry(
        mut self,
        product: impl Into<ProductId>,
        selection: Selection,
        configuration: impl Into<ConfigurationId>,
    ) -> Self {
        self.insert(Some(product.into()), selection, configuration);
        self
    }

    /// Inserts an entry, returning the configuration it replaced.
    pub fn insert(
        &mut self,
        product: Option<ProductId>,
        selection: Selection,
        configuration: impl Into<ConfigurationId>,
    ) -> Option<ConfigurationId> {
        self.entries.insert((product, selection), configuration.into())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigurationLookup for TableLookup {
    fn lookup(&self, product: ProductId, selection: &Selection) -> Option<ConfigurationId> {
        // The key owns its selection, so each lookup clones it once.
        let mut key = (Some(product), selection.clone());
        if let Some(configuration) = self.entries.get(&key) {
            return Some(*configuration);
        }
        key.0 = None;
        self.entries.get(&key).copied()
    }
}
