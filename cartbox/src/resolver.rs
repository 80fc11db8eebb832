//! Resolution of `(product, configuration)` for a pending cart mutation.

use cartbox_core::{
    BoxLookup, ConfigurationId, ConfigurationLookup, Document, PageContext, ProductId,
    ResolveError, ResolvedTarget, Selection,
};
use lazy_static::lazy_static;
use regex::Regex;
use smol_str::SmolStr;

const PRODUCT_PATTERN: &str = "product<id>counter";
const CART_LINE_PATTERN: &str = "product<id>counter<configuration id>";

lazy_static! {
    static ref TARGET_ID: Regex =
        Regex::new(r"product(\d+)counter(\d+)?").expect("target id pattern is a valid regex");
}

/// Derives the target of a cart mutation from the triggering element id and
/// the page.
///
/// The product id always comes from the element id. The configuration id
/// depends on the [`PageContext`]:
///
/// - **listing**: one selected control per configured attribute group is
///   collected into a [`Selection`] and mapped through the lookup
/// - **cart view**: it is the numeric suffix of the element id
///
/// # Example
///
/// ```
/// use cartbox::TargetResolver;
/// use cartbox_core::{
///     ConfigurationControl, MemoryDocument, PageContext, PriceLinkLookup, ResolvedTarget,
/// };
///
/// let resolver = TargetResolver::new(["price"], PriceLinkLookup::default());
/// let page = MemoryDocument::new()
///     .with_control(42, ConfigurationControl::new("price", "/products/42/prices/7").selected());
///
/// let target = resolver.resolve(PageContext::ProductListing, "product42counter", &page);
/// assert_eq!(target, Ok(ResolvedTarget::new(42, 7)));
///
/// let target = resolver.resolve(PageContext::CartView, "product42counter7", &page);
/// assert_eq!(target, Ok(ResolvedTarget::new(42, 7)));
/// ```
pub struct TargetResolver<L = BoxLookup> {
    attributes: Vec<SmolStr>,
    lookup: L,
}

impl<L> TargetResolver<L> {
    /// Creates a resolver expecting one selection per attribute group.
    pub fn new<I>(attributes: I, lookup: L) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SmolStr>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
            lookup,
        }
    }

    /// Attribute groups inspected on listing pages.
    pub fn attributes(&self) -> &[SmolStr] {
        &self.attributes
    }
}

impl<L> TargetResolver<L>
where
    L: ConfigurationLookup,
{
    /// Resolves the target of a mutation triggered by `target_element_id`.
    pub fn resolve<D>(
        &self,
        context: PageContext,
        target_element_id: &str,
        dom: &D,
    ) -> Result<ResolvedTarget, ResolveError>
    where
        D: Document + ?Sized,
    {
        let (product, line) = parse_target(target_element_id)?;
        let configuration = match context {
            PageContext::ProductListing => self.selected_configuration(product, dom)?,
            PageContext::CartView => {
                line.ok_or_else(|| malformed(target_element_id, CART_LINE_PATTERN))?
            }
        };
        Ok(ResolvedTarget {
            product,
            configuration,
        })
    }

    fn selected_configuration<D>(
        &self,
        product: ProductId,
        dom: &D,
    ) -> Result<ConfigurationId, ResolveError>
    where
        D: Document + ?Sized,
    {
        let controls = dom.configuration_controls(product);
        let mut selection = Selection::new();

        for attribute in &self.attributes {
            let mut selected = controls.iter().filter(|control| {
                control.is_selected() && control.attribute() == attribute.as_str()
            });
            match (selected.next(), selected.count()) {
                (Some(control), 0) => {
                    selection.insert(attribute.clone(), control.link());
                }
                (first, rest) => {
                    return Err(ResolveError::NoSelection {
                        product,
                        attribute: attribute.clone(),
                        found: usize::from(first.is_some()) + rest,
                    });
                }
            }
        }

        self.lookup
            .lookup(product, &selection)
            .ok_or(ResolveError::ConfigurationLookup { product, selection })
    }
}

/// Extracts the product id from a `product<id>counter...` element id.
pub fn product_id(target_element_id: &str) -> Result<ProductId, ResolveError> {
    parse_target(target_element_id).map(|(product, _)| product)
}

/// Extracts the configuration id from a `product<id>counter<configuration id>`
/// cart line element id.
pub fn cart_line_configuration_id(
    target_element_id: &str,
) -> Result<ConfigurationId, ResolveError> {
    parse_target(target_element_id)?
        .1
        .ok_or_else(|| malformed(target_element_id, CART_LINE_PATTERN))
}

/// Both ids come from the first occurrence of the pattern, so a suffix is
/// never paired with the product of an earlier occurrence.
fn parse_target(
    target_element_id: &str,
) -> Result<(ProductId, Option<ConfigurationId>), ResolveError> {
    let captures = TARGET_ID
        .captures(target_element_id)
        .ok_or_else(|| malformed(target_element_id, PRODUCT_PATTERN))?;
    let product = captures
        .get(1)
        .and_then(|id| id.as_str().parse().ok())
        .map(ProductId::new)
        .ok_or_else(|| malformed(target_element_id, PRODUCT_PATTERN))?;
    let line = captures
        .get(2)
        .and_then(|id| id.as_str().parse().ok())
        .map(ConfigurationId::new);
    Ok((product, line))
}

fn malformed(target_element_id: &str, expected: &'static str) -> ResolveError {
    ResolveError::MalformedTarget {
        id: target_element_id.to_string(),
        expected,
    }
}

impl<L> std::fmt::Debug for TargetResolver<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetResolver")
            .field("attributes", &self.attributes)
            .field("lookup", &"...")
            .finish()
    }
}
