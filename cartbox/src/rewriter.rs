//! Appending resolved identifiers to the outgoing request path.

use cartbox_core::ResolvedTarget;

/// Query parameter carrying the configuration id.
pub const CONFIGURATION_PARAM: &str = "configuration_id";
/// Query parameter carrying the product id.
pub const PRODUCT_PARAM: &str = "product_id";

/// Returns `path` with `configuration_id` and `product_id` query parameters.
///
/// An existing query string is extended, not replaced: its pairs are kept in
/// order, except earlier `configuration_id` / `product_id` pairs which are
/// dropped so the server receives exactly one value for each. A fragment
/// stays at the end.
///
/// ```
/// use cartbox::rewrite;
/// use cartbox_core::ResolvedTarget;
///
/// assert_eq!(
///     rewrite("/cart/add", ResolvedTarget::new(42, 7)),
///     "/cart/add?configuration_id=7&product_id=42"
/// );
/// assert_eq!(
///     rewrite("/cart/add?ref=banner", ResolvedTarget::new(3, 9)),
///     "/cart/add?ref=banner&configuration_id=9&product_id=3"
/// );
/// ```
pub fn rewrite(path: &str, target: ResolvedTarget) -> String {
    let (path, fragment) = match path.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (path, None),
    };
    let (base, query) = path.split_once('?').unwrap_or((path, ""));

    let mut rewritten = String::with_capacity(path.len() + 48);
    rewritten.push_str(base);
    rewritten.push('?');
    for pair in query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_resolved_param(pair))
    {
        rewritten.push_str(pair);
        rewritten.push('&');
    }
    rewritten.push_str(&format!(
        "{CONFIGURATION_PARAM}={}&{PRODUCT_PARAM}={}",
        target.configuration, target.product
    ));
    if let Some(fragment) = fragment {
        rewritten.push('#');
        rewritten.push_str(fragment);
    }
    rewritten
}

fn is_resolved_param(pair: &str) -> bool {
    let name = pair.split_once('=').map_or(pair, |(name, _)| name);
    name == CONFIGURATION_PARAM || name == PRODUCT_PARAM
}
