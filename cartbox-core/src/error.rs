//! Error types for target resolution.

use smol_str::SmolStr;
use thiserror::Error;

use crate::lookup::Selection;
use crate::target::ProductId;

/// Reason a cart mutation target could not be resolved.
///
/// Every variant is recoverable: the interceptor skips the rewrite, leaves
/// the request unmodified and reports the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The triggering element id does not follow the expected pattern.
    #[error("target element id `{id}` does not match `{expected}`")]
    MalformedTarget {
        /// The element id as received.
        id: String,
        /// Human readable form of the expected pattern.
        expected: &'static str,
    },

    /// An attribute group has zero or several selected controls.
    #[error(
        "product {product}: expected exactly one selected `{attribute}` control, found {found}"
    )]
    NoSelection {
        /// Product whose controls were inspected.
        product: ProductId,
        /// Attribute group that failed.
        attribute: SmolStr,
        /// Number of selected controls found in the group.
        found: usize,
    },

    /// The selected values do not map to a known configuration.
    #[error("product {product}: no configuration is mapped to {selection}")]
    ConfigurationLookup {
        /// Product whose controls were inspected.
        product: ProductId,
        /// The selection that failed to map.
        selection: Selection,
    },

    /// A header the resolver needs is absent or not valid UTF-8.
    #[error("request carries no usable `{header}` header")]
    MissingHeader {
        /// Header name.
        header: String,
    },
}

impl ResolveError {
    /// Short, stable name of the variant, used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::MalformedTarget { .. } => "malformed_target",
            ResolveError::NoSelection { .. } => "no_selection",
            ResolveError::ConfigurationLookup { .. } => "configuration_lookup",
            ResolveError::MissingHeader { .. } => "missing_header",
        }
    }
}
