use cartbox_core::{
    BoxLookup, ConfigurationId, PriceLinkLookup, ProductId, Selection, TableLookup,
    lookup::DEFAULT_PRICE_SEGMENT,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_segment() -> String {
    DEFAULT_PRICE_SEGMENT.to_string()
}

/// How selected configuration controls map to a configuration id.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Lookup {
    /// The id is the last segment of the selected control's link.
    PriceLink {
        /// Segment preceding the id (`prices` in `/products/42/prices/7`).
        #[serde(default = "default_segment")]
        segment: String,
    },
    /// Explicit table of selections.
    Table {
        #[serde(default)]
        entries: Vec<TableEntry>,
    },
}

impl Default for Lookup {
    fn default() -> Self {
        Lookup::PriceLink {
            segment: default_segment(),
        }
    }
}

/// One row of a [`Lookup::Table`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TableEntry {
    /// Restricts the entry to one product; global when absent.
    #[serde(default)]
    pub product: Option<ProductId>,
    /// Attribute name to selected control link.
    pub selection: Selection,
    pub configuration: ConfigurationId,
}

impl Lookup {
    pub fn into_lookup(self) -> Result<BoxLookup, ConfigError> {
        match self {
            Lookup::PriceLink { segment } if segment.is_empty() => {
                Err(ConfigError::Empty("lookup.segment"))
            }
            Lookup::PriceLink { segment } => Ok(Box::new(PriceLinkLookup::new(segment))),
            Lookup::Table { entries } => {
                let mut table = TableLookup::new();
                for entry in entries {
                    table.insert(entry.product, entry.selection, entry.configuration);
                }
                Ok(Box::new(table))
            }
        }
    }
}
