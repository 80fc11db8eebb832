//! YAML configuration for the cartbox interceptor.
//!
//! ```
//! use cartbox_configuration::ConfigInterceptor;
//!
//! let config = ConfigInterceptor::from_yaml(
//!     r#"
//! cart_view_segment: /basket
//! routes:
//!   - path: /basket/add
//!     kind: add
//! "#,
//! )
//! .unwrap();
//! let interceptor = config.into_interceptor().unwrap();
//! assert_eq!(interceptor.routes().len(), 1);
//! ```

use cartbox::{
    InFlightPolicy, Interceptor, MutationRoute,
    interceptor::{
        DEFAULT_ATTRIBUTE, DEFAULT_CART_VIEW_SEGMENT, DEFAULT_CURRENT_URL_HEADER,
        DEFAULT_TARGET_HEADER,
    },
};
use cartbox::counter::DEFAULT_COUNTER_ELEMENT;
use cartbox_core::MutationKind;
use http::HeaderName;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod lookup;

pub use error::ConfigError;
pub use lookup::{Lookup, TableEntry};

/// Headers the interceptor reads from the configuration event.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Headers {
    #[serde(default = "Headers::default_target")]
    pub target: String,
    #[serde(default = "Headers::default_current_url")]
    pub current_url: String,
}

impl Headers {
    fn default_target() -> String {
        DEFAULT_TARGET_HEADER.to_string()
    }

    fn default_current_url() -> String {
        DEFAULT_CURRENT_URL_HEADER.to_string()
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self {
            target: Self::default_target(),
            current_url: Self::default_current_url(),
        }
    }
}

/// Mutation performed by a route.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Add,
    Remove,
}

impl From<Kind> for MutationKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Add => MutationKind::Add,
            Kind::Remove => MutationKind::Remove,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub kind: Kind,
}

/// Handling of a mutation identical to one still in flight.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum InFlight {
    /// Cancel the duplicate (default).
    #[default]
    Reject,
    /// Send it anyway.
    Allow,
}

impl From<InFlight> for InFlightPolicy {
    fn from(policy: InFlight) -> Self {
        match policy {
            InFlight::Reject => InFlightPolicy::Reject,
            InFlight::Allow => InFlightPolicy::Allow,
        }
    }
}

fn default_routes() -> Vec<Route> {
    vec![
        Route {
            path: "/cart/add".to_string(),
            kind: Kind::Add,
        },
        Route {
            path: "/cart/remove".to_string(),
            kind: Kind::Remove,
        },
    ]
}

fn default_cart_view_segment() -> String {
    DEFAULT_CART_VIEW_SEGMENT.to_string()
}

fn default_counter_element() -> String {
    DEFAULT_COUNTER_ELEMENT.to_string()
}

fn default_attributes() -> Vec<String> {
    vec![DEFAULT_ATTRIBUTE.to_string()]
}

/// Interceptor configuration. Every field is optional.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConfigInterceptor {
    #[serde(default)]
    pub headers: Headers,
    #[serde(default = "default_cart_view_segment")]
    pub cart_view_segment: String,
    #[serde(default = "default_counter_element")]
    pub counter_element: String,
    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
    /// Attribute groups needing one selected control on listing pages.
    #[serde(default = "default_attributes")]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub lookup: Lookup,
    #[serde(default)]
    pub in_flight: InFlight,
}

impl Default for ConfigInterceptor {
    fn default() -> Self {
        Self {
            headers: Headers::default(),
            cart_view_segment: default_cart_view_segment(),
            counter_element: default_counter_element(),
            routes: default_routes(),
            attributes: default_attributes(),
            lookup: Lookup::default(),
            in_flight: InFlight::default(),
        }
    }
}

fn header(field: &'static str, name: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeader {
        field,
        name: name.to_string(),
    })
}

impl ConfigInterceptor {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Validates the configuration and builds the interceptor.
    pub fn into_interceptor(self) -> Result<Interceptor, ConfigError> {
        let target_header = header("headers.target", &self.headers.target)?;
        let current_url_header = header("headers.current_url", &self.headers.current_url)?;

        if self.routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }
        let routes = self
            .routes
            .into_iter()
            .enumerate()
            .map(|(index, route)| {
                if route.path.trim_matches('/').is_empty() {
                    Err(ConfigError::EmptyRoute { index })
                } else {
                    Ok(MutationRoute::new(route.path, route.kind.into()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.cart_view_segment.is_empty() {
            return Err(ConfigError::Empty("cart_view_segment"));
        }
        if self.counter_element.is_empty() {
            return Err(ConfigError::Empty("counter_element"));
        }
        if self.attributes.is_empty() {
            return Err(ConfigError::NoAttributes);
        }
        if self.attributes.iter().any(String::is_empty) {
            return Err(ConfigError::Empty("attributes"));
        }
        let lookup = self.lookup.into_lookup()?;

        Ok(Interceptor::builder()
            .routes(routes)
            .target_header(target_header)
            .current_url_header(current_url_header)
            .cart_view_segment(self.cart_view_segment)
            .counter_element(self.counter_element)
            .attributes(self.attributes)
            .lookup(lookup)
            .in_flight(self.in_flight.into())
            .build())
    }
}
