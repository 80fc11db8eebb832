use thiserror::Error;

/// Errors turning a configuration into an interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A configured header name is not a valid HTTP header name.
    #[error("invalid header name `{name}` for {field}")]
    InvalidHeader {
        /// Configuration field holding the header.
        field: &'static str,
        /// The rejected value.
        name: String,
    },

    /// A route has an empty path.
    #[error("route #{index} has an empty path")]
    EmptyRoute {
        /// Position of the route in the list.
        index: usize,
    },

    /// No route is configured, so nothing would ever be intercepted.
    #[error("at least one cart route is required")]
    NoRoutes,

    /// A required text setting is empty.
    #[error("`{0}` must not be empty")]
    Empty(&'static str),

    /// No configuration attribute group is configured.
    #[error("at least one configuration attribute is required")]
    NoAttributes,
}
