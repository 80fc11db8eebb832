#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Optimistic cart item counter.
///
/// [`OptimisticCounter`] bumps the displayed count by one step per mutation
/// and records a [`CounterDelta`] so a failed request can be reverted.
pub mod counter;

/// The pre-send configuration event and the ticket attached to it.
pub mod event;

/// Cart mutation interception: route matching, decision and application.
pub mod interceptor;

/// Metrics collection.
///
/// Counters for rewrites, resolution failures, cancelled duplicates and
/// reverted counter updates.
#[cfg(feature = "metrics")]
#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
pub mod metrics;

/// In-flight tracking of rewritten mutations.
pub mod pending;

/// Event sources and idempotent listener registration.
pub mod registry;

/// Resolution of a triggering element to a product and configuration.
pub mod resolver;

/// Request path rewriting.
pub mod rewriter;

/// Page-level wiring of the interceptor.
pub mod storefront;

pub use cartbox_core::{
    CartMutationRequest, ConfigurationControl, ConfigurationId, ConfigurationLookup, Document,
    MemoryDocument, MutationKey, MutationKind, PageContext, PriceLinkLookup, ProductId,
    ResolveError, ResolvedTarget, Selection, TableLookup,
};
pub use counter::{CounterDelta, CounterError, OptimisticCounter};
pub use event::{CONFIG_REQUEST_EVENT, ConfigRequestEvent, MutationTicket};
pub use interceptor::{Interceptor, InterceptorBuilder, MutationRoute, RewriteDecision};
pub use pending::{InFlightPolicy, PendingMutations};
pub use registry::{EventBus, EventSource, Listener, ListenerId, ListenerRegistry};
pub use resolver::TargetResolver;
pub use rewriter::rewrite;
pub use storefront::{Settlement, SharedDocument, Storefront};
