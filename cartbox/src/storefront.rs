//! Page-level wiring: one interceptor listening on one event bus.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartbox_core::Document;
use tracing::{debug, warn};

use crate::event::{CONFIG_REQUEST_EVENT, ConfigRequestEvent, MutationTicket};
use crate::interceptor::Interceptor;
use crate::registry::{EventBus, ListenerId, ListenerRegistry};

/// A page shared between the interceptor listener and the response side.
#[derive(Debug, Default)]
pub struct SharedDocument<D> {
    inner: Arc<Mutex<D>>,
}

impl<D> SharedDocument<D> {
    /// Wraps `document`.
    pub fn new(document: D) -> Self {
        Self {
            inner: Arc::new(Mutex::new(document)),
        }
    }

    /// Locks the page.
    ///
    /// A panic in another holder does not leave the page unusable; the
    /// guard is handed out regardless.
    pub fn lock(&self) -> MutexGuard<'_, D> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D> Clone for SharedDocument<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// How a rewritten cart mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The server accepted the mutation; the optimistic count stands.
    Confirmed,
    /// The request failed; the optimistic count is reverted.
    Failed,
}

/// A storefront page with the cart interceptor attached.
///
/// [`initialize`](Storefront::initialize) may be called any number of times;
/// the interceptor stays attached exactly once.
pub struct Storefront<D> {
    interceptor: Arc<Interceptor>,
    document: SharedDocument<D>,
    bus: EventBus<ConfigRequestEvent>,
    registry: ListenerRegistry,
}

impl<D> Storefront<D>
where
    D: Document + Send + 'static,
{
    /// Creates a page. No listener is attached until [`initialize`](Self::initialize).
    pub fn new(interceptor: Interceptor, document: D) -> Self {
        Self {
            interceptor: Arc::new(interceptor),
            document: SharedDocument::new(document),
            bus: EventBus::new(),
            registry: ListenerRegistry::new(CONFIG_REQUEST_EVENT),
        }
    }

    /// Attaches the interceptor to the configuration event, replacing the
    /// listener attached by any earlier call.
    pub fn initialize(&mut self) -> ListenerId {
        let interceptor = Arc::clone(&self.interceptor);
        let document = self.document.clone();
        self.registry.register_singleton(
            &mut self.bus,
            Arc::new(move |event: &mut ConfigRequestEvent| {
                let mut page = document.lock();
                interceptor.handle(event, &mut *page);
            }),
        )
    }

    /// Fires the configuration event for an outgoing request.
    ///
    /// Returns the number of listeners that saw it.
    pub fn dispatch(&self, event: &mut ConfigRequestEvent) -> usize {
        self.bus.dispatch(CONFIG_REQUEST_EVENT, event)
    }

    /// Reports the outcome of a rewritten mutation.
    ///
    /// The mutation stops being in flight. On [`Settlement::Failed`] the
    /// optimistic counter step is undone. A ticket whose mutation is no
    /// longer in flight changes nothing.
    pub fn settle(&self, ticket: MutationTicket, settlement: Settlement) {
        let key = ticket.key();
        let sequence = ticket.sequence();
        if !self.interceptor.pending().finish(&key, sequence) {
            debug!(%key, sequence, "settled cart mutation was not in flight, ignored");
            return;
        }
        match (settlement, ticket.delta()) {
            (Settlement::Confirmed, _) => {
                debug!(%key, sequence, "cart mutation confirmed");
            }
            (Settlement::Failed, None) => {
                debug!(%key, sequence, "cart mutation failed, no counter update to revert");
            }
            (Settlement::Failed, Some(delta)) => {
                let mut page = self.document.lock();
                match self.interceptor.counter().revert(delta, &mut *page) {
                    Ok(count) => {
                        debug!(%key, sequence, count, "cart mutation failed, counter reverted");
                        #[cfg(feature = "metrics")]
                        metrics::counter!(
                            *crate::metrics::REVERTS_COUNTER,
                            "kind" => key.kind().as_str()
                        )
                        .increment(1);
                    }
                    Err(error) => {
                        warn!(%key, %error, "cart mutation failed, counter not reverted");
                    }
                }
            }
        }
    }

    /// Number of listeners attached to the configuration event.
    pub fn listener_count(&self) -> usize {
        self.bus.listener_count(CONFIG_REQUEST_EVENT)
    }

    /// The interceptor.
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// The page.
    pub fn document(&self) -> &SharedDocument<D> {
        &self.document
    }

    /// The event bus, for attaching other listeners.
    pub fn bus_mut(&mut self) -> &mut EventBus<ConfigRequestEvent> {
        &mut self.bus
    }
}

impl<D> std::fmt::Debug for Storefront<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("interceptor", &self.interceptor)
            .field("bus", &self.bus)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use cartbox_core::{ConfigurationControl, MemoryDocument};
    use http::{HeaderMap, HeaderValue};

    use super::*;
    use crate::counter::DEFAULT_COUNTER_ELEMENT;

    fn add_event() -> ConfigRequestEvent {
        let mut headers = HeaderMap::new();
        headers.insert("hx-target", HeaderValue::from_static("product42counter"));
        headers.insert("hx-current-url", HeaderValue::from_static("https://shop.test/"));
        ConfigRequestEvent::new("/cart/add", headers)
    }

    fn storefront() -> Storefront<MemoryDocument> {
        let page = MemoryDocument::new()
            .with_control(
                42,
                ConfigurationControl::new("price", "/products/42/prices/7").selected(),
            )
            .with_element(DEFAULT_COUNTER_ELEMENT, "3");
        let mut storefront = Storefront::new(Interceptor::default(), page);
        storefront.initialize();
        storefront
    }

    fn counter(storefront: &Storefront<MemoryDocument>) -> Option<String> {
        storefront.document().lock().text_content(DEFAULT_COUNTER_ELEMENT)
    }

    fn replay(ticket: &MutationTicket) -> MutationTicket {
        MutationTicket::new(ticket.key(), ticket.sequence(), ticket.delta())
    }

    #[test]
    fn test_repeated_failure_reverts_once() {
        let storefront = storefront();
        let mut event = add_event();
        storefront.dispatch(&mut event);
        let ticket = event.take_ticket().unwrap();
        let again = replay(&ticket);
        assert_eq!(counter(&storefront).as_deref(), Some("4"));

        storefront.settle(ticket, Settlement::Failed);
        assert_eq!(counter(&storefront).as_deref(), Some("3"));
        storefront.settle(again, Settlement::Failed);
        assert_eq!(counter(&storefront).as_deref(), Some("3"));
    }

    #[test]
    fn test_stale_settlement_keeps_newer_mutation_guarded() {
        let storefront = storefront();
        let mut first = add_event();
        storefront.dispatch(&mut first);
        let ticket = first.take_ticket().unwrap();
        let stale = replay(&ticket);
        storefront.settle(ticket, Settlement::Confirmed);

        let mut fresh = add_event();
        storefront.dispatch(&mut fresh);
        let fresh = fresh.take_ticket().unwrap();
        assert_eq!(counter(&storefront).as_deref(), Some("5"));

        storefront.settle(stale, Settlement::Confirmed);
        let mut duplicate = add_event();
        storefront.dispatch(&mut duplicate);
        assert!(duplicate.is_cancelled());
        assert_eq!(counter(&storefront).as_deref(), Some("5"));

        storefront.settle(fresh, Settlement::Confirmed);
        assert!(storefront.interceptor().pending().is_empty());
    }
}
