//! Listener registration that stays single under repeated initialization.
//!
//! Page fragments that get swapped in can carry the initialization script
//! with them, so it may run many times during one page lifetime. Each run
//! attaching another listener would make every click rewrite the request and
//! bump the counter once per run. [`ListenerRegistry::register_singleton`]
//! detaches whatever it attached before, then attaches the new listener.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

/// Callback invoked with a mutable event.
pub type Listener<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// Handle of an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Something listeners can be attached to and detached from.
pub trait EventSource<E> {
    /// Attaches `listener` to the `event` channel.
    fn add_listener(&mut self, event: &str, listener: Listener<E>) -> ListenerId;

    /// Detaches a listener. Returns `false` if it was not attached.
    fn remove_listener(&mut self, event: &str, id: ListenerId) -> bool;
}

struct Attached<E> {
    event: SmolStr,
    id: ListenerId,
    listener: Listener<E>,
}

/// In-process event source dispatching synchronously, in attachment order.
pub struct EventBus<E> {
    attached: Vec<Attached<E>>,
    next_id: u64,
}

impl<E> EventBus<E> {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self {
            attached: Vec::new(),
            next_id: 0,
        }
    }

    /// Number of listeners attached to `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.attached
            .iter()
            .filter(|attached| attached.event.as_str() == event)
            .count()
    }

    /// Invokes every listener of `event` with `payload`, returning how many ran.
    pub fn dispatch(&self, event: &str, payload: &mut E) -> usize {
        let mut delivered = 0;
        for attached in self
            .attached
            .iter()
            .filter(|attached| attached.event.as_str() == event)
        {
            (attached.listener)(payload);
            delivered += 1;
        }
        delivered
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "attached",
                &self
                    .attached
                    .iter()
                    .map(|attached| (&attached.event, attached.id))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<E> EventSource<E> for EventBus<E> {
    fn add_listener(&mut self, event: &str, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.attached.push(Attached {
            event: event.into(),
            id,
            listener,
        });
        id
    }

    fn remove_listener(&mut self, event: &str, id: ListenerId) -> bool {
        let before = self.attached.len();
        self.attached
            .retain(|attached| !(attached.id == id && attached.event.as_str() == event));
        self.attached.len() != before
    }
}

/// Keeps exactly one listener of its own attached to one event.
///
/// The registry is the only record of what it attached, so it cannot be
/// cloned; a copy would detach stale ids and attach a second listener.
///
/// ```compile_fail
/// fn copyable<T: Clone>() {}
/// copyable::<cartbox::ListenerRegistry>();
/// ```
#[derive(Debug)]
pub struct ListenerRegistry {
    event: SmolStr,
    registered: Vec<ListenerId>,
}

impl ListenerRegistry {
    /// Creates a registry for `event`.
    pub fn new(event: impl Into<SmolStr>) -> Self {
        Self {
            event: event.into(),
            registered: Vec::new(),
        }
    }

    /// The event this registry attaches to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Listeners currently recorded as attached (at most one).
    pub fn registered(&self) -> &[ListenerId] {
        &self.registered
    }

    /// Detaches every listener registered before, then attaches `listener`
    /// as the only one.
    ///
    /// Listeners attached to `source` by other parties are left alone.
    pub fn register_singleton<E, S>(&mut self, source: &mut S, listener: Listener<E>) -> ListenerId
    where
        S: EventSource<E> + ?Sized,
    {
        for previous in self.registered.drain(..) {
            if source.remove_listener(&self.event, previous) {
                debug!(listener = ?previous, event = %self.event, "detached previous listener");
            } else {
                debug!(
                    listener = ?previous,
                    event = %self.event,
                    "previous listener already detached"
                );
            }
        }
        let id = source.add_listener(&self.event, listener);
        self.registered.push(id);
        debug!(listener = ?id, event = %self.event, "listener registered");
        id
    }
}
