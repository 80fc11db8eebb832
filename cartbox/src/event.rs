//! The pre-send request configuration event.

use cartbox_core::MutationKey;
use http::{HeaderMap, HeaderName};

use crate::counter::CounterDelta;

/// Name of the pre-send configuration event the interceptor listens to.
pub const CONFIG_REQUEST_EVENT: &str = "htmx:configRequest";

/// Receipt for a rewritten cart mutation.
///
/// Attached to the event by the interceptor. The response side takes it out
/// with [`ConfigRequestEvent::take_ticket`] and hands it back to
/// [`Storefront::settle`](crate::Storefront::settle) once the request
/// completes. Settling consumes the ticket, and tickets cannot be copied, so
/// each mutation settles at most once:
///
/// ```compile_fail
/// fn copyable<T: Clone>() {}
/// copyable::<cartbox::MutationTicket>();
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct MutationTicket {
    key: MutationKey,
    sequence: u64,
    delta: Option<CounterDelta>,
}

impl MutationTicket {
    pub(crate) fn new(key: MutationKey, sequence: u64, delta: Option<CounterDelta>) -> Self {
        Self {
            key,
            sequence,
            delta,
        }
    }

    /// Key of the in-flight mutation.
    pub fn key(&self) -> MutationKey {
        self.key
    }

    /// Sequence number the in-flight guard assigned to this mutation.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Optimistic counter change, if the counter could be updated.
    pub fn delta(&self) -> Option<CounterDelta> {
        self.delta
    }
}

/// An outgoing request about to be sent.
///
/// The path is mutable; headers identify the triggering element and the page
/// the request comes from.
#[derive(Debug)]
pub struct ConfigRequestEvent {
    path: String,
    headers: HeaderMap,
    cancelled: bool,
    ticket: Option<MutationTicket>,
}

impl ConfigRequestEvent {
    /// Creates an event for a request to `path`.
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            path: path.into(),
            headers,
            cancelled: false,
            ticket: None,
        }
    }

    /// Outgoing request path, including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replaces the outgoing request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Value of header `name` if present and valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// Stops the request from being sent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether a listener cancelled the request.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Ticket of the cart mutation this request carries, if it was rewritten.
    pub fn ticket(&self) -> Option<&MutationTicket> {
        self.ticket.as_ref()
    }

    /// Takes the ticket out of the event.
    pub fn take_ticket(&mut self) -> Option<MutationTicket> {
        self.ticket.take()
    }

    pub(crate) fn set_ticket(&mut self, ticket: MutationTicket) {
        self.ticket = Some(ticket);
    }
}
