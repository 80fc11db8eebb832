//! Optimistic update of the displayed cart item count.
//!
//! The counter is changed as soon as a cart mutation is rewritten, before
//! the server confirms it. Reverting a failed mutation is the job of the
//! response-handling side (see [`Storefront::settle`]), which uses the
//! [`CounterDelta`] recorded here.
//!
//! [`Storefront::settle`]: crate::Storefront::settle

use cartbox_core::{Document, MutationKind};
use thiserror::Error;

/// Default id of the element showing the cart item count.
pub const DEFAULT_COUNTER_ELEMENT: &str = "cart-counter";

/// Error reading or writing the cart counter element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// The counter element is not on the page.
    #[error("cart counter element `{element}` is not present")]
    Missing {
        /// Element id.
        element: String,
    },

    /// The counter element does not show an item count.
    #[error("cart counter element `{element}` shows `{text}`, not an item count")]
    Unreadable {
        /// Element id.
        element: String,
        /// Text found in the element.
        text: String,
    },
}

/// Counter values around an optimistic update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDelta {
    before: u64,
    after: u64,
}

impl CounterDelta {
    /// Count displayed before the update.
    pub fn before(&self) -> u64 {
        self.before
    }

    /// Count written by the update.
    pub fn after(&self) -> u64 {
        self.after
    }
}

/// Reads and writes the cart item counter element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticCounter {
    element: String,
}

impl OptimisticCounter {
    /// Creates a counter bound to the element with id `element`.
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
        }
    }

    /// Id of the counter element.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Reads the displayed count. An empty element counts as zero.
    pub fn read<D>(&self, dom: &D) -> Result<u64, CounterError>
    where
        D: Document + ?Sized,
    {
        let text = dom
            .text_content(&self.element)
            .ok_or_else(|| CounterError::Missing {
                element: self.element.clone(),
            })?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed.parse().map_err(|_| CounterError::Unreadable {
            element: self.element.clone(),
            text,
        })
    }

    /// Applies one `kind` step to the displayed count.
    ///
    /// `Remove` on an empty cart keeps the count at zero; the returned delta
    /// records what was actually written.
    pub fn apply<D>(&self, kind: MutationKind, dom: &mut D) -> Result<CounterDelta, CounterError>
    where
        D: Document + ?Sized,
    {
        let before = self.read(dom)?;
        let after = match kind {
            MutationKind::Add => before.saturating_add(1),
            MutationKind::Remove => before.saturating_sub(1),
        };
        self.write(dom, after)?;
        Ok(CounterDelta { before, after })
    }

    /// Undoes `delta` relative to the count displayed now, returning the new count.
    ///
    /// Other updates applied since `delta` are preserved.
    pub fn revert<D>(&self, delta: CounterDelta, dom: &mut D) -> Result<u64, CounterError>
    where
        D: Document + ?Sized,
    {
        let current = self.read(dom)?;
        let restored = if delta.after >= delta.before {
            current.saturating_sub(delta.after - delta.before)
        } else {
            current.saturating_add(delta.before - delta.after)
        };
        self.write(dom, restored)?;
        Ok(restored)
    }

    fn write<D>(&self, dom: &mut D, count: u64) -> Result<(), CounterError>
    where
        D: Document + ?Sized,
    {
        if dom.set_text_content(&self.element, &count.to_string()) {
            Ok(())
        } else {
            Err(CounterError::Missing {
                element: self.element.clone(),
            })
        }
    }
}

impl Default for OptimisticCounter {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTER_ELEMENT)
    }
}
