//! Metrics declaration.
//!
//! Only compiled with the `metrics` feature. Names are registered with their
//! descriptions on first use.

use lazy_static::lazy_static;

lazy_static! {
    /// Track number of cart mutation requests rewritten.
    pub static ref REWRITES_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cartbox_rewrites_total",
            "Total number of cart mutation requests rewritten."
        );
        "cartbox_rewrites_total"
    };
    /// Track number of cart mutation targets that failed to resolve.
    pub static ref RESOLVE_FAILURES_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cartbox_resolve_failures_total",
            "Total number of cart mutation targets that could not be resolved."
        );
        "cartbox_resolve_failures_total"
    };
    /// Track number of duplicate cart mutations cancelled while in flight.
    pub static ref DUPLICATES_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cartbox_duplicates_total",
            "Total number of cart mutations cancelled because an identical one was in flight."
        );
        "cartbox_duplicates_total"
    };
    /// Track number of optimistic counter updates reverted.
    pub static ref REVERTS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "cartbox_counter_reverts_total",
            "Total number of optimistic cart counter updates reverted after a failed request."
        );
        "cartbox_counter_reverts_total"
    };
}
