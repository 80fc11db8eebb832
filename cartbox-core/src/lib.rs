#![warn(missing_docs)]
//! # cartbox-core
//!
//! Core types and traits for the cartbox cart mutation interceptor.
//!
//! This crate holds the vocabulary the interceptor speaks, independent of
//! how requests are sent or how the page is rendered:
//!
//! - **Identify** what a cart mutation refers to ([`ProductId`],
//!   [`ConfigurationId`], [`ResolvedTarget`], [`MutationKey`])
//! - **Classify** the page a request originates from ([`PageContext`])
//! - **Observe** the rendered page ([`Document`], [`MemoryDocument`])
//! - **Map** selected configuration controls to an identifier
//!   ([`ConfigurationLookup`], [`PriceLinkLookup`], [`TableLookup`])
//! - **Report** why a target could not be resolved ([`ResolveError`])
//!
//! The `cartbox` crate builds the resolver, rewriter, optimistic counter and
//! listener registry on top of these seams.

pub mod document;
pub mod error;
pub mod lookup;
pub mod target;

pub use document::{ConfigurationControl, Document, MemoryDocument};
pub use error::ResolveError;
pub use lookup::{BoxLookup, ConfigurationLookup, PriceLinkLookup, Selection, TableLookup};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use target::{
    CartMutationRequest, ConfigurationId, MutationKey, MutationKind, PageContext, ProductId,
    ResolvedTarget,
};
