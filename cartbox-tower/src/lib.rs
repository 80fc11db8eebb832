//! Tower middleware for the cartbox cart mutation interceptor.
//!
//! [`Cart`] is a Tower [`Layer`] for HTTP clients. Every outgoing request
//! fires the configuration event of the layer's [`Storefront`]:
//!
//! - cart mutations reach the inner service with `configuration_id` and
//!   `product_id` in the query, and the optimistic counter moves
//! - a mutation identical to one still in flight is cancelled and resolves
//!   to [`CartError::Cancelled`] without calling the inner service
//! - everything else passes through untouched
//!
//! When the response arrives the mutation is settled: a 2xx status confirms
//! it, any other status or an inner service error reverts the counter.
//! A response future dropped before completion counts as failed.
//!
//! ```
//! use cartbox::{Interceptor, Storefront};
//! use cartbox_core::{ConfigurationControl, MemoryDocument};
//! use cartbox_tower::Cart;
//! use http::{Request, Response, StatusCode};
//! use tower::{ServiceBuilder, ServiceExt, service_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let page = MemoryDocument::new()
//!     .with_control(42, ConfigurationControl::new("price", "/products/42/prices/7").selected());
//! let cart = Cart::new(Storefront::new(Interceptor::default(), page));
//!
//! let upstream = service_fn(|req: Request<()>| async move {
//!     assert_eq!(req.uri(), "/cart/add?configuration_id=7&product_id=42");
//!     Ok::<_, std::convert::Infallible>(Response::new(()))
//! });
//! let client = ServiceBuilder::new().layer(cart).service(upstream);
//!
//! let request = Request::post("/cart/add")
//!     .header("hx-target", "product42counter")
//!     .body(())
//!     .unwrap();
//! let response = client.oneshot(request).await.unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! # }
//! ```
//!
//! [`Layer`]: tower::Layer
//! [`Storefront`]: cartbox::Storefront

#![warn(missing_docs)]

/// Error type of the cart service.
pub mod error;
/// Response future and settlement guard.
pub mod future;
/// Tower layer.
pub mod layer;
/// The Tower service running the interceptor.
pub mod service;

pub use error::CartError;
pub use future::{CartFuture, SettleGuard};
pub use layer::Cart;
pub use service::CartService;
