//! Storefront
//!
//! Client-side state for a luxury watch storefront: a persistent cart, order
//! history with simulated fulfilment, and favorites. A presentation layer
//! drives a [`session::Storefront`] and re-renders from observer callbacks.

pub mod cart;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod events;
pub mod favorites;
pub mod observability;
pub mod orders;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod receipt;
pub mod remote;
pub mod schedule;
pub mod session;
pub mod store;
