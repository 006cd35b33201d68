//! Storefront
//!
//! Domain rules for a digital-goods storefront: the order lifecycle (status
//! transitions, digital delivery, totals) and per-product rating aggregation.
//!
//! Nothing in this crate performs I/O. Persistence and orchestration live in
//! `storefront-app`, which applies these rules inside storage transactions.

pub mod orders;
pub mod prelude;
pub mod rating;
