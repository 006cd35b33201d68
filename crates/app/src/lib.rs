//! Storefront services, storage backends and configuration.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;
pub mod payments;
pub mod uuids;

#[cfg(test)]
mod test;
