//! Storefront adapters: storage, cart persistence, catalog, promotion lookups and the
//! cart session that ties them together.

pub mod catalog;
pub mod context;
pub mod notice;
pub mod persistence;
pub mod promotions;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test;
