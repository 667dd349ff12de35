//! Exchange client adapters for Coinhub.
//!
//! Each venue module implements `coinhub_core::exchanges::ExchangeAdapter`,
//! turning the venue's REST payloads into the raw adapter types that the core
//! normalizes. [`VenueFactory`] builds them for the connection registry.

pub mod binance;
mod errors;
mod factory;
mod signing;

pub use binance::BinanceAdapter;
pub use factory::VenueFactory;
pub use signing::sign;
