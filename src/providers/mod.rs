//! Providers Module - External Data Sources
//!
//! Everything that touches the filesystem or the network: the coins
//! registry, the Electrum liveness scanner, the Binance id refresher and
//! the artifact writer.

pub mod binance;
pub mod output;
pub mod registry;
pub mod scanner;

pub use binance::*;
pub use output::*;
pub use registry::*;
pub use scanner::*;
