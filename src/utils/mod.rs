//! Utils Module - Shared constants and the icon spritemap

pub mod constants;
pub mod spritemap;

pub use constants::*;
pub use spritemap::*;
