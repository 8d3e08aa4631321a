//! Authenticated REST sessions: endpoint parsing, token lifecycle, and expiry classification.

pub mod client;
pub mod endpoint;
pub mod key;
pub mod secret;
pub mod strategy;

pub use client::*;
pub use endpoint::*;
pub use key::*;
pub use secret::*;
pub use strategy::*;
