//! Configuration types for the anchoring gateway.

mod config;

pub use config::*;
