//! Service fee quoting for gateway submissions.
//!
//! The quote covers the gateway's direct costs (a flat base fee, a fee per
//! attachment, a per-byte storage fee and this submission's share of an
//! anchor transaction) marked up by a profit margin and scaled by a load
//! multiplier.

mod config;
mod engine;

pub use config::PricingConfig;
pub use engine::{Attachment, PricingEngine};
