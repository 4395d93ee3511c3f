//! Process-wide plumbing shared by the gateway binaries.

pub mod logging;
