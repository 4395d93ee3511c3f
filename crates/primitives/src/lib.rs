//! Collection of data types shared by the gateway anchoring crates.

pub mod cid;
pub mod errors;
pub mod fees;
pub mod root;

pub use cid::Cid;
pub use errors::ParseError;
pub use fees::{ConfirmationTarget, FeePolicy};
pub use root::MerkleRoot;
