//! Fee tier and fee policy types shared by the anchor builder and pricing.

use serde::{Deserialize, Serialize};

/// Default fixed anchor fee, in sats.
pub const DEFAULT_FIXED_FEE_SATS: u64 = 10_000;

/// Fee-rate tier published by the fee oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationTarget {
    /// Next block.
    Fastest,
    /// Within roughly three blocks.
    #[default]
    HalfHour,
    /// Within roughly six blocks.
    Hour,
    /// Low-priority.
    Economy,
}

/// How the anchor transaction fee is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy")]
pub enum FeePolicy {
    /// Flat fee regardless of transaction size.
    Fixed {
        #[serde(default = "default_fixed_fee_sats")]
        sats: u64,
    },

    /// Oracle rate for `target` times the estimated signed vsize.
    Oracle {
        #[serde(default)]
        target: ConfirmationTarget,
    },
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::Fixed {
            sats: DEFAULT_FIXED_FEE_SATS,
        }
    }
}

fn default_fixed_fee_sats() -> u64 {
    DEFAULT_FIXED_FEE_SATS
}
