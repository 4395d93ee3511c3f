/// Default flat fee per submission, in sats.
pub const DEFAULT_BASE_FEE_SATS: u64 = 10;
/// Default fee per attachment, in sats.
pub const DEFAULT_FEE_PER_ATTACHMENT_SATS: u64 = 5;
/// Default storage fee per byte of message and attachment data.
pub const DEFAULT_SATS_PER_BYTE: f64 = 0.001;
/// Default virtual size assumed for one anchor transaction.
pub const DEFAULT_ANCHOR_TX_VBYTES: u64 = 141;
/// Default markup over cost.
pub const DEFAULT_PROFIT_MARGIN: f64 = 0.15;
/// Default anchor cost used when no fee rate is available.
pub const DEFAULT_FALLBACK_ANCHOR_FEE_SATS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingConfig {
    base_fee_sats: u64,
    fee_per_attachment_sats: u64,
    sats_per_byte: f64,
    anchor_tx_vbytes: u64,
    /// Fractional markup, `0.15` is 15%.
    profit_margin: f64,
    fallback_anchor_fee_sats: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fee_sats: DEFAULT_BASE_FEE_SATS,
            fee_per_attachment_sats: DEFAULT_FEE_PER_ATTACHMENT_SATS,
            sats_per_byte: DEFAULT_SATS_PER_BYTE,
            anchor_tx_vbytes: DEFAULT_ANCHOR_TX_VBYTES,
            profit_margin: DEFAULT_PROFIT_MARGIN,
            fallback_anchor_fee_sats: DEFAULT_FALLBACK_ANCHOR_FEE_SATS,
        }
    }
}

impl PricingConfig {
    pub fn with_base_fee_sats(mut self, base_fee_sats: u64) -> Self {
        self.base_fee_sats = base_fee_sats;
        self
    }

    pub fn with_fee_per_attachment_sats(mut self, fee_per_attachment_sats: u64) -> Self {
        self.fee_per_attachment_sats = fee_per_attachment_sats;
        self
    }

    pub fn with_sats_per_byte(mut self, sats_per_byte: f64) -> Self {
        self.sats_per_byte = sats_per_byte;
        self
    }

    pub fn with_anchor_tx_vbytes(mut self, anchor_tx_vbytes: u64) -> Self {
        self.anchor_tx_vbytes = anchor_tx_vbytes;
        self
    }

    pub fn with_profit_margin(mut self, profit_margin: f64) -> Self {
        self.profit_margin = profit_margin;
        self
    }

    pub fn with_fallback_anchor_fee_sats(mut self, fallback_anchor_fee_sats: u64) -> Self {
        self.fallback_anchor_fee_sats = fallback_anchor_fee_sats;
        self
    }

    pub fn base_fee_sats(&self) -> u64 {
        self.base_fee_sats
    }

    pub fn fee_per_attachment_sats(&self) -> u64 {
        self.fee_per_attachment_sats
    }

    pub fn sats_per_byte(&self) -> f64 {
        self.sats_per_byte
    }

    pub fn anchor_tx_vbytes(&self) -> u64 {
        self.anchor_tx_vbytes
    }

    pub fn profit_margin(&self) -> f64 {
        self.profit_margin
    }

    pub fn fallback_anchor_fee_sats(&self) -> u64 {
        self.fallback_anchor_fee_sats
    }
}
