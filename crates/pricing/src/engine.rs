use std::sync::Arc;

use gateway_btcio::fees::FeeQuoteProvider;
use gateway_primitives::ConfirmationTarget;
use tracing::{debug, warn};

use crate::config::PricingConfig;

/// Size of one file attached to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub size_bytes: u64,
}

impl Attachment {
    pub fn new(size_bytes: u64) -> Self {
        Self { size_bytes }
    }
}

/// Quotes the service fee, in sats, for a submission.
#[derive(Debug)]
pub struct PricingEngine<F> {
    fees: Arc<F>,
    config: PricingConfig,
}

impl<F: FeeQuoteProvider> PricingEngine<F> {
    pub fn new(fees: Arc<F>, config: PricingConfig) -> Self {
        Self { fees, config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Cost of one anchor transaction at the current rate for `target`.
    ///
    /// Falls back to the configured static fee when the oracle fails.
    pub async fn anchor_fee_sats(&self, target: ConfirmationTarget) -> u64 {
        match self.fees.quote().await {
            Ok(quote) => (self.config.anchor_tx_vbytes() as f64 * quote.rate(target)).ceil() as u64,
            Err(err) => {
                let fallback = self.config.fallback_anchor_fee_sats();
                warn!(%err, fallback, "could not fetch live fee rates; using fallback anchor fee");
                fallback
            }
        }
    }

    /// Computes the fee for a message of `message_size_bytes` with `attachments`.
    ///
    /// `network_stress` is the gateway load in `[0, 1]`; values outside are
    /// clamped and NaN counts as idle. The load multiplier is `1 + 2 * stress`,
    /// so a fully loaded gateway charges three times the idle price.
    pub async fn quote(
        &self,
        message_size_bytes: u64,
        attachments: &[Attachment],
        network_stress: f64,
        target: ConfirmationTarget,
    ) -> u64 {
        let cfg = &self.config;
        let attachment_bytes = attachments
            .iter()
            .map(|a| a.size_bytes)
            .fold(0, u64::saturating_add);
        let data_bytes = message_size_bytes.saturating_add(attachment_bytes);

        let attachment_fee =
            (attachments.len() as u64).saturating_mul(cfg.fee_per_attachment_sats());
        let storage_fee = data_bytes as f64 * cfg.sats_per_byte();
        let anchor_fee = self.anchor_fee_sats(target).await;

        let subtotal =
            cfg.base_fee_sats() as f64 + attachment_fee as f64 + storage_fee + anchor_fee as f64;

        let stress = if network_stress.is_nan() {
            0.0
        } else {
            network_stress.clamp(0.0, 1.0)
        };
        let multiplier = 1.0 + stress * 2.0;

        let total = (subtotal * (1.0 + cfg.profit_margin()) * multiplier).ceil() as u64;
        debug!(
            message_size_bytes,
            attachments = attachments.len(),
            anchor_fee,
            multiplier,
            total,
            "quoted service fee"
        );
        total
    }
}

#[cfg(test)]
mod tests {
    use gateway_btcio::fees::{FeeOracleError, FeeQuote, MockFeeQuoteProvider, RecommendedFees};

    use super::*;

    fn live_fees() -> MockFeeQuoteProvider {
        let mut fees = MockFeeQuoteProvider::new();
        fees.expect_quote().returning(|| {
            Ok(FeeQuote {
                fees: RecommendedFees {
                    fastest_fee: 50.0,
                    half_hour_fee: 40.0,
                    hour_fee: 30.0,
                    economy_fee: 20.0,
                    minimum_fee: 10.0,
                },
                fetched_at_ms: 0,
            })
        });
        fees
    }

    fn engine(fees: MockFeeQuoteProvider) -> PricingEngine<MockFeeQuoteProvider> {
        PricingEngine::new(Arc::new(fees), PricingConfig::default())
    }

    #[tokio::test]
    async fn test_plain_message() {
        let engine = engine(live_fees());
        assert_eq!(engine.quote(100, &[], 0.0, ConfirmationTarget::HalfHour).await, 6498);
        assert_eq!(engine.quote(0, &[], 0.0, ConfirmationTarget::HalfHour).await, 6498);
    }

    #[tokio::test]
    async fn test_attachments_add_count_and_size_fees() {
        let engine = engine(live_fees());
        let one = [Attachment::new(5_000)];
        assert_eq!(engine.quote(100, &one, 0.0, ConfirmationTarget::HalfHour).await, 6510);

        let two = [Attachment::new(5_000), Attachment::new(10_000)];
        assert_eq!(engine.quote(100, &two, 0.0, ConfirmationTarget::HalfHour).await, 6527);

        let many = vec![Attachment::new(1_024); 100];
        assert_eq!(engine.quote(100, &many, 0.0, ConfirmationTarget::HalfHour).await, 7191);
    }

    #[tokio::test]
    async fn test_stress_multiplier() {
        let engine = engine(live_fees());
        for (stress, expected) in [
            (0.0, 6498),
            (0.25, 9747),
            (0.5, 12996),
            (0.9, 18194),
            (1.0, 19493),
        ] {
            assert_eq!(
                engine.quote(100, &[], stress, ConfirmationTarget::HalfHour).await,
                expected,
                "stress {stress}"
            );
        }
    }

    #[tokio::test]
    async fn test_stress_is_clamped() {
        let engine = engine(live_fees());
        assert_eq!(engine.quote(100, &[], 7.5, ConfirmationTarget::HalfHour).await, 19493);
        assert_eq!(engine.quote(100, &[], -1.0, ConfirmationTarget::HalfHour).await, 6498);
        assert_eq!(engine.quote(100, &[], f64::NAN, ConfirmationTarget::HalfHour).await, 6498);
    }

    #[tokio::test]
    async fn test_confirmation_target_selects_tier() {
        let engine = engine(live_fees());
        assert_eq!(engine.quote(100, &[], 0.0, ConfirmationTarget::Economy).await, 3255);
        assert_eq!(engine.anchor_fee_sats(ConfirmationTarget::Fastest).await, 7050);
    }

    #[tokio::test]
    async fn test_oracle_failure_uses_fallback() {
        let mut fees = MockFeeQuoteProvider::new();
        fees.expect_quote()
            .returning(|| Err(FeeOracleError::Unavailable("API is down".into())));

        let engine = engine(fees);
        assert_eq!(engine.quote(100, &[], 0.0, ConfirmationTarget::HalfHour).await, 300);
    }

    #[tokio::test]
    async fn test_oversized_inputs_saturate() {
        let engine = engine(live_fees());
        let attachments = [Attachment::new(u64::MAX), Attachment::new(u64::MAX)];
        let total = engine
            .quote(u64::MAX, &attachments, 0.0, ConfirmationTarget::HalfHour)
            .await;

        // storage alone is u64::MAX bytes at 0.001 sat/B
        let storage_floor = (u64::MAX as f64 * 0.001) as u64;
        assert!(total >= storage_floor, "total {total}");
    }
}
