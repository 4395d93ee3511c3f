//! TTL cache in front of a [`FeeOracle`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use gateway_primitives::ConfirmationTarget;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::oracle::{FeeOracle, FeeOracleError, RecommendedFees};

/// Default lifetime of a cached quote.
pub const DEFAULT_FEE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Wall-clock source, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since UNIX_EPOCH.
    fn current_timestamp_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_timestamp_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Recommended fees together with the time they were fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeQuote {
    pub fees: RecommendedFees,
    pub fetched_at_ms: u64,
}

impl FeeQuote {
    pub fn rate(&self, target: ConfirmationTarget) -> f64 {
        self.fees.rate(target)
    }

    fn is_fresh(&self, now_ms: u64, ttl: Duration) -> bool {
        u128::from(now_ms.saturating_sub(self.fetched_at_ms)) < ttl.as_millis()
    }
}

/// Anything that can hand out a current [`FeeQuote`].
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait FeeQuoteProvider: Send + Sync {
    async fn quote(&self) -> Result<FeeQuote, FeeOracleError>;
}

/// Caches the oracle response for `ttl`.
///
/// A failed fetch leaves any previous quote in place, but since that quote is
/// already stale the error is returned to the caller rather than the old value.
#[derive(Debug)]
pub struct FeeOracleCache<O, C = SystemClock> {
    oracle: O,
    clock: C,
    ttl: Duration,
    cached: Mutex<Option<FeeQuote>>,
}

impl<O: FeeOracle> FeeOracleCache<O> {
    pub fn new(oracle: O, ttl: Duration) -> Self {
        Self::with_clock(oracle, SystemClock, ttl)
    }
}

impl<O: FeeOracle, C: Clock> FeeOracleCache<O, C> {
    pub fn with_clock(oracle: O, clock: C, ttl: Duration) -> Self {
        Self {
            oracle,
            clock,
            ttl,
            cached: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached quote if still fresh, otherwise refetches.
    pub async fn get(&self) -> Result<FeeQuote, FeeOracleError> {
        // Held across the fetch so concurrent callers share one request.
        let mut cached = self.cached.lock().await;
        let now_ms = self.clock.current_timestamp_ms();

        if let Some(quote) = cached.as_ref().filter(|q| q.is_fresh(now_ms, self.ttl)) {
            return Ok(*quote);
        }

        match self.oracle.recommended_fees().await {
            Ok(fees) => {
                let quote = FeeQuote {
                    fees,
                    fetched_at_ms: now_ms,
                };
                debug!(half_hour = fees.half_hour_fee, "refreshed fee quote");
                *cached = Some(quote);
                Ok(quote)
            }
            Err(err) => {
                warn!(%err, "fee oracle fetch failed");
                Err(err)
            }
        }
    }

    #[cfg(test)]
    async fn cached(&self) -> Option<FeeQuote> {
        *self.cached.lock().await
    }
}

#[async_trait]
impl<O: FeeOracle, C: Clock> FeeQuoteProvider for FeeOracleCache<O, C> {
    async fn quote(&self) -> Result<FeeQuote, FeeOracleError> {
        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    use super::*;
    use crate::fees::oracle::MockFeeOracle;

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn advance(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn current_timestamp_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn fees(half_hour: f64) -> RecommendedFees {
        RecommendedFees {
            fastest_fee: half_hour * 2.0,
            half_hour_fee: half_hour,
            hour_fee: half_hour / 2.0,
            economy_fee: 2.0,
            minimum_fee: 1.0,
        }
    }

    #[tokio::test]
    async fn test_fresh_quote_is_served_from_cache() {
        let mut oracle = MockFeeOracle::new();
        oracle
            .expect_recommended_fees()
            .times(1)
            .returning(|| Ok(fees(40.0)));

        let clock = ManualClock::default();
        let cache = FeeOracleCache::with_clock(oracle, clock.clone(), DEFAULT_FEE_CACHE_TTL);

        let first = cache.get().await.unwrap();
        clock.advance(DEFAULT_FEE_CACHE_TTL.as_millis() as u64 - 1);
        let second = cache.get().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.rate(ConfirmationTarget::HalfHour), 40.0);
    }

    #[tokio::test]
    async fn test_expired_quote_is_refetched() {
        let mut oracle = MockFeeOracle::new();
        let mut seq = mockall::Sequence::new();
        oracle
            .expect_recommended_fees()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(fees(40.0)));
        oracle
            .expect_recommended_fees()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(fees(12.0)));

        let clock = ManualClock::default();
        let cache = FeeOracleCache::with_clock(oracle, clock.clone(), DEFAULT_FEE_CACHE_TTL);

        cache.get().await.unwrap();
        clock.advance(DEFAULT_FEE_CACHE_TTL.as_millis() as u64);
        let refreshed = cache.get().await.unwrap();

        assert_eq!(refreshed.rate(ConfirmationTarget::HalfHour), 12.0);
        assert_eq!(refreshed.fetched_at_ms, DEFAULT_FEE_CACHE_TTL.as_millis() as u64);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let mut oracle = MockFeeOracle::new();
        let mut seq = mockall::Sequence::new();
        oracle
            .expect_recommended_fees()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(fees(40.0)));
        oracle
            .expect_recommended_fees()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(FeeOracleError::Unavailable("connection refused".into())));

        let clock = ManualClock::default();
        let cache = FeeOracleCache::with_clock(oracle, clock.clone(), DEFAULT_FEE_CACHE_TTL);

        let original = cache.get().await.unwrap();
        clock.advance(DEFAULT_FEE_CACHE_TTL.as_millis() as u64 + 1);

        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, FeeOracleError::Unavailable(_)));
        assert_eq!(cache.cached().await, Some(original));
    }

    #[tokio::test]
    async fn test_first_fetch_failure_propagates() {
        let mut oracle = MockFeeOracle::new();
        oracle
            .expect_recommended_fees()
            .returning(|| Err(FeeOracleError::Status(503)));

        let cache = FeeOracleCache::with_clock(oracle, ManualClock::default(), DEFAULT_FEE_CACHE_TTL);
        assert!(matches!(
            cache.quote().await,
            Err(FeeOracleError::Status(503))
        ));
        assert_eq!(cache.cached().await, None);
    }
}
