//! Fee-rate oracle and its cache.

mod cache;
mod oracle;

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockFeeQuoteProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use oracle::MockFeeOracle;
pub use cache::{Clock, FeeOracleCache, FeeQuote, FeeQuoteProvider, SystemClock, DEFAULT_FEE_CACHE_TTL};
pub use oracle::{FeeOracle, FeeOracleError, MempoolFeeOracle, RecommendedFees};
