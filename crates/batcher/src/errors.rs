use gateway_primitives::Cid;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
pub enum AccumulatorError {
    /// The accumulator task has exited.
    #[error("batch accumulator is not running")]
    Closed,
}

impl<T> From<mpsc::error::SendError<T>> for AccumulatorError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

impl From<oneshot::error::RecvError> for AccumulatorError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::Closed
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    /// The scheduler task has exited; the batch is handed back to the caller.
    #[error("retry scheduler is not running")]
    Closed { batch: Vec<Cid> },
}
