//! Price oracle capability and answer normalisation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use strongbox_core::error::{OracleError, StrongboxError};
use strongbox_core::types::FeedId;

/// A source of signed integer price answers, addressed by feed handle.
pub trait PriceOracle: Send + Sync {
    fn read(&self, feed: &FeedId) -> Result<i128, OracleError>;
}

/// `raw / precision`, truncating toward zero.
pub fn normalize(raw: i128, precision: u64) -> Result<i128, StrongboxError> {
    if precision == 0 {
        return Err(StrongboxError::InvalidPriceConfig("price precision must be non-zero"));
    }
    Ok(raw / precision as i128)
}

#[derive(Clone, Debug)]
enum FeedMode {
    Answer(i128),
    Fail(String),
}

/// In-memory oracle with per-feed fixed answers or deliberate failures.
/// Unregistered handles are not feeds at all.
#[derive(Debug, Default)]
pub struct FeedBoard {
    feeds: Mutex<HashMap<FeedId, FeedMode>>,
    reads: AtomicUsize,
}

impl FeedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `feed` answer `raw` from now on.
    pub fn set_answer(&self, feed: FeedId, raw: i128) {
        self.set(feed, FeedMode::Answer(raw));
    }

    /// Make every read of `feed` fail.
    pub fn set_failing(&self, feed: FeedId, reason: &str) {
        self.set(feed, FeedMode::Fail(reason.to_string()));
    }

    fn set(&self, feed: FeedId, mode: FeedMode) {
        self.feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feed, mode);
    }

    /// Number of reads served so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl PriceOracle for FeedBoard {
    fn read(&self, feed: &FeedId) -> Result<i128, OracleError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        match feeds.get(feed) {
            Some(FeedMode::Answer(raw)) => Ok(*raw),
            Some(FeedMode::Fail(reason)) => Err(OracleError::ReadFailed { feed: *feed, reason: reason.clone() }),
            None => Err(OracleError::NotAFeed(*feed)),
        }
    }
}
