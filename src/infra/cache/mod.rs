//! In-memory cache of successful payment verifications.
//!
//! A successful verification is terminal on the gateway side, so repeated
//! verification of the same reference can be answered locally. Failed or
//! pending results are never stored.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::domain::VerificationResult;

/// Default time a cached verification stays valid
pub const DEFAULT_VERIFICATION_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CachedVerification {
    result: VerificationResult,
    stored_at: Instant,
}

/// Thread-safe verification cache keyed by transaction reference
#[derive(Debug)]
pub struct VerificationCache {
    store: DashMap<String, CachedVerification>,
    ttl: Duration,
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_VERIFICATION_TTL)
    }
}

impl VerificationCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Look up a live entry; expired entries are evicted on read.
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<VerificationResult> {
        let hit = self
            .store
            .get(reference)
            .map(|entry| (entry.result.clone(), entry.stored_at.elapsed() < self.ttl))?;

        match hit {
            (result, true) => {
                debug!(reference = %reference, "Verification cache hit");
                Some(result)
            }
            (_, false) => {
                self.store.remove(reference);
                None
            }
        }
    }

    /// Store a result; only successful verifications are accepted.
    pub fn insert(&self, result: VerificationResult) -> bool {
        if result.status != "success" {
            return false;
        }
        self.store.insert(
            result.reference.clone(),
            CachedVerification {
                result,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - self.store.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
