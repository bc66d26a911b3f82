//! Double-submission protection.
//!
//! Every rendered checkout form carries a fresh submission ID. The first POST
//! with an ID claims it; later POSTs with the same ID are turned away, so a
//! double click or a resubmitted page cannot place a second order.
//!
//! Widget completions are claimed the same way, by gateway order ID. The
//! session alone cannot do this: overlapping requests each load their own
//! copy of the session and would all find the pending payment.

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;
use quickbite_core::GatewayOrderId;
use uuid::Uuid;

use crate::checkout::CheckoutError;

/// How long a claimed ID is remembered.
const CLAIM_TTL: Duration = Duration::from_secs(600);

/// Upper bound on remembered IDs, per kind.
const MAX_CLAIMS: u64 = 100_000;

/// Claims submission IDs and payment completions at most once.
#[derive(Clone)]
pub struct SubmissionGuard {
    submissions: Cache<Uuid, ()>,
    completions: Cache<GatewayOrderId, ()>,
}

impl SubmissionGuard {
    /// Create a guard with the default 10 minute memory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(CLAIM_TTL)
    }

    /// Create a guard that remembers IDs for `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            submissions: claims(ttl),
            completions: claims(ttl),
        }
    }

    /// Claim a submission ID.
    ///
    /// The check and the insert are one atomic step, so of two concurrent
    /// claims exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::DuplicateSubmission`] if the ID was already
    /// claimed.
    pub async fn claim(&self, id: Uuid) -> Result<(), CheckoutError> {
        if first_claim(&self.submissions, id).await {
            Ok(())
        } else {
            tracing::warn!(submission_id = %id, "Duplicate checkout submission");
            Err(CheckoutError::DuplicateSubmission)
        }
    }

    /// Claim the right to resolve a gateway order's widget completion.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NoPendingPayment`] if another completion for
    /// the same gateway order got there first.
    pub async fn claim_completion(
        &self,
        gateway_order_id: &GatewayOrderId,
    ) -> Result<(), CheckoutError> {
        if first_claim(&self.completions, gateway_order_id.clone()).await {
            Ok(())
        } else {
            tracing::warn!(%gateway_order_id, "Duplicate payment completion");
            Err(CheckoutError::NoPendingPayment)
        }
    }
}

fn claims<K>(ttl: Duration) -> Cache<K, ()>
where
    K: Hash + Eq + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(MAX_CLAIMS)
        .time_to_live(ttl)
        .build()
}

async fn first_claim<K>(cache: &Cache<K, ()>, key: K) -> bool
where
    K: Hash + Eq + Send + Sync + Clone + 'static,
{
    cache.entry(key).or_insert(()).await.is_fresh()
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubmissionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionGuard")
            .field("submissions", &self.submissions.entry_count())
            .field("completions", &self.completions.entry_count())
            .finish()
    }
}
