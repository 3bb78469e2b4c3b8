//! Reference in-memory implementation of [`FeeSink`].
//!
//! Accumulates transferred amounts instead of moving value into custody;
//! sufficient to exercise the registration/execution fee paths without a
//! real settlement layer.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::collaborators::FeeSink;

#[derive(Default)]
pub struct InMemoryFeeSink {
    // u128 has no atomic counterpart; split across two u64s would complicate
    // a reference adapter, so reference totals saturate at u64::MAX.
    total: AtomicU64,
}

impl InMemoryFeeSink {
    #[must_use]
    pub fn total_collected(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeeSink for InMemoryFeeSink {
    async fn transfer(&self, amount: u128) -> DomainResult<()> {
        let amount = u64::try_from(amount).unwrap_or(u64::MAX);
        self.total.fetch_add(amount, Ordering::SeqCst);
        Ok(())
    }
}
