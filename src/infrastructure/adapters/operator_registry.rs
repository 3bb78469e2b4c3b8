//! Reference in-memory implementation of [`OperatorRegistry`].
//!
//! Real deployments would back this with an actual operator-set membership
//! service; this reference implementation holds a static per-set count and
//! falls back to a configurable default for unknown sets, which is also the
//! value the COORDINATION executor falls back to on a registry error.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::workflow::OperatorSetId;
use crate::domain::ports::collaborators::OperatorRegistry;
use crate::services::phase_executors::DEFAULT_OPERATOR_COUNT_FALLBACK;

pub struct InMemoryOperatorRegistry {
    counts: RwLock<HashMap<OperatorSetId, u32>>,
    default_count: u32,
}

impl InMemoryOperatorRegistry {
    #[must_use]
    pub fn with_default(default_count: u32) -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
            default_count,
        }
    }

    pub async fn set_count(&self, operator_set_id: OperatorSetId, count: u32) {
        self.counts.write().await.insert(operator_set_id, count);
    }
}

impl Default for InMemoryOperatorRegistry {
    fn default() -> Self {
        Self::with_default(DEFAULT_OPERATOR_COUNT_FALLBACK)
    }
}

#[async_trait]
impl OperatorRegistry for InMemoryOperatorRegistry {
    async fn operator_count(&self, operator_set_id: OperatorSetId) -> DomainResult<u32> {
        Ok(self
            .counts
            .read()
            .await
            .get(&operator_set_id)
            .copied()
            .unwrap_or(self.default_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_set_falls_back_to_default() {
        let registry = InMemoryOperatorRegistry::with_default(5);
        assert_eq!(
            registry.operator_count(OperatorSetId(42)).await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn configured_set_overrides_default() {
        let registry = InMemoryOperatorRegistry::with_default(5);
        registry.set_count(OperatorSetId(1), 12).await;
        assert_eq!(registry.operator_count(OperatorSetId(1)).await.unwrap(), 12);
        assert_eq!(
            registry.operator_count(OperatorSetId(2)).await.unwrap(),
            5
        );
    }
}
