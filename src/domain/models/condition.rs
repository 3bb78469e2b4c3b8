//! Typed decoding layer for the opaque `trigger_condition`/`metadata` bytes
//! carried on a [`super::workflow::PhaseDefinition`].
//!
//! Decoded once at the API boundary (registration time for the trigger
//! condition, dispatch time for continuous metadata) rather than re-decoded
//! on every submission, per the reshaping guidance this engine follows for
//! opaque encoded fields.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// A decoded CONDITIONAL-phase trigger condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Always satisfied.
    None,
    /// Satisfied when `trigger_data` crosses `threshold` in the declared direction.
    PriceThreshold { threshold: i128, is_greater: bool },
    /// Satisfied once `now >= target_time`.
    TimeThreshold { target_time_unix: i64 },
    /// Satisfied when `hash(trigger_data) == expected_hash`.
    DataHash { expected_hash: [u8; 32] },
    /// Satisfied when `|trigger_data - expected| <= tolerance`.
    OracleValue { expected: i128, tolerance: i128 },
    /// Enumerated but unimplemented; always rejected with `InvalidTriggerCondition`.
    MultiSig,
}

impl TriggerCondition {
    /// Decode the opaque bytes stored on a phase definition.
    ///
    /// The reference encoding is plain JSON; a byte-oriented wire encoding
    /// would substitute here without changing the evaluation semantics.
    pub fn decode(bytes: &[u8]) -> DomainResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::ValidationFailed(format!("invalid trigger condition: {e}")))
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("TriggerCondition always serializes")
    }

    /// Evaluate this condition against externally supplied trigger data.
    ///
    /// `trigger_data` is interpreted per variant: a little-endian `i128` for
    /// PRICE_THRESHOLD and ORACLE_VALUE, a unix timestamp for TIME_THRESHOLD
    /// (ignored — `now` is passed separately), and raw bytes to be hashed
    /// for DATA_HASH.
    pub fn evaluate(
        &self,
        trigger_data: &[u8],
        now_unix: i64,
    ) -> DomainResult<bool> {
        match self {
            Self::None => Ok(true),
            Self::PriceThreshold {
                threshold,
                is_greater,
            } => {
                let price = decode_i128(trigger_data)?;
                Ok(if *is_greater {
                    price >= *threshold
                } else {
                    price <= *threshold
                })
            }
            Self::TimeThreshold { target_time_unix } => Ok(now_unix >= *target_time_unix),
            Self::DataHash { expected_hash } => {
                use sha2::{Digest, Sha256};
                let digest = Sha256::digest(trigger_data);
                Ok(digest.as_slice() == expected_hash)
            }
            Self::OracleValue { expected, tolerance } => {
                let actual = decode_i128(trigger_data)?;
                let diff = actual.saturating_sub(*expected).unsigned_abs();
                Ok(diff <= tolerance.unsigned_abs())
            }
            Self::MultiSig => Err(DomainError::InvalidTriggerCondition(usize::MAX)),
        }
    }
}

fn decode_i128(bytes: &[u8]) -> DomainResult<i128> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| DomainError::ValidationFailed("trigger_data must be 16 bytes".to_string()))?;
    Ok(i128::from_le_bytes(arr))
}

/// Decoded metadata for a CONTINUOUS phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousMetadata {
    pub update_interval_secs: u64,
    pub required_updates: u32,
}

impl ContinuousMetadata {
    pub fn decode(bytes: &[u8]) -> DomainResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::ValidationFailed(format!("invalid continuous metadata: {e}")))
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("ContinuousMetadata always serializes")
    }
}
