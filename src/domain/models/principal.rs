//! Principal identity — an opaque 20-byte address-like value.
//!
//! Used for workflow creators, execution initiators, trigger sources, and
//! coordination responders. Authorization and de-duplication both key off
//! `Principal`, so it derives `Copy`/`Eq`/`Hash` rather than carrying any
//! heavier identity type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque 20-byte principal identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(pub [u8; 20]);

impl Principal {
    /// Build a principal from a byte slice, zero-padding or truncating to 20 bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 20];
        let len = bytes.len().min(20);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self(buf)
    }

    /// The zero principal, used as a sentinel for "unset".
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
