//! Error types for the free-list pool.

use thiserror::Error;

use crate::policy::Policy;

/// Errors the pool can report.
///
/// Allocation failures ([`PoolError::OutOfMemory`]) are the caller's problem and are
/// recovered from locally. Construction failures
/// ([`PoolError::ArenaAcquisitionFailure`], [`PoolError::InvalidConfiguration`]) are
/// fatal - no `Pool` is produced. [`PoolError::CorruptedFreeList`] (behind the
/// `hardening` feature) signals heap corruption detected at release time; without
/// `hardening`, the same situation is undefined behavior by contract, not a reported
/// error.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No free block could satisfy the normalized request under the active policy.
    #[error("out of memory: requested {requested} bytes under {policy} policy")]
    OutOfMemory { requested: usize, policy: Policy },

    /// The host allocator could not supply the backing arena.
    #[error("failed to acquire a {requested_bytes}-byte arena from the host allocator")]
    ArenaAcquisitionFailure { requested_bytes: usize },

    /// The requested pool configuration cannot be satisfied.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfiguration { reason: &'static str },

    /// A release was detected to corrupt the free-list. Only constructible when the
    /// `hardening` feature is enabled.
    #[cfg(feature = "hardening")]
    #[error("free-list corruption detected on release: {reason}")]
    CorruptedFreeList { reason: &'static str },
}
