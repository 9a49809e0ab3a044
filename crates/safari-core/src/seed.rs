//! Deterministic seed derivation for reproducible runs.
//!
//! [`SeedHierarchy`] fans one run seed out into per-lane seeds for
//! vectorized execution. Consumers derive further children from a lane
//! seed with [`derive_seed_indexed`] (the auto-reset wrapper does this per
//! episode), so an entire run is reproducible from a single root seed.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Derive a child seed from a parent seed and a string key.
///
/// Uses `DefaultHasher` (SipHash-1-3) for fast, deterministic mixing.
///
/// # Example
///
/// ```
/// use safari_core::seed::derive_seed;
///
/// let child = derive_seed(42, "lane:0");
/// assert_ne!(child, 42); // derived, not identical
/// let child2 = derive_seed(42, "lane:0");
/// assert_eq!(child, child2); // deterministic
/// ```
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
///
/// Convenience wrapper for indexed children (lane IDs, episode numbers).
///
/// # Example
///
/// ```
/// use safari_core::seed::derive_seed_indexed;
///
/// let s0 = derive_seed_indexed(42, 0);
/// let s1 = derive_seed_indexed(42, 1);
/// assert_ne!(s0, s1);
/// ```
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Fan-out of one run-level seed into deterministic per-lane seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    root: u64,
}

impl SeedHierarchy {
    /// Create a hierarchy from a root seed.
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    /// The root seed.
    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    /// Seed for lane `lane` of a vectorized environment.
    #[must_use]
    pub fn lane_seed(&self, lane: u64) -> u64 {
        derive_seed_indexed(self.root, lane)
    }

    /// Seeds for all lanes of an `n`-lane vectorized environment.
    #[must_use]
    pub fn lane_seeds(&self, n: usize) -> Vec<u64> {
        (0..n as u64).map(|i| self.lane_seed(i)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
