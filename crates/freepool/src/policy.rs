//! Placement variants (C3) - which candidate free block a request picks.

use core::fmt;

/// Placement policy for choosing a free block among those big enough to satisfy a
/// request. Fixed for a pool's lifetime: the list invariants (L1-L4) are identical
/// across variants, but the runtime fragmentation history they produce is not, so
/// switching policy mid-lifetime would be meaningless.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Policy {
    /// Pick the first free block that fits. Fastest; keeps low addresses fragmented.
    #[default]
    FirstFit,
    /// Pick the smallest free block that still fits. Minimizes leftover, at the cost of
    /// many tiny fragments over time.
    BestFit,
    /// Pick the largest free block. Keeps leftovers large and reusable.
    WorstFit,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::FirstFit => "first-fit",
            Policy::BestFit => "best-fit",
            Policy::WorstFit => "worst-fit",
        };
        f.write_str(name)
    }
}
