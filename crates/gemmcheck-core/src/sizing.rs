//! Workload sizing under a memory budget.
//!
//! A plan fits `matrix_count` square `N x N` matrices (two operands and the
//! product) of a given element width into a fraction of the memory budget.

/// Two operands plus the product.
pub const MATMUL_MATRIX_COUNT: u64 = 3;

/// Inputs to the sizing computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadPlan {
    /// Bytes per matrix element.
    pub element_bytes: u64,
    /// Number of same-sized matrices that must fit at once.
    pub matrix_count: u64,
    /// Memory limit in bytes.
    pub memory_budget_bytes: u64,
    /// Fraction of the budget actually targeted, in (0, 1].
    pub headroom: f64,
}

impl WorkloadPlan {
    /// Plan for a matmul (three matrices) of `element_bytes`-wide elements.
    pub const fn matmul(memory_budget_bytes: u64, headroom: f64, element_bytes: u64) -> Self {
        Self {
            element_bytes,
            matrix_count: MATMUL_MATRIX_COUNT,
            memory_budget_bytes,
            headroom,
        }
    }

    /// Bytes actually available after applying the headroom fraction.
    pub fn usable_bytes(&self) -> u64 {
        if self.headroom >= 1.0 {
            return self.memory_budget_bytes;
        }
        if self.headroom <= 0.0 || self.headroom.is_nan() {
            return 0;
        }
        (self.memory_budget_bytes as f64 * self.headroom).floor() as u64
    }

    /// Largest `N` with `matrix_count * N² * element_bytes <= usable_bytes()`.
    pub fn max_dimension(&self) -> usize {
        let per_element = self.matrix_count.saturating_mul(self.element_bytes);
        if per_element == 0 {
            return 0;
        }
        let max_elements = self.usable_bytes() / per_element;
        usize::try_from(isqrt(max_elements)).unwrap_or(usize::MAX)
    }
}

/// Exact integer square root: the largest `r` with `r * r <= n`.
pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // f64 gets within one of the answer; correct both directions.
    let mut r = (n as f64).sqrt() as u64;
    while r.checked_mul(r).is_none_or(|sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= n) {
        r += 1;
    }
    r
}

/// Largest power of two `<= x`, or `None` when `x == 0` (no workload).
pub const fn floor_pow2(x: usize) -> Option<usize> {
    if x == 0 { None } else { Some(1 << (usize::BITS - 1 - x.leading_zeros())) }
}

/// Keep the candidates that fit under `bound`.
///
/// `candidates` is ascending, so the result is always a prefix of it.
pub fn filter_candidates(bound: usize, candidates: &[usize]) -> Vec<usize> {
    candidates.iter().copied().take_while(|&size| size <= bound).collect()
}

/// Stress dimension: `min(cap, bound)` rounded down to a power of two.
///
/// `None` means nothing fits and no allocation should be attempted.
pub fn stress_dimension(bound: usize, cap: usize) -> Option<usize> {
    floor_pow2(bound.min(cap))
}
