//! Memory units.

/// Bytes in one GiB. Memory limits on the command line are whole GiB.
pub const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Convert a whole-GiB limit into bytes, saturating on overflow.
pub const fn gib_to_bytes(gib: u64) -> u64 {
    gib.saturating_mul(BYTES_PER_GIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_gib() {
        assert_eq!(gib_to_bytes(1), 1_073_741_824);
    }

    #[test]
    fn sixteen_gib() {
        assert_eq!(gib_to_bytes(16), 17_179_869_184);
    }

    #[test]
    fn saturates() {
        assert_eq!(gib_to_bytes(u64::MAX), u64::MAX);
    }
}
