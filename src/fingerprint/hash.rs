use super::bands::BandEnergies;

/// Derive a sub-fingerprint from two consecutive band-energy vectors.
///
/// Bit `m` (least significant first) is set iff the energy slope between
/// bands `m` and `m + 1` rose from `prev` to `curr`:
/// `curr[m] - curr[m+1] > prev[m] - prev[m+1]`. Ties clear the bit.
/// With 33 bands this fills all 32 bits.
pub fn sub_fingerprint(prev: &BandEnergies, curr: &BandEnergies) -> u32 {
    debug_assert_eq!(prev.len(), curr.len());
    debug_assert!(curr.len() <= 33);

    prev.0
        .windows(2)
        .zip(curr.0.windows(2))
        .enumerate()
        .fold(0u32, |hash, (m, (p, c))| {
            let slope_prev = p[0] - p[1];
            let slope_curr = c[0] - c[1];
            if slope_curr > slope_prev {
                hash | (1 << m)
            } else {
                hash
            }
        })
}
