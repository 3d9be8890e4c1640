//! Index and numeric helpers shared by the image filters.

/// Maps `idx` into `[0, len)` by mirroring without repeating the edge sample
/// (`gfedcb|abcdefgh|gfedcba`).
pub(crate) fn reflect_101(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let period = 2 * last;
    let mut i = idx.rem_euclid(period);
    if i > last {
        i = period - i;
    }
    i as usize
}

/// Clamps `idx` into `[0, len)` by repeating the edge sample.
pub(crate) fn replicate(idx: isize, len: usize) -> usize {
    idx.clamp(0, len as isize - 1) as usize
}

/// Rounds to the nearest integer and saturates to the `u8` range.
pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Converts a floating-point coordinate to an integer pixel by truncating
/// toward zero.
pub(crate) fn truncate_to_i32(value: f64) -> i32 {
    value.trunc() as i32
}
